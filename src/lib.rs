//! A type erased, reference counted pointer that can be cast back to a typed
//! [`Arc`] at run time.
//!
//! An [`AnyPtr`] remembers the exact type it was built from. Casting to that
//! type yields an `Arc<T>` sharing the original allocation and count, casting
//! to anything else yields `None`.
//!
//! ```
//! use std::sync::Arc;
//! use any_ptr::{AnyPtr, make_any};
//!
//! let ptrs = [AnyPtr::new(vec![1.1, 2.2]), make_any::<Vec<i32>, _>([4, 5, 6])];
//! let doubles: Option<Arc<Vec<f64>>> = ptrs[0].convert();
//! assert_eq!(doubles.as_deref(), Some(&vec![1.1, 2.2]));
//! assert!(ptrs[1].convert::<Vec<f64>>().is_none());
//! ```

use std::{any::{type_name, Any, TypeId}, fmt, mem, sync::Arc};

#[cfg(feature = "derive")]
pub use any_ptr_derive::View;

type Cell = Arc<dyn Any + Send + Sync>;

pub trait Cast<T> {
	fn cast(self) -> Option<T>;
}

/// The single extra target an [`AnyPtr`] built with [`AnyPtr::with_view`]
/// can be cast to, usually a trait object.
///
/// `view` must hand back the same allocation, as an unsizing coercion does.
/// A view that allocates is rejected at cast time.
///
/// ```
/// use std::sync::Arc;
/// use any_ptr::{AnyPtr, View};
///
/// trait Shape {}
///
/// #[derive(View)]
/// #[any_ptr(view = dyn Shape)]
/// struct Dot;
///
/// impl Shape for Dot {}
///
/// let ptr = AnyPtr::with_view::<_, dyn Shape>(Arc::new(Dot));
/// assert!(ptr.convert::<dyn Shape>().is_some());
/// ```
///
/// The derive needs exactly one view:
///
/// ```compile_fail
/// use any_ptr::View;
///
/// #[derive(View)]
/// struct Dot;
/// ```
///
/// ```compile_fail
/// use any_ptr::View;
///
/// trait Shape {}
/// trait Named {}
///
/// #[derive(View)]
/// #[any_ptr(view = dyn Shape, view = dyn Named)]
/// struct Dot;
///
/// impl Shape for Dot {}
/// impl Named for Dot {}
/// ```
///
/// and rejects unknown keys:
///
/// ```compile_fail
/// use any_ptr::View;
///
/// trait Shape {}
///
/// #[derive(View)]
/// #[any_ptr(foo = dyn Shape)]
/// struct Dot;
///
/// impl Shape for Dot {}
/// ```
pub trait View<U: ?Sized> {
	fn view(self: Arc<Self>) -> Arc<U>;
}

#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum CastError {
	#[display(fmt = "cannot cast a null AnyPtr to {}", expected)]
	Null {expected: &'static str},
	#[display(fmt = "cannot cast an AnyPtr holding {} to {}", found, expected)]
	Mismatch {expected: &'static str, found: &'static str},
}

impl std::error::Error for CastError {}

/// Rebuilds a typed `Arc` from the erased cell. `out` is an
/// `Option<Arc<Target>>` slot, left untouched unless the target matches.
#[derive(Clone, Copy)]
struct Resolver {
	id: TypeId,
	name: &'static str,
	resolve: fn(&Cell, &mut dyn Any),
}

impl Resolver {
	fn exact<T: Any + Send + Sync>() -> Self {
		Resolver {
			id: TypeId::of::<T>(),
			name: type_name::<T>(),
			resolve: resolve_exact::<T>,
		}
	}

	fn view<T, U>() -> Self where T: View<U> + Any + Send + Sync, U: ?Sized + 'static {
		Resolver {
			id: TypeId::of::<U>(),
			name: type_name::<U>(),
			resolve: resolve_view::<T, U>,
		}
	}
}

fn resolve_exact<T: Any + Send + Sync>(cell: &Cell, out: &mut dyn Any) {
	if let Some(slot) = out.downcast_mut::<Option<Arc<T>>>() {
		*slot = Arc::clone(cell).downcast::<T>().ok();
	}
}

fn resolve_view<T, U>(cell: &Cell, out: &mut dyn Any) where T: View<U> + Any + Send + Sync, U: ?Sized + 'static {
	if let Some(slot) = out.downcast_mut::<Option<Arc<U>>>() {
		*slot = Arc::clone(cell).downcast::<T>().ok().map(<T as View<U>>::view).filter(|view| {
			let shared = Arc::as_ptr(view).cast::<()>() == Arc::as_ptr(cell).cast::<()>();
			if !shared {
				log::trace!("view of {} as {} does not share its allocation", type_name::<T>(), type_name::<U>());
			}
			shared
		});
	}
}

#[derive(Clone, Copy)]
struct Witness {
	exact: Resolver,
	view: Option<Resolver>,
}

impl Witness {
	fn resolver(&self, id: TypeId) -> Option<&Resolver> {
		if self.exact.id == id {
			Some(&self.exact)
		} else {
			self.view.as_ref().filter(|view| view.id == id)
		}
	}
}

#[derive(Clone)]
struct Erased {
	cell: Cell,
	witness: Witness,
}

impl Erased {
	fn resolve<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
		let Some(resolver) = self.witness.resolver(TypeId::of::<T>()) else {
			log::trace!("AnyPtr holding {} rejected cast to {}", self.witness.exact.name, type_name::<T>());
			return None;
		};
		let mut slot: Option<Arc<T>> = None;
		(resolver.resolve)(&self.cell, &mut slot);
		slot
	}
}

/// Shared ownership of a value whose type is only known at run time.
///
/// The witness is present iff the pointer is non-null.
#[derive(Clone, Default)]
pub struct AnyPtr {
	inner: Option<Erased>,
}

impl AnyPtr {
	pub const fn null() -> Self {
		AnyPtr {inner: None}
	}

	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self::from_arc(Arc::new(value))
	}

	pub fn from_box<T: Any + Send + Sync>(value: Box<T>) -> Self {
		Self::from_arc::<T>(Arc::from(value))
	}

	pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
		AnyPtr {
			inner: Some(Erased {
				cell: value,
				witness: Witness {exact: Resolver::exact::<T>(), view: None},
			}),
		}
	}

	/// Like [`AnyPtr::from_arc`], but the pointer can additionally be cast to
	/// `Arc<U>` through `T`'s [`View`] impl.
	pub fn with_view<T, U>(value: Arc<T>) -> Self where T: View<U> + Any + Send + Sync, U: ?Sized + 'static {
		AnyPtr {
			inner: Some(Erased {
				cell: value,
				witness: Witness {exact: Resolver::exact::<T>(), view: Some(Resolver::view::<T, U>())},
			}),
		}
	}

	/// Casts to `Arc<T>`, sharing ownership. Returns `None` if the pointer is
	/// null or `T` is neither the stored type nor its registered view.
	pub fn convert<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
		self.inner.as_ref()?.resolve::<T>()
	}

	pub fn try_convert<T: ?Sized + 'static>(&self) -> Result<Arc<T>, CastError> {
		let Some(inner) = &self.inner else {
			return Err(CastError::Null {expected: type_name::<T>()});
		};
		inner.resolve::<T>().ok_or(CastError::Mismatch {
			expected: type_name::<T>(),
			found: inner.witness.exact.name,
		})
	}

	/// Consuming cast. Hands the pointer back unchanged on failure.
	pub fn into_arc<T: ?Sized + 'static>(self) -> Result<Arc<T>, AnyPtr> {
		match self.convert::<T>() {
			Some(arc) => Ok(arc),
			None => Err(self),
		}
	}

	pub fn is<T: ?Sized + 'static>(&self) -> bool {
		self.inner.as_ref().is_some_and(|inner| inner.witness.exact.id == TypeId::of::<T>())
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.as_ref()?.cell.downcast_ref::<T>()
	}

	pub fn is_null(&self) -> bool {
		self.inner.is_none()
	}

	pub fn is_some(&self) -> bool {
		self.inner.is_some()
	}

	/// Name of the stored type, `None` when null.
	pub fn type_name(&self) -> Option<&'static str> {
		self.inner.as_ref().map(|inner| inner.witness.exact.name)
	}

	/// Number of owners of the stored value, counting this pointer. Zero when null.
	pub fn strong_count(&self) -> usize {
		self.inner.as_ref().map_or(0, |inner| Arc::strong_count(&inner.cell))
	}

	pub fn as_ptr(&self) -> *const () {
		self.inner.as_ref().map_or(std::ptr::null(), |inner| Arc::as_ptr(&inner.cell) as *const ())
	}

	pub fn ptr_eq(&self, other: &AnyPtr) -> bool {
		match (&self.inner, &other.inner) {
			(Some(a), Some(b)) => Arc::ptr_eq(&a.cell, &b.cell),
			(None, None) => true,
			_ => false,
		}
	}

	pub fn take(&mut self) -> AnyPtr {
		mem::take(self)
	}

	pub fn swap(&mut self, other: &mut AnyPtr) {
		mem::swap(&mut self.inner, &mut other.inner);
	}
}

/// Allocates a `T` from `args` and erases it in one step.
///
/// Several constructor arguments go through a tuple `From` impl on `T`, or
/// through `AnyPtr::new(T::new(..))`.
pub fn make_any<T, A>(args: A) -> AnyPtr where T: From<A> + Any + Send + Sync {
	AnyPtr::new(T::from(args))
}

impl fmt::Debug for AnyPtr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.inner {
			Some(inner) => write!(f, "AnyPtr<{}>({:p})", inner.witness.exact.name, self.as_ptr()),
			None => f.write_str("AnyPtr(null)"),
		}
	}
}

impl<T: Any + Send + Sync> From<Arc<T>> for AnyPtr {
	fn from(value: Arc<T>) -> Self {
		AnyPtr::from_arc(value)
	}
}

impl<T: Any + Send + Sync> From<Box<T>> for AnyPtr {
	fn from(value: Box<T>) -> Self {
		AnyPtr::from_box(value)
	}
}

impl<T: ?Sized + 'static> From<&AnyPtr> for Option<Arc<T>> {
	fn from(value: &AnyPtr) -> Self {
		value.convert()
	}
}

impl<T: ?Sized + 'static> Cast<Arc<T>> for &AnyPtr {
	#[inline]
	fn cast(self) -> Option<Arc<T>> {
		self.convert()
	}
}

impl<T: ?Sized + 'static> Cast<Arc<T>> for AnyPtr {
	#[inline]
	fn cast(self) -> Option<Arc<T>> {
		self.into_arc().ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn null_has_no_witness() {
		let ptr = AnyPtr::null();
		assert!(ptr.inner.is_none());
		assert!(ptr.is_null());
		assert_eq!(ptr.type_name(), None);
		assert_eq!(ptr.strong_count(), 0);
		assert!(ptr.as_ptr().is_null());
	}

	#[test]
	fn witness_matches_stored_type_only() {
		let ptr = AnyPtr::new(7u8);
		let witness = ptr.inner.as_ref().map(|inner| inner.witness).unwrap();
		assert!(witness.resolver(TypeId::of::<u8>()).is_some());
		assert!(witness.resolver(TypeId::of::<i8>()).is_none());
		assert!(witness.resolver(TypeId::of::<Arc<u8>>()).is_none());
		assert!(witness.view.is_none());
	}

	#[test]
	fn resolver_ignores_mistyped_slot() {
		let cell: Cell = Arc::new(3i64);
		let mut slot: Option<Arc<i32>> = None;
		resolve_exact::<i64>(&cell, &mut slot);
		assert!(slot.is_none());
		assert_eq!(Arc::strong_count(&cell), 1);
	}

	#[test]
	fn debug_names_the_stored_type() {
		assert_eq!(format!("{:?}", AnyPtr::null()), "AnyPtr(null)");
		assert!(format!("{:?}", AnyPtr::new(1u32)).starts_with("AnyPtr<u32>(0x"));
	}
}
