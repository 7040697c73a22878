use quote::quote;
use syn::{parse, spanned::Spanned, DeriveInput};

use crate::util::parse_view_attrs;

pub fn view_derive(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let derive_input = match parse::<DeriveInput>(item) {
		Ok(e) => e,
		Err(err) => {
			return err.into_compile_error().into();
		},
	};

	let views = match parse_view_attrs(&derive_input.attrs) {
		Ok(views) => views,
		Err(err) => {
			return err.into_compile_error().into();
		},
	};

	let view = match views.as_slice() {
		[view] => view,
		[] => return syn::Error::new(
			derive_input.ident.span(),
			"A view is required, eg: #[any_ptr(view = dyn Trait)]",
		).into_compile_error().into(),
		[_, extra, ..] => return syn::Error::new(
			extra.span(),
			"Only a single view may be registered",
		).into_compile_error().into(),
	};

	let ident = &derive_input.ident;
	let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();

	quote! {
		impl #impl_generics ::any_ptr::View<#view> for #ident #ty_generics #where_clause {
			#[inline]
			fn view(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#view> {
				self
			}
		}
	}.into()
}
