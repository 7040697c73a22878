use syn::{Attribute, Type};

/// Collects every `view = Type` entry from the `#[any_ptr(...)]` attributes.
pub fn parse_view_attrs(attrs: &[Attribute]) -> syn::Result<Vec<Type>> {
	let mut views = Vec::new();
	for attr in attrs.iter().filter(|attr| attr.path().is_ident("any_ptr")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("view") {
				views.push(meta.value()?.parse::<Type>()?);
				Ok(())
			} else {
				Err(meta.error("Expected `view = Type`"))
			}
		})?;
	}
	Ok(views)
}
