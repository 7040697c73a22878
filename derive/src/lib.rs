mod derive;
mod util;

#[proc_macro_derive(View, attributes(any_ptr))]
pub fn view_derive(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
	derive::view_derive(item)
}
