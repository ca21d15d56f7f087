mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a documentation function for the route, named after the annotated
/// function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the operation summary and the
/// remaining lines its description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a `XForm` struct for the model, holding every field a client may submit.
///
/// Fields with #[serde(skip_deserializing)] or #[serde(skip)] are left out, all
/// other fields are copied verbatim (including attributes). Forms always replace
/// every submitted field, so there is no partial variant.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
