use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Meta, Token};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Returns `true` for `#[serde(skip)]` and `#[serde(skip_deserializing)]`.
fn is_skipped(attr: &syn::Attribute) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
	})
}

/// Database row attributes describe the model, not the submitted form.
fn is_row_attr(attr: &syn::Attribute) -> bool {
	attr.path().is_ident("sqlx")
}

/// Copies a struct attribute onto the form, dropping the `FromRow` derive.
fn form_attr(attr: &syn::Attribute) -> Option<proc_macro2::TokenStream> {
	if is_row_attr(attr) {
		return None;
	}

	if !attr.path().is_ident("derive") {
		return Some(attr.to_token_stream());
	}

	let Ok(paths) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
	else {
		return Some(attr.to_token_stream());
	};

	let paths = paths
		.into_iter()
		.filter(|path| {
			path.segments
				.last()
				.map_or(true, |segment| segment.ident != "FromRow")
		})
		.collect::<Vec<_>>();

	Some(quote!(#[derive(#(#paths),*)]))
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let form_ident = format_ident!("{}Form", ident);

	let attrs = receiver.attrs.iter().filter_map(form_attr);

	let fields = receiver.data.take_struct().expect("expected struct");
	let fields = fields.iter().filter_map(|field| {
		let ident = field.ident.as_ref()?;
		let ty = &field.ty;
		let vis = &field.vis;

		if field.attrs.iter().any(is_skipped) {
			return None;
		}

		let attrs = field.attrs.iter().filter(|attr| !is_row_attr(attr));

		Some(quote! {
			#(#attrs)*
			#vis #ident: #ty,
		})
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #form_ident #generics {
			#(
				#fields
			)*
		}
	}
	.into()
}
