use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
	/// Documents a redirect with the given status (usually 302 or 303).
	#[darling(default)]
	redirect: Option<syn::LitInt>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into())
		.map_err(darling::Error::from)
		.and_then(|list| RouteArgs::from_list(&list))
	{
		Ok(args) => args,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let Some((summary, description)) = extract_doc_comment(&function.attrs) else {
		return syn::Error::new_spanned(&function.sig.ident, "route is missing a doc comment")
			.into_compile_error()
			.into();
	};

	let docs = format_ident!("{}_docs", function.sig.ident);
	let vis = &function.vis;

	let tags = args.tag.iter();
	let responses = args.response.into_iter().map(|response| {
		let ResponseArgs {
			status,
			shape,
			description,
		} = response;
		let shape = shape.map_or_else(|| quote!(()), |shape| quote!(#shape));

		match description {
			Some(text) => quote!(.response_with::<#status, #shape, _>(|res| res.description(#text))),
			None => quote!(.response::<#status, #shape>()),
		}
	});
	let redirect = args.redirect.map(|status| {
		quote! {
			.response_with::<#status, (), _>(|res| res.description("Redirects to the `Location` header."))
		}
	});

	quote! {
		#function

		#vis fn #docs(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.description(#description).summary(#summary)
				#(
					.tag(#tags)
				)*
				#(
					#responses
				)*
				#redirect
		}
	}
	.into()
}

/// Splits a doc comment into its first line (the summary) and the rest
/// (the description). A single-line comment doubles as both.
fn extract_doc_comment(attrs: &[syn::Attribute]) -> Option<(String, String)> {
	let lines = attrs
		.iter()
		.filter(|attr| attr.path().is_ident("doc"))
		.filter_map(|attr| match &attr.meta {
			syn::Meta::NameValue(syn::MetaNameValue {
				value: syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(line), .. }),
				..
			}) => Some(line.value().trim().to_owned()),
			_ => None,
		})
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>();

	let (summary, rest) = lines.split_first()?;
	let description = if rest.is_empty() {
		summary.clone()
	} else {
		rest.join(" ")
	};

	Some((summary.clone(), description))
}
