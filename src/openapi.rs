use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const ACCOUNT: &str = "Account";
	pub const POST: &str = "Post";
	pub const TAG: &str = "Tag";
	pub const COMMENT: &str = "Comment";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog")
		.summary("A small blog with posts, tags and comments")
		.description(
			"Authenticated users write posts and tag them, visitors browse, search and comment. \
			 Form submissions answer with a `302 Found` on success.",
		)
		.tag(Tag {
			name: tag::ACCOUNT.into(),
			description: Some("Sign up, log in and out".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post listing, detail and management".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::TAG.into(),
			description: Some("Tag management".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comment moderation".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse<'static>>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: error::Message::new("A post with this title already exists.")
					.field("title")
					.into_vec(),
			})
		})
}
