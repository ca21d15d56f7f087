use aide::axum::ApiRouter;
use axum::{
	http::{header, StatusCode},
	response::{IntoResponse, Redirect, Response},
};

use crate::AppState;

pub mod account;
pub mod comment;
pub mod docs;
pub mod model;
pub mod post;
pub mod tag;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(post::routes())
		.merge(tag::routes())
		.merge(comment::routes())
		.merge(account::routes())
}

/// Sends the client to `location` with a `302 Found`.
pub fn found(location: impl AsRef<str>) -> Response {
	(
		StatusCode::FOUND,
		[(header::LOCATION, location.as_ref().to_owned())],
	)
		.into_response()
}

/// Sends the client to `location` with a `303 See Other`, used after a form
/// submission that re-renders the same page.
pub fn see_other(location: impl AsRef<str>) -> Response {
	Redirect::to(location.as_ref()).into_response()
}

pub fn post_url(slug: &str) -> String {
	format!("/post/{slug}/")
}

pub fn tag_url(slug: &str) -> String {
	format!("/tag/{slug}/")
}

/// Returns `true` if the error is a violation of a unique constraint, which is
/// how a concurrent save of the same slug or username shows up.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
	matches!(error, sqlx::Error::Database(e) if e.is_unique_violation())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[test]
	fn test_urls() {
		assert_eq!(super::post_url("hello-world"), "/post/hello-world/");
		assert_eq!(super::tag_url("rust"), "/tag/rust/");
	}

	#[sqlx::test]
	async fn test_unknown_route(pool: Database) {
		let app = app(pool);

		let response = app.get("/nothing/here/").await;

		assert_eq!(response.status_code(), 404);
	}
}
