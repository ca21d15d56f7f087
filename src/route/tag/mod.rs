use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;
use sqlx::SqliteConnection;

use crate::{
	error::{self, ErrorShape},
	model::User,
	route::{is_unique_violation, post},
	AppState, Database,
};

use model::Tag;

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown tag {0}")]
	UnknownTag(String),
	#[error("only staff may change tags")]
	StaffOnly,
	#[error(transparent)]
	Post(#[from] post::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/tags/", get_with(list_tags, list_tags_docs))
		.api_route(
			"/tag/new/",
			get_with(new_tag_form, new_tag_form_docs).post_with(create_tag, create_tag_docs),
		)
		.api_route("/tag/:slug/", get_with(list_tag_posts, list_tag_posts_docs))
		.api_route(
			"/tag/:slug/edit/",
			get_with(edit_tag_form, edit_tag_form_docs).post_with(update_tag, update_tag_docs),
		)
		.api_route(
			"/tag/:slug/delete/",
			get_with(delete_tag_form, delete_tag_form_docs).post_with(delete_tag, delete_tag_docs),
		)
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownTag(..) => StatusCode::NOT_FOUND,
			Self::StaffOnly => StatusCode::FORBIDDEN,
			Self::Post(e) => e.status(),
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownTag(slug) => error::Message::new("unknown_tag")
				.detail("slug", json!(slug))
				.into_vec(),
			Self::StaffOnly => error::Message::new(self.to_string()).into_vec(),
			Self::Post(e) => e.errors(),
		}
	}
}

impl From<post::RouteError> for RouteError {
	fn from(e: post::RouteError) -> Self {
		match e {
			error::RouteError::App(e) => Self::App(e),
			error::RouteError::Route(e) => Self::Route(e.into()),
		}
	}
}

pub async fn find(database: &Database, slug: &str) -> Result<Tag, RouteError> {
	let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tag WHERE slug = ?")
		.bind(slug)
		.fetch_optional(database)
		.await?;

	Ok(tag.ok_or_else(|| Error::UnknownTag(slug.to_owned()))?)
}

/// Tags are shared by every author, so only staff may change them.
fn authorize(user: Option<&User>) -> Result<(), Error> {
	match user {
		Some(user) if user.is_staff => Ok(()),
		_ => Err(Error::StaffOnly),
	}
}

fn slug_taken() -> validator::ValidationErrors {
	error::invalid("title", "slug_taken", "A tag with this title already exists.")
}

fn map_slug_conflict(error: sqlx::Error) -> RouteError {
	if is_unique_violation(&error) {
		slug_taken().into()
	} else {
		error.into()
	}
}

/// Fails validation if another tag than `except` already owns `slug`.
async fn ensure_slug_free(
	conn: &mut SqliteConnection,
	slug: &str,
	except: Option<i64>,
) -> Result<(), RouteError> {
	let owner = sqlx::query_scalar::<_, i64>("SELECT id FROM tag WHERE slug = ?")
		.bind(slug)
		.fetch_optional(&mut *conn)
		.await?;

	match owner {
		Some(id) if Some(id) != except => Err(slug_taken().into()),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_tag_lifecycle(pool: Database) {
		let app = app(pool.clone());

		login_staff(&app, &pool, "admin").await;

		let response = app.post("/tag/new/").json(&json!({ "title": "Rust Lang" })).await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/tag/rust-lang/");

		let response = app
			.post("/tag/rust-lang/edit/")
			.json(&json!({ "title": "Rust" }))
			.await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/tag/rust/");

		let tags = app.get("/tags/").await.json::<Value>();

		assert_eq!(tags["tags"][0]["slug"], "rust");

		let response = app.get("/tag/rust/delete/").await;

		assert_eq!(response.status_code(), 200);

		let page = response.json::<Value>();

		assert_eq!(page["posts"], 0);
		assert_eq!(page["author"], "admin");

		let response = app.post("/tag/rust/delete/").await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/tags/");

		let response = app.get("/tag/rust/").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_tag_slug_rules(pool: Database) {
		let app = app(pool);

		login(&app, "john").await;

		let response = app.post("/tag/new/").json(&json!({ "title": "new" })).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");

		let response = app.post("/tag/new/").json(&json!({ "title": "SQL" })).await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/tag/sql/");

		let response = app.post("/tag/new/").json(&json!({ "title": "sql" })).await;

		assert_eq!(response.status_code(), 400);

		let tags = app.get("/tags/").await.json::<Value>();

		assert_eq!(tags["tags"].as_array().unwrap().len(), 1);
	}

	#[sqlx::test]
	async fn test_tag_create_requires_login(pool: Database) {
		let app = app(pool);

		let response = app.get("/tag/new/").await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/login/?next=%2Ftag%2Fnew%2F");
	}

	#[sqlx::test]
	async fn test_only_staff_may_change_tags(pool: Database) {
		let user = app(pool.clone());
		let anonymous = app(pool.clone());

		login(&user, "john").await;
		create_tag(&user, &pool, "Rust").await;

		for app in [&user, &anonymous] {
			let response = app.get("/tag/rust/edit/").await;

			assert_eq!(response.status_code(), 403);

			let response = app
				.post("/tag/rust/edit/")
				.json(&json!({ "title": "Go" }))
				.await;

			assert_eq!(response.status_code(), 403);

			let response = app.post("/tag/rust/delete/").await;

			assert_eq!(response.status_code(), 403);
		}

		let tags = user.get("/tags/").await.json::<Value>();

		assert_eq!(tags["tags"][0]["title"], "Rust");
	}

	#[sqlx::test]
	async fn test_tag_filter(pool: Database) {
		let app = app(pool.clone());

		login(&app, "john").await;

		let rust = create_tag(&app, &pool, "Rust").await;
		let web = create_tag(&app, &pool, "Web").await;

		create_post(&app, "Ownership", "Body.", &[rust]).await;
		create_post(&app, "Axum", "Body.", &[rust, web]).await;
		create_post(&app, "CSS", "Body.", &[web]).await;
		create_post(&app, "Untagged", "Body.", &[]).await;

		let listing = app.get("/tag/rust/").await.json::<Value>();

		assert_eq!(titles(&listing), ["Axum", "Ownership"]);
		assert_eq!(listing["tag"]["title"], "Rust");

		let listing = app.get("/tag/web/").await.json::<Value>();

		assert_eq!(titles(&listing), ["CSS", "Axum"]);

		let response = app.get("/tag/nothing/").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_deleting_tag_keeps_posts(pool: Database) {
		let app = app(pool.clone());

		login_staff(&app, &pool, "admin").await;

		let rust = create_tag(&app, &pool, "Rust").await;

		create_post(&app, "Ownership", "Body.", &[rust]).await;

		let response = app.get("/tag/rust/delete/").await;

		assert_eq!(response.json::<Value>()["posts"], 1);

		let response = app.post("/tag/rust/delete/").await;

		assert_eq!(response.status_code(), 302);

		let detail = app.get("/post/ownership/").await.json::<Value>();

		assert_eq!(detail["post"]["title"], "Ownership");
		assert_eq!(detail["post"]["tags"].as_array().unwrap().len(), 0);
	}
}
