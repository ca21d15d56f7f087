use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
	error,
	media::Media,
	model::User,
	route::{is_unique_violation, tag::model::Tag},
	AppState, Database,
};

use model::{Page, Paginate, Post};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(String),
	#[error("unknown author {0}")]
	UnknownAuthor(String),
	#[error("page {0} does not exist")]
	PageOutOfRange(i64),
	#[error("only the author or staff may change this post")]
	Forbidden,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(list_posts, list_posts_docs))
		.api_route(
			"/posts/by/:author/",
			get_with(list_author_posts, list_author_posts_docs),
		)
		.api_route(
			"/post/new/",
			get_with(new_post_form, new_post_form_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/post/:slug/",
			get_with(get_post, get_post_docs).post_with(comment_post, comment_post_docs),
		)
		.api_route(
			"/post/:slug/edit/",
			get_with(edit_post_form, edit_post_form_docs).post_with(update_post, update_post_docs),
		)
		.api_route(
			"/post/:slug/delete/",
			get_with(delete_post_form, delete_post_form_docs)
				.post_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownAuthor(..) | Self::PageOutOfRange(..) => {
				StatusCode::NOT_FOUND
			}
			Self::Forbidden => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(slug) => error::Message::new("unknown_post")
				.detail("slug", json!(slug))
				.into_vec(),
			Self::UnknownAuthor(author) => error::Message::new("unknown_author")
				.detail("author", json!(author))
				.into_vec(),
			Self::PageOutOfRange(page) => error::Message::new("invalid_page")
				.detail("page", json!(page))
				.into_vec(),
			Self::Forbidden => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

/// Selects which published posts a listing shows.
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
	All { search: Option<&'a str> },
	Author(Uuid),
	Tag(i64),
}

const SELECT_POST: &str = r#"
	SELECT
		post.id, post.title, post.slug, post.body, post.author_id,
		"user".username AS author,
		post.created, post.published, post.author_status, post.photo
	FROM post
	JOIN "user" ON "user".id = post.author_id
"#;

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: Filter<'_>) {
	builder.push(" WHERE post.published = TRUE");

	match filter {
		Filter::All { search: None } => {}
		Filter::All { search: Some(term) } => {
			builder
				.push(" AND instr(post.search, ")
				.push_bind(term.to_lowercase())
				.push(") > 0");
		}
		Filter::Author(author_id) => {
			builder.push(" AND post.author_id = ").push_bind(author_id);
		}
		Filter::Tag(tag_id) => {
			builder
				.push(" AND post.id IN (SELECT post_id FROM post_tag WHERE tag_id = ")
				.push_bind(tag_id)
				.push(")");
		}
	}
}

/// Returns one page of published posts, newest first.
pub async fn list(
	database: &Database,
	media: &Media,
	filter: Filter<'_>,
	paginate: &Paginate,
) -> Result<Page<Post>, RouteError> {
	let mut count = QueryBuilder::new("SELECT COUNT(*) FROM post");
	push_filter(&mut count, filter);

	let count = count
		.build_query_scalar::<i64>()
		.fetch_one(database)
		.await?;

	if !paginate.exists(count) {
		return Err(Error::PageOutOfRange(paginate.page).into());
	}

	let mut query = QueryBuilder::new(SELECT_POST);
	push_filter(&mut query, filter);

	query
		.push(" ORDER BY post.created DESC, post.id DESC LIMIT ")
		.push_bind(paginate.limit())
		.push(" OFFSET ")
		.push_bind(paginate.offset());

	let mut posts = query.build_query_as::<Post>().fetch_all(database).await?;

	for post in &mut posts {
		post.tags = tags_of(database, post.id).await?;
		post.resolve_photo(media);
	}

	Ok(Page::new(posts, paginate, count))
}

/// The tags of a post, ordered by title.
pub async fn tags_of(database: &Database, post_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
	sqlx::query_as::<_, Tag>(
		r#"
			SELECT tag.* FROM tag
			JOIN post_tag ON post_tag.tag_id = tag.id
			WHERE post_tag.post_id = ?
			ORDER BY tag.title, tag.id
		"#,
	)
	.bind(post_id)
	.fetch_all(database)
	.await
}

/// Looks up a post by slug, published or not.
pub async fn find(database: &Database, media: &Media, slug: &str) -> Result<Post, RouteError> {
	let post = sqlx::query_as::<_, Post>(&format!("{SELECT_POST} WHERE post.slug = ?"))
		.bind(slug)
		.fetch_optional(database)
		.await?;

	let Some(mut post) = post else {
		return Err(Error::UnknownPost(slug.to_owned()).into());
	};

	post.tags = tags_of(database, post.id).await?;
	post.resolve_photo(media);

	Ok(post)
}

/// Only the author and staff may change a post.
pub fn can_edit(user: Option<&User>, post: &Post) -> bool {
	user.is_some_and(|user| user.is_staff || user.id == post.author_id)
}

fn slug_taken() -> validator::ValidationErrors {
	error::invalid(
		"title",
		"slug_taken",
		"A post with this title already exists.",
	)
}

/// Maps a unique violation on the slug to the same error as [`ensure_slug_free`].
fn map_slug_conflict(error: sqlx::Error) -> RouteError {
	if is_unique_violation(&error) {
		slug_taken().into()
	} else {
		error.into()
	}
}

/// Fails validation if another post than `except` already owns `slug`.
async fn ensure_slug_free(
	conn: &mut SqliteConnection,
	slug: &str,
	except: Option<i64>,
) -> Result<(), RouteError> {
	let owner = sqlx::query_scalar::<_, i64>("SELECT id FROM post WHERE slug = ?")
		.bind(slug)
		.fetch_optional(&mut *conn)
		.await?;

	match owner {
		Some(id) if Some(id) != except => Err(slug_taken().into()),
		_ => Ok(()),
	}
}

/// Deduplicates the submitted tag ids, failing validation if any is unknown.
async fn resolve_tags(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<i64>, RouteError> {
	let mut ids = ids.to_vec();
	ids.sort_unstable();
	ids.dedup();

	for id in &ids {
		let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM tag WHERE id = ?")
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?;

		if exists.is_none() {
			return Err(error::invalid(
				"tags",
				"unknown_tag",
				"Select a valid choice. That tag does not exist.",
			)
			.into());
		}
	}

	Ok(ids)
}

/// Replaces every tag of the post with `tags`.
async fn replace_tags(
	conn: &mut SqliteConnection,
	post_id: i64,
	tags: &[i64],
) -> Result<(), sqlx::Error> {
	sqlx::query("DELETE FROM post_tag WHERE post_id = ?")
		.bind(post_id)
		.execute(&mut *conn)
		.await?;

	for tag_id in tags {
		sqlx::query("INSERT INTO post_tag (post_id, tag_id) VALUES (?, ?)")
			.bind(post_id)
			.bind(tag_id)
			.execute(&mut *conn)
			.await?;
	}

	Ok(())
}

/// The lowercased text `search` matches against.
fn search_text(title: &str, body: &str) -> String {
	format!("{}\u{1f}{}", title.to_lowercase(), body.to_lowercase())
}
