use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use macros::route;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::{
	error,
	extract::{Json, MaybeSession, Path, Query, Session, Submission},
	model::{AuthorStatus, User},
	media::Media,
	openapi::tag,
	route::{comment, found, model::SlugPath, post_url, see_other, tag::model::Tag},
	slug, Database,
};

use super::{
	can_edit, ensure_slug_free, find, list, map_slug_conflict, model, replace_tags, resolve_tags,
	search_text, Error, Filter, RouteError,
};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct AuthorPath {
	#[validate(length(min = 1, max = 150))]
	pub author: String,
}

async fn all_tags(database: &Database) -> Result<Vec<Tag>, sqlx::Error> {
	sqlx::query_as::<_, Tag>("SELECT * FROM tag ORDER BY title, id")
		.fetch_all(database)
		.await
}

/// Fails with [`Error::Forbidden`] unless the user may change the post.
fn authorize(user: &User, post: &model::Post) -> Result<(), Error> {
	if can_edit(Some(user), post) {
		Ok(())
	} else {
		Err(Error::Forbidden)
	}
}

/// List posts
/// Returns a page of published posts, newest first, optionally narrowed down by a case-insensitive search of the title and body.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
	State(media): State<Media>,
	Query(input): Query<model::SearchInput>,
) -> Result<Json<model::PostListing>, RouteError> {
	let search = input.term();
	let page = list(&database, &media, Filter::All { search }, &input.paginate()).await?;

	Ok(Json(model::PostListing {
		page,
		search: search.map(ToOwned::to_owned),
		tag: None,
		author: None,
	}))
}

/// List posts by author
/// Returns a page of the author's published posts, newest first.
#[route(tag = tag::POST)]
pub async fn list_author_posts(
	State(database): State<Database>,
	State(media): State<Media>,
	Path(path): Path<AuthorPath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<model::PostListing>, RouteError> {
	let author = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = ?"#)
		.bind(&path.author)
		.fetch_optional(&database)
		.await?;

	let Some(author) = author else {
		return Err(Error::UnknownAuthor(path.author).into());
	};

	let page = list(&database, &media, Filter::Author(author.id), &paginate).await?;

	Ok(Json(model::PostListing {
		page,
		search: None,
		tag: None,
		author: Some(author.username),
	}))
}

/// Get post
/// Returns a post by its slug, along with its active comments.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	State(media): State<Media>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = find(&database, &media, &path.slug).await?;
	let comments = comment::list_active(&database, post.id).await?;

	Ok(Json(model::PostDetail {
		can_edit: can_edit(session.user(), &post),
		post,
		comments,
		detail: false,
		errors: Vec::new(),
	}))
}

/// Comment on post
/// Adds a comment to the post and redirects back to it. Anonymous visitors must give a name and email, logged in users only the body.
///
/// A rejected comment renders the post again, with the reasons in `errors`.
#[route(tag = tag::POST, redirect = 303, response(status = 400, shape = "Json<model::PostDetail>"))]
pub async fn comment_post(
	State(database): State<Database>,
	State(media): State<Media>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
	Submission(form): Submission<comment::model::CommentForm>,
) -> Result<Response, RouteError> {
	let post = find(&database, &media, &path.slug).await?;

	let comment = match comment::prepare(form, session.user()) {
		Ok(comment) => comment,
		Err(errors) => {
			let comments = comment::list_active(&database, post.id).await?;

			return Ok((
				StatusCode::BAD_REQUEST,
				Json(model::PostDetail {
					can_edit: can_edit(session.user(), &post),
					post,
					comments,
					detail: true,
					errors: error::field_messages(&errors),
				}),
			)
				.into_response());
		}
	};

	comment::insert(&database, post.id, &comment).await?;

	Ok(see_other(post_url(&post.slug)))
}

/// New post form
/// Returns the tags that can be attached to a new post.
#[route(tag = tag::POST)]
pub async fn new_post_form(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<model::PostFormPage>, RouteError> {
	Ok(Json(model::PostFormPage {
		post: None,
		tags: all_tags(&database).await?,
	}))
}

/// Create post
/// Creates a post written by the logged in user and redirects to it.
#[route(tag = tag::POST, redirect = 302)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(form): Json<model::PostForm>,
) -> Result<Response, RouteError> {
	let slug = slug::normalize(&form.title);
	let author_status = AuthorStatus::of(Some(&session.user));

	let mut tx = database.begin().await?;

	ensure_slug_free(&mut tx, &slug, None).await?;
	let tags = resolve_tags(&mut tx, &form.tags).await?;

	let post_id = sqlx::query(
		r#"
			INSERT INTO post (title, slug, body, search, author_id, created, published, author_status, photo)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(&form.title)
	.bind(&slug)
	.bind(&form.body)
	.bind(search_text(&form.title, &form.body))
	.bind(session.user.id)
	.bind(chrono::Utc::now())
	.bind(form.published)
	.bind(author_status)
	.bind(form.photo())
	.execute(&mut *tx)
	.await
	.map_err(map_slug_conflict)?
	.last_insert_rowid();

	replace_tags(&mut tx, post_id, &tags).await?;

	tx.commit().await?;

	tracing::info!(post_id, %slug, "created post");

	Ok(found(post_url(&slug)))
}

/// Edit post form
/// Returns the post as it is now, along with the tags that can be attached to it.
#[route(tag = tag::POST)]
pub async fn edit_post_form(
	State(database): State<Database>,
	State(media): State<Media>,
	session: Session,
	Path(path): Path<SlugPath>,
) -> Result<Json<model::PostFormPage>, RouteError> {
	let post = find(&database, &media, &path.slug).await?;

	authorize(&session.user, &post)?;

	Ok(Json(model::PostFormPage {
		post: Some(post),
		tags: all_tags(&database).await?,
	}))
}

/// Update post
/// Replaces the title, body, published flag and tags of the post, then redirects to it. Only the author and staff may do this.
#[route(tag = tag::POST, redirect = 302, response(status = 403, description = "Not the author or staff."))]
pub async fn update_post(
	State(database): State<Database>,
	State(media): State<Media>,
	session: Session,
	Path(path): Path<SlugPath>,
	Submission(form): Submission<model::PostForm>,
) -> Result<Response, RouteError> {
	let post = find(&database, &media, &path.slug).await?;

	authorize(&session.user, &post)?;
	form.validate()?;

	// The status follows the author, whoever makes the edit
	let author = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = ?"#)
		.bind(post.author_id)
		.fetch_one(&database)
		.await?;

	let slug = slug::normalize(&form.title);
	let author_status = AuthorStatus::of(Some(&author));

	let mut tx = database.begin().await?;

	ensure_slug_free(&mut tx, &slug, Some(post.id)).await?;
	let tags = resolve_tags(&mut tx, &form.tags).await?;

	sqlx::query(
		r#"
			UPDATE post
			SET title = ?, slug = ?, body = ?, search = ?, published = ?, author_status = ?, photo = ?
			WHERE id = ?
		"#,
	)
	.bind(&form.title)
	.bind(&slug)
	.bind(&form.body)
	.bind(search_text(&form.title, &form.body))
	.bind(form.published)
	.bind(author_status)
	.bind(form.photo())
	.bind(post.id)
	.execute(&mut *tx)
	.await
	.map_err(map_slug_conflict)?;

	replace_tags(&mut tx, post.id, &tags).await?;

	tx.commit().await?;

	Ok(found(post_url(&slug)))
}

/// Delete post form
/// Returns the post to confirm its deletion. Only the author and staff may do this.
#[route(tag = tag::POST)]
pub async fn delete_post_form(
	State(database): State<Database>,
	State(media): State<Media>,
	session: Session,
	Path(path): Path<SlugPath>,
) -> Result<Json<model::DeletePage>, RouteError> {
	let post = find(&database, &media, &path.slug).await?;

	authorize(&session.user, &post)?;

	Ok(Json(model::DeletePage { post }))
}

/// Delete post
/// Deletes the post along with its comments, then redirects to the home page. Only the author and staff may do this.
#[route(tag = tag::POST, redirect = 302, response(status = 403, description = "Not the author or staff."))]
pub async fn delete_post(
	State(database): State<Database>,
	State(media): State<Media>,
	session: Session,
	Path(path): Path<SlugPath>,
) -> Result<Response, RouteError> {
	let post = find(&database, &media, &path.slug).await?;

	authorize(&session.user, &post)?;

	sqlx::query("DELETE FROM post WHERE id = ?")
		.bind(post.id)
		.execute(&database)
		.await?;

	tracing::info!(post_id = post.id, deleted_by = %session.user.username, "deleted post");

	Ok(found("/"))
}
