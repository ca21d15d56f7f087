use axum::{extract::State, response::Response};
use macros::route;
use validator::Validate;

use crate::{
	extract::{Json, MaybeSession, Path, Query, Session, Submission},
	media::Media,
	openapi::tag,
	route::{found, model::SlugPath, post, tag_url},
	slug, Database,
};

use super::{authorize, ensure_slug_free, find, map_slug_conflict, model, RouteError};

/// List tags
/// Returns every tag, ordered by title.
#[route(tag = tag::TAG)]
pub async fn list_tags(State(database): State<Database>) -> Result<Json<model::TagList>, RouteError> {
	let tags = sqlx::query_as::<_, model::Tag>("SELECT * FROM tag ORDER BY title, id")
		.fetch_all(&database)
		.await?;

	Ok(Json(model::TagList { tags }))
}

/// List posts by tag
/// Returns a page of the tag's published posts, newest first.
#[route(tag = tag::TAG)]
pub async fn list_tag_posts(
	State(database): State<Database>,
	State(media): State<Media>,
	Path(path): Path<SlugPath>,
	Query(paginate): Query<post::model::Paginate>,
) -> Result<Json<post::model::PostListing>, RouteError> {
	let tag = find(&database, &path.slug).await?;
	let page = post::list(&database, &media, post::Filter::Tag(tag.id), &paginate).await?;

	Ok(Json(post::model::PostListing {
		page,
		search: None,
		tag: Some(tag),
		author: None,
	}))
}

/// New tag form
/// Describes the form to create a tag with.
#[route(tag = tag::TAG)]
pub async fn new_tag_form(_session: Session) -> Json<model::TagFormPage> {
	Json(model::TagFormPage { tag: None })
}

/// Create tag
/// Creates a tag and redirects to its post listing.
#[route(tag = tag::TAG, redirect = 302)]
pub async fn create_tag(
	State(database): State<Database>,
	session: Session,
	Json(form): Json<model::TagForm>,
) -> Result<Response, RouteError> {
	let slug = slug::normalize(&form.title);

	let mut tx = database.begin().await?;

	ensure_slug_free(&mut tx, &slug, None).await?;

	sqlx::query("INSERT INTO tag (title, slug, author_id) VALUES (?, ?, ?)")
		.bind(&form.title)
		.bind(&slug)
		.bind(session.user.id)
		.execute(&mut *tx)
		.await
		.map_err(map_slug_conflict)?;

	tx.commit().await?;

	Ok(found(tag_url(&slug)))
}

/// Edit tag form
/// Returns the tag as it is now. Only staff may do this.
#[route(tag = tag::TAG, response(status = 403, description = "Not staff."))]
pub async fn edit_tag_form(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
) -> Result<Json<model::TagFormPage>, RouteError> {
	authorize(session.user())?;

	let tag = find(&database, &path.slug).await?;

	Ok(Json(model::TagFormPage { tag: Some(tag) }))
}

/// Update tag
/// Renames the tag and redirects to its post listing. Only staff may do this.
#[route(tag = tag::TAG, redirect = 302, response(status = 403, description = "Not staff."))]
pub async fn update_tag(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
	Submission(form): Submission<model::TagForm>,
) -> Result<Response, RouteError> {
	authorize(session.user())?;

	let tag = find(&database, &path.slug).await?;

	form.validate()?;

	let slug = slug::normalize(&form.title);

	let mut tx = database.begin().await?;

	ensure_slug_free(&mut tx, &slug, Some(tag.id)).await?;

	sqlx::query("UPDATE tag SET title = ?, slug = ? WHERE id = ?")
		.bind(&form.title)
		.bind(&slug)
		.bind(tag.id)
		.execute(&mut *tx)
		.await
		.map_err(map_slug_conflict)?;

	tx.commit().await?;

	Ok(found(tag_url(&slug)))
}

/// Delete tag form
/// Returns the tag, who created it and how many posts carry it, to confirm its deletion. Only staff may do this.
#[route(tag = tag::TAG, response(status = 403, description = "Not staff."))]
pub async fn delete_tag_form(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
) -> Result<Json<model::DeletePage>, RouteError> {
	authorize(session.user())?;

	let tag = find(&database, &path.slug).await?;
	let posts = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_tag WHERE tag_id = ?")
		.bind(tag.id)
		.fetch_one(&database)
		.await?;

	let author = match tag.author_id {
		Some(id) => {
			sqlx::query_scalar::<_, String>(r#"SELECT username FROM "user" WHERE id = ?"#)
				.bind(id)
				.fetch_optional(&database)
				.await?
		}
		None => None,
	};

	Ok(Json(model::DeletePage { tag, author, posts }))
}

/// Delete tag
/// Deletes the tag, keeping its posts, and redirects to the tag list. Only staff may do this.
#[route(tag = tag::TAG, redirect = 302, response(status = 403, description = "Not staff."))]
pub async fn delete_tag(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<SlugPath>,
) -> Result<Response, RouteError> {
	authorize(session.user())?;

	let tag = find(&database, &path.slug).await?;

	sqlx::query("DELETE FROM tag WHERE id = ?")
		.bind(tag.id)
		.execute(&database)
		.await?;

	Ok(found("/tags/"))
}
