use axum::{extract::State, response::Response};
use macros::route;

use crate::{
	extract::{Json, MaybeSession, Path},
	openapi::tag,
	route::{found, model::IdPath, post_url},
	Database,
};

use super::{model, Error, RouteError};

/// Moderate comment
/// Shows or hides a comment on its post, then redirects to the post. Only staff may do this.
#[route(tag = tag::COMMENT, redirect = 302, response(status = 403, description = "Not staff."))]
pub async fn moderate_comment(
	State(database): State<Database>,
	session: MaybeSession,
	Path(path): Path<IdPath>,
	Json(input): Json<model::ModerateInput>,
) -> Result<Response, RouteError> {
	let Some(moderator) = session.user().filter(|user| user.is_staff) else {
		return Err(Error::StaffOnly.into());
	};

	let slug = sqlx::query_scalar::<_, String>(
		"SELECT post.slug FROM comment JOIN post ON post.id = comment.post_id WHERE comment.id = ?",
	)
	.bind(path.id)
	.fetch_optional(&database)
	.await?;

	let Some(slug) = slug else {
		return Err(Error::UnknownComment(path.id).into());
	};

	sqlx::query("UPDATE comment SET active = ? WHERE id = ?")
		.bind(input.active)
		.bind(path.id)
		.execute(&database)
		.await?;

	tracing::info!(
		comment_id = path.id,
		active = input.active,
		moderator = %moderator.username,
		"moderated comment"
	);

	Ok(found(post_url(&slug)))
}
