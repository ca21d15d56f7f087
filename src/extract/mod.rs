mod session;

pub use session::{MaybeSession, Session};

use aide::OperationIo;
use axum::{
	async_trait,
	extract::{FromRequest, FromRequestParts, Request},
	http::request::Parts,
	response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Rejects values that fail their `#[validate]` rules with a 400.
fn validated<T: Validate>(value: T) -> Result<T, AppError> {
	value.validate().map_err(AppError::Validation)?;

	Ok(value)
}

/// JSON body that is rejected unless it passes validation. Handlers also
/// return it to render their page data.
///
/// ```rust
/// async fn create_tag(Json(form): Json<TagForm>) {
///   // form.title is between 1 and 50 characters
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
	fn into_response(self) -> Response {
		axum::Json(self.0).into_response()
	}
}

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::Json(form) = axum::Json::<T>::from_request(req, state).await?;

		validated(form).map(Self)
	}
}

/// JSON body that is only deserialized. The handler validates it itself
/// when a failure has to be rendered as part of its own page, like the
/// comment form on a post.
///
/// ```rust
/// async fn comment_post(Submission(form): Submission<CommentForm>) {
///   if let Err(errors) = form.validate() {
///     // show the post again along with the errors
///   }
/// }
/// ```
#[derive(OperationIo)]
#[aide(input_with = "axum_jsonschema::Json<T>", json_schema)]
pub struct Submission<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Submission<T>
where
	T: DeserializeOwned + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::Json(form) = axum::Json::<T>::from_request(req, state).await?;

		Ok(Self(form))
	}
}

/// Validated query string, such as the page number of a listing.
#[derive(OperationIo)]
#[aide(input_with = "axum::extract::Query<T>", json_schema)]
pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: DeserializeOwned + Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let axum::extract::Query(query) =
			axum::extract::Query::<T>::from_request_parts(parts, state).await?;

		validated(query).map(Self)
	}
}

/// Validated path parameters, such as a post slug.
#[derive(OperationIo)]
#[aide(input_with = "axum::extract::Path<T>", json_schema)]
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: DeserializeOwned + Validate + Send,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let axum::extract::Path(path) =
			axum::extract::Path::<T>::from_request_parts(parts, state).await?;

		validated(path).map(Self)
	}
}
