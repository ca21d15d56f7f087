use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::{JsonRejection, PathRejection, QueryRejection},
	http::{header, Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;
use validator::{ValidationError, ValidationErrors};

use crate::extract::Json;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The form field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional machine-readable context.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'a> {
	pub success: bool,
	pub errors: Vec<Message<'a>>,
}

/// Describes how a route-specific error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>>;

	/// Errors that send the client elsewhere (such as to the login page)
	/// return the target here, and are rendered as a `302 Found`.
	fn location(&self) -> Option<String> {
		None
	}
}

/// Error type shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("password hashing error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] GovernorError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// Builds a validation failure for a single form field.
pub fn invalid(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
	let mut errors = ValidationErrors::new();
	let mut error = ValidationError::new(code);

	error.message = Some(message.into());
	errors.add(field, error);
	errors
}

/// Flattens validation errors into one message per failed rule, ordered by field.
pub fn field_messages(errors: &ValidationErrors) -> Vec<Message<'static>> {
	let mut fields = errors.field_errors().into_iter().collect::<Vec<_>>();
	fields.sort_by(|(a, _), (b, _)| a.cmp(b));

	fields
		.into_iter()
		.flat_map(|(field, errors)| {
			errors.iter().map(move |error| {
				let content = error.message.clone().unwrap_or_else(|| error.code.clone());

				Message::new(content).field(field)
			})
		})
		.collect()
}

fn respond(status: StatusCode, errors: Vec<Message<'_>>) -> Response<Body> {
	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => respond(StatusCode::BAD_REQUEST, field_messages(&errors)),
			Self::Json(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Query(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::Path(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				let mut response = respond(
					StatusCode::TOO_MANY_REQUESTS,
					Message::new("too many requests")
						.detail("wait_time", wait_time)
						.into_vec(),
				);

				response
					.headers_mut()
					.insert(header::RETRY_AFTER, wait_time.into());
				response
			}
			error => {
				tracing::error!(%error, "request failed");

				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

/// An error returned from a route, either a shared [`AppError`] or the
/// route module's own error type.
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<sqlx::Error> for RouteError<T> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<ValidationErrors> for RouteError<T> {
	fn from(error: ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<argon2::Error> for RouteError<T> {
	fn from(error: argon2::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T: ErrorShape> std::fmt::Display for RouteError<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::App(error) => std::fmt::Display::fmt(error, f),
			Self::Route(error) => std::fmt::Display::fmt(error, f),
		}
	}
}

impl<T: ErrorShape + std::fmt::Debug> std::error::Error for RouteError<T> {}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				if let Some(location) = error.location() {
					return (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
				}

				respond(error.status(), error.errors())
			}
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = ErrorResponse<'static>;
}
