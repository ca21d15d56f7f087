use aide::OperationInput;
use axum::{
	async_trait,
	extract::{FromRef, FromRequestParts},
	http::{header, request, Uri},
};
use uuid::Uuid;

use crate::{
	error::{AppError, RouteError},
	model::User,
	openapi::SECURITY_SCHEME_SESSION,
	route::account,
	session, Database,
};

/// Extracts the session and related user from the request.
///
/// Anonymous visitors are redirected to the login page with a `next`
/// parameter pointing back at the requested page, see
/// [`account::Error::LoginRequired`].
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

/// Like [`Session`], but lets anonymous visitors through.
///
/// A missing, malformed or expired session cookie all count as anonymous.
#[derive(Debug)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
	pub fn user(&self) -> Option<&User> {
		self.0.as_ref().map(|session| &session.user)
	}
}

/// Looks up the session named by the request's session cookie.
async fn find_session(parts: &request::Parts, database: &Database) -> Result<Option<Session>, AppError> {
	let cookies = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok());

	let Some(session_id) = cookies
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
	else {
		return Ok(None);
	};

	let user = sqlx::query_as::<_, User>(
		r#"
			SELECT "user".* FROM "user"
			JOIN session ON session.user_id = "user".id
			WHERE session.id = ?
		"#,
	)
	.bind(session_id)
	.fetch_optional(database)
	.await?;

	Ok(user.map(|user| Session {
		id: session_id,
		user,
	}))
}

/// The page to come back to after logging in.
fn next_target(uri: &Uri) -> String {
	uri.path_and_query()
		.map_or_else(|| uri.path().to_owned(), |path| path.as_str().to_owned())
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<account::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let database = Database::from_ref(state);
		let session = find_session(parts, &database).await?;

		Ok(session.ok_or_else(|| account::Error::LoginRequired {
			next: next_target(&parts.uri),
		})?)
	}
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let database = Database::from_ref(state);

		Ok(Self(find_session(parts, &database).await?))
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

impl OperationInput for MaybeSession {}
