use axum::{
	extract::State,
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};
use macros::route;
use uuid::Uuid;

use crate::{
	error,
	extract::{Json, MaybeSession, Query, Session},
	model::User,
	openapi::tag,
	route::{found, is_unique_violation},
	session, AppError, AppState, Database,
};

use super::{create_user, hash_password, model, Error, NewUser, RouteError};

/// Signup form
/// Describes the signup form. Logged in visitors are sent to the home page instead.
#[route(tag = tag::ACCOUNT, redirect = 302, response(status = 200, shape = "Json<model::FormPage>"))]
pub async fn signup_form(session: MaybeSession) -> Response {
	if session.0.is_some() {
		return found("/");
	}

	Json(model::FormPage {
		fields: &["username", "email", "password1", "password2"],
		next: None,
	})
	.into_response()
}

/// Sign up
/// Creates a new account and redirects to the login page.
#[route(tag = tag::ACCOUNT, redirect = 302)]
pub async fn signup(
	State(state): State<AppState>,
	session: MaybeSession,
	Json(input): Json<model::SignupInput>,
) -> Result<Response, RouteError> {
	if session.0.is_some() {
		return Ok(found("/"));
	}

	if input.password1 != input.password2 {
		return Err(error::invalid(
			"password2",
			"password_mismatch",
			"The two password fields didn't match.",
		)
		.into());
	}

	let user = NewUser {
		username: &input.username,
		email: input.email.as_deref().unwrap_or_default(),
		password: &input.password1,
		is_staff: false,
	};

	match create_user(&state, user).await {
		Ok(user) => tracing::info!(username = %user.username, "signed up"),
		Err(AppError::Database(e)) if is_unique_violation(&e) => {
			return Err(error::invalid(
				"username",
				"username_taken",
				"A user with that username already exists.",
			)
			.into());
		}
		Err(e) => return Err(e.into()),
	}

	Ok(found("/login/"))
}

/// Login form
/// Describes the login form. Logged in visitors are sent to the home page instead.
#[route(tag = tag::ACCOUNT, redirect = 302, response(status = 200, shape = "Json<model::FormPage>"))]
pub async fn login_form(session: MaybeSession, Query(query): Query<model::LoginQuery>) -> Response {
	if session.0.is_some() {
		return found("/");
	}

	Json(model::FormPage {
		fields: &["username", "password"],
		next: query.next,
	})
	.into_response()
}

/// Log in
/// Logs in to an account, setting the session cookie and redirecting to `next` (or the home page).
#[route(tag = tag::ACCOUNT, redirect = 302, response(status = 400, description = "Invalid username or password."))]
pub async fn login(
	State(state): State<AppState>,
	session: MaybeSession,
	Query(query): Query<model::LoginQuery>,
	Json(auth): Json<model::LoginInput>,
) -> Result<Response, RouteError> {
	if session.0.is_some() {
		return Ok(found("/"));
	}

	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = ?"#)
		.bind(&auth.username)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		return Err(Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &user.id)?;

	if user.password != hashed {
		return Err(Error::InvalidUsernameOrPassword.into());
	}

	let session_id = Uuid::new_v4();

	sqlx::query("INSERT INTO session (id, user_id, created_at) VALUES (?, ?, ?)")
		.bind(session_id)
		.bind(user.id)
		.bind(chrono::Utc::now())
		.execute(&state.database)
		.await?;

	let cookie = session::create_cookie(session_id);

	Ok((
		StatusCode::FOUND,
		[
			(header::SET_COOKIE, cookie.to_string()),
			(header::LOCATION, query.target().to_owned()),
		],
	)
		.into_response())
}

/// Log out
/// Ends the current session, clears the session cookie and redirects to the home page.
#[route(tag = tag::ACCOUNT, redirect = 302)]
pub async fn logout(
	State(database): State<Database>,
	session: Session,
) -> Result<Response, RouteError> {
	sqlx::query("DELETE FROM session WHERE id = ?")
		.bind(session.id)
		.execute(&database)
		.await?;

	// Clear the session cookie
	Ok((
		StatusCode::FOUND,
		[
			(header::SET_COOKIE, session::clear_cookie().to_string()),
			(header::LOCATION, "/".to_owned()),
		],
	)
		.into_response())
}
