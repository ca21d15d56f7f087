use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use argon2::Argon2;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, model::User, AppError, AppState};

pub mod model;
pub mod route;

pub const KEY_LENGTH: usize = 32;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("you must be logged in to see this page")]
	LoginRequired { next: String },
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/signup/",
			get_with(signup_form, signup_form_docs).post_with(signup, signup_docs),
		)
		.api_route(
			"/login/",
			get_with(login_form, login_form_docs).post_with(login, login_docs),
		)
		.api_route("/logout/", post_with(logout, logout_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::LoginRequired { .. } => StatusCode::FOUND,
			Self::InvalidUsernameOrPassword => StatusCode::BAD_REQUEST,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		error::Message::new(self.to_string()).into_vec()
	}

	fn location(&self) -> Option<String> {
		let Self::LoginRequired { next } = self else {
			return None;
		};

		Some(match serde_urlencoded::to_string([("next", next)]) {
			Ok(query) => format!("/login/?{query}"),
			Err(_) => "/login/".into(),
		})
	}
}

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// An account about to be created.
pub struct NewUser<'a> {
	pub username: &'a str,
	pub email: &'a str,
	pub password: &'a str,
	pub is_staff: bool,
}

/// Inserts a new account, hashing its password.
///
/// A taken username surfaces as a unique violation from the database.
pub async fn create_user(state: &AppState, user: NewUser<'_>) -> Result<User, AppError> {
	let id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, user.password, &id)?;

	let mut tx = state.database.begin().await?;

	sqlx::query(
		r#"
			INSERT INTO "user" (id, username, email, password, is_staff, created_at)
			VALUES (?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(id)
	.bind(user.username)
	.bind(user.email)
	.bind(&hashed[..])
	.bind(user.is_staff)
	.bind(chrono::Utc::now())
	.execute(&mut *tx)
	.await?;

	let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = ?"#)
		.bind(id)
		.fetch_one(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(user)
}

/// Creates the staff account `username` unless an account by that name exists.
///
/// An existing account is left untouched, whatever its password or staff flag.
pub async fn ensure_admin(state: &AppState, username: &str, password: &str) -> Result<(), AppError> {
	let id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, password, &id)?;

	let created = sqlx::query(
		r#"
			INSERT INTO "user" (id, username, email, password, is_staff, created_at)
			VALUES (?, ?, '', ?, TRUE, ?)
			ON CONFLICT (username) DO NOTHING
		"#,
	)
	.bind(id)
	.bind(username)
	.bind(&hashed[..])
	.bind(chrono::Utc::now())
	.execute(&state.database)
	.await?
	.rows_affected();

	if created == 0 {
		tracing::debug!(username, "admin account already exists");
	} else {
		tracing::info!(username, "created admin account");
	}

	Ok(())
}

#[cfg(test)]
mod test {
	use argon2::Argon2;

	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/signup/")
			.json(&json!({
				"username": "john",
				"email": "john@smith.com",
				"password1": "hunter2hunter",
				"password2": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/login/");

		let response = app
			.post("/login/")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/");

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		// Logged in visitors are sent away from the account pages
		let response = app.get("/login/").await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/");

		let response = app.get("/signup/").await;

		assert_eq!(response.status_code(), 302);
	}

	#[sqlx::test]
	async fn test_signup_password_mismatch(pool: Database) {
		let app = app(pool.clone());

		let response = app
			.post("/signup/")
			.json(&json!({
				"username": "john",
				"password1": "hunter2hunter",
				"password2": "hunter3hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "password2");

		let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(count, 0);
	}

	#[sqlx::test]
	async fn test_signup_rejects_taken_username(pool: Database) {
		let app = app(pool);
		let form = json!({
			"username": "john",
			"password1": "hunter2hunter",
			"password2": "hunter2hunter",
		});

		let response = app.post("/signup/").json(&form).await;

		assert_eq!(response.status_code(), 302);

		let response = app.post("/signup/").json(&form).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");
	}

	#[sqlx::test]
	async fn test_signup_rejects_short_password(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/signup/")
			.json(&json!({
				"username": "john",
				"password1": "short",
				"password2": "short",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "password1");
	}

	#[sqlx::test]
	async fn test_login_wrong_password(pool: Database) {
		let app = app(pool);

		login(&app, "john").await;
		app.post("/logout/").await;

		let response = app
			.post("/login/")
			.json(&json!({
				"username": "john",
				"password": "not-the-password",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let errors = response.json::<Value>()["errors"].clone();

		assert_eq!(errors[0]["content"], "invalid username or password");
		assert!(errors[0].get("field").is_none());

		let response = app
			.post("/login/")
			.json(&json!({
				"username": "jane",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_login_follows_next(pool: Database) {
		let app = app(pool);

		login(&app, "john").await;
		app.post("/logout/").await;

		let response = app
			.post("/login/")
			.add_query_param("next", "/post/new/")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/post/new/");
	}

	#[sqlx::test]
	async fn test_login_ignores_next_to_other_host(pool: Database) {
		let app = app(pool);

		login(&app, "john").await;

		for next in ["//evil.com/", "/\\evil.com/", "https://evil.com/"] {
			app.post("/logout/").await;

			let response = app
				.post("/login/")
				.add_query_param("next", next)
				.json(&json!({
					"username": "john",
					"password": "hunter2hunter",
				}))
				.await;

			assert_eq!(response.status_code(), 302);
			assert_eq!(response.header("location"), "/", "next = {next}");
		}
	}

	#[sqlx::test]
	async fn test_logout(pool: Database) {
		let app = app(pool);

		login(&app, "john").await;

		let response = app.post("/logout/").await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/");

		// The session is gone, so creating a post asks to log in again
		let response = app.get("/post/new/").await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/login/?next=%2Fpost%2Fnew%2F");
	}

	#[sqlx::test]
	async fn test_ensure_admin(pool: Database) {
		let state = crate::State {
			database: pool.clone(),
			hasher: Argon2::default(),
			media: crate::media::Media::new("/media/"),
		};

		super::ensure_admin(&state, "admin", "hunter2hunter")
			.await
			.unwrap();
		super::ensure_admin(&state, "admin", "another-password")
			.await
			.unwrap();

		let staff = sqlx::query_scalar::<_, bool>(r#"SELECT is_staff FROM "user" WHERE username = 'admin'"#)
			.fetch_all(&pool)
			.await
			.unwrap();

		assert_eq!(staff, vec![true]);

		// The first password still works, the second one was never stored
		let app = app(pool);

		let response = app
			.post("/login/")
			.json(&json!({ "username": "admin", "password": "another-password" }))
			.await;

		assert_eq!(response.status_code(), 400);

		let response = app
			.post("/login/")
			.json(&json!({ "username": "admin", "password": "hunter2hunter" }))
			.await;

		assert_eq!(response.status_code(), 302);
	}

	#[sqlx::test]
	async fn test_ensure_admin_keeps_existing_account(pool: Database) {
		let app = app(pool.clone());

		login(&app, "admin").await;

		let state = crate::State {
			database: pool.clone(),
			hasher: Argon2::default(),
			media: crate::media::Media::new("/media/"),
		};

		super::ensure_admin(&state, "admin", "another-password")
			.await
			.unwrap();

		let staff = sqlx::query_scalar::<_, bool>(r#"SELECT is_staff FROM "user" WHERE username = 'admin'"#)
			.fetch_one(&pool)
			.await
			.unwrap();

		assert!(!staff);
	}
}
