use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::{
	error,
	model::{AuthorStatus, User},
	AppState, Database,
};

use model::{Comment, CommentForm, NewComment};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown comment {0}")]
	UnknownComment(i64),
	#[error("only staff may moderate comments")]
	StaffOnly,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/comment/:id/moderate/",
		post_with(moderate_comment, moderate_comment_docs),
	)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownComment(..) => StatusCode::NOT_FOUND,
			Self::StaffOnly => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownComment(comment) => error::Message::new("unknown_comment")
				.detail("comment", json!(comment))
				.into_vec(),
			Self::StaffOnly => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
	let mut error = ValidationError::new(code);
	error.message = Some(message.into());
	error
}

/// Validates a submitted comment on behalf of `user`, `None` being an
/// anonymous visitor.
///
/// Anonymous visitors must give their name and a valid email. For logged in
/// users both are taken from the account instead, and only the body is read.
pub fn prepare(form: CommentForm, user: Option<&User>) -> Result<NewComment, ValidationErrors> {
	let mut errors = match form.validate() {
		Ok(()) => ValidationErrors::new(),
		Err(errors) => errors,
	};

	let (name, email) = match user {
		Some(user) => (user.username.clone(), user.email.clone()),
		None => {
			let name = form.name.trim();
			let email = form.email.trim();

			if name.is_empty() {
				errors.add("name", field_error("required", "This field is required."));
			} else if name.chars().count() > 80 {
				errors.add(
					"name",
					field_error("length", "Ensure this value has at most 80 characters."),
				);
			}

			if email.is_empty() {
				errors.add("email", field_error("required", "This field is required."));
			} else if !email.validate_email() {
				errors.add("email", field_error("email", "Enter a valid email address."));
			}

			(name.to_owned(), email.to_owned())
		}
	};

	if !errors.is_empty() {
		return Err(errors);
	}

	Ok(NewComment {
		name,
		email,
		body: form.body,
		author_status: AuthorStatus::of(user),
	})
}

/// The active comments of a post, oldest first.
pub async fn list_active(database: &Database, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
	sqlx::query_as::<_, Comment>(
		r#"
			SELECT * FROM comment
			WHERE post_id = ? AND active = TRUE
			ORDER BY created, id
		"#,
	)
	.bind(post_id)
	.fetch_all(database)
	.await
}

/// Saves a comment on the post, returning its id once committed.
pub async fn insert(
	database: &Database,
	post_id: i64,
	comment: &NewComment,
) -> Result<i64, sqlx::Error> {
	let mut tx = database.begin().await?;

	let id = sqlx::query(
		r#"
			INSERT INTO comment (post_id, name, email, body, author_status, created)
			VALUES (?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(post_id)
	.bind(&comment.name)
	.bind(&comment.email)
	.bind(&comment.body)
	.bind(comment.author_status)
	.bind(chrono::Utc::now())
	.execute(&mut *tx)
	.await?
	.last_insert_rowid();

	tx.commit().await?;

	Ok(id)
}

#[cfg(test)]
mod test {
	use crate::{model::AuthorStatus, test::*};

	use super::{model::CommentForm, prepare};

	fn form(name: &str, email: &str, body: &str) -> CommentForm {
		CommentForm {
			name: name.into(),
			email: email.into(),
			body: body.into(),
		}
	}

	fn user(is_staff: bool) -> crate::model::User {
		crate::model::User {
			id: uuid::Uuid::new_v4(),
			username: "john".into(),
			email: "john@smith.com".into(),
			password: Vec::new(),
			is_staff,
			created_at: chrono::Utc::now(),
		}
	}

	#[test]
	fn test_anonymous_comment_requires_identity() {
		let errors = prepare(form("", "", "Hello"), None).unwrap_err();
		let errors = errors.field_errors();

		assert!(errors.contains_key("name"));
		assert!(errors.contains_key("email"));
		assert!(!errors.contains_key("body"));

		let errors = prepare(form("Jane", "not-an-email", "Hello"), None).unwrap_err();

		assert!(errors.field_errors().contains_key("email"));

		let errors = prepare(form("Jane", "jane@smith.com", ""), None).unwrap_err();

		assert!(errors.field_errors().contains_key("body"));

		let comment = prepare(form("Jane", "jane@smith.com", "Hello"), None).unwrap();

		assert_eq!(comment.name, "Jane");
		assert_eq!(comment.author_status, AuthorStatus::Anonymous);
	}

	#[test]
	fn test_account_overrides_identity() {
		let comment = prepare(form("Impostor", "", "Hello"), Some(&user(false))).unwrap();

		assert_eq!(comment.name, "john");
		assert_eq!(comment.email, "john@smith.com");
		assert_eq!(comment.author_status, AuthorStatus::User);

		let comment = prepare(form("", "", "Hello"), Some(&user(true))).unwrap();

		assert_eq!(comment.author_status, AuthorStatus::Staff);

		let errors = prepare(form("", "", ""), Some(&user(false))).unwrap_err();
		let errors = errors.field_errors();

		assert_eq!(errors.len(), 1);
		assert!(errors.contains_key("body"));
	}

	#[sqlx::test]
	async fn test_anonymous_comment(pool: Database) {
		let author = app(pool.clone());
		let visitor = app(pool);

		login(&author, "john").await;
		create_post(&author, "Hello", "World.", &[]).await;

		let response = visitor
			.post("/post/hello/")
			.json(&json!({ "body": "Nice post!" }))
			.await;

		assert_eq!(response.status_code(), 400);

		let detail = response.json::<Value>();

		assert_eq!(detail["detail"], true);
		assert_eq!(detail["post"]["slug"], "hello");
		assert_eq!(detail["errors"][0]["field"], "email");
		assert_eq!(detail["errors"][1]["field"], "name");

		let response = visitor
			.post("/post/hello/")
			.json(&json!({
				"name": "Jane",
				"email": "jane@smith.com",
				"body": "Nice post!",
			}))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/post/hello/");

		let detail = visitor.get("/post/hello/").await.json::<Value>();
		let comments = detail["comments"].as_array().unwrap();

		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0]["name"], "Jane");
		assert_eq!(comments[0]["author_status"], "anonymous");
		assert!(comments[0].get("email").is_none());
	}

	#[sqlx::test]
	async fn test_user_comment_uses_account(pool: Database) {
		let app = app(pool.clone());

		login_staff(&app, &pool, "admin").await;
		create_post(&app, "Hello", "World.", &[]).await;

		let response = app
			.post("/post/hello/")
			.json(&json!({ "name": "Someone else", "body": "First!" }))
			.await;

		assert_eq!(response.status_code(), 303);

		let (name, email, status) = sqlx::query_as::<_, (String, String, String)>(
			"SELECT name, email, author_status FROM comment",
		)
		.fetch_one(&pool)
		.await
		.unwrap();

		assert_eq!(name, "admin");
		assert_eq!(email, "admin@example.com");
		assert_eq!(status, "staff");
	}

	#[sqlx::test]
	async fn test_comment_on_unknown_post(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/post/nothing/")
			.json(&json!({
				"name": "Jane",
				"email": "jane@smith.com",
				"body": "Hello?",
			}))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_moderation(pool: Database) {
		let author = app(pool.clone());
		let staff = app(pool.clone());

		login(&author, "john").await;
		login_staff(&staff, &pool, "admin").await;
		create_post(&author, "Hello", "World.", &[]).await;

		author
			.post("/post/hello/")
			.json(&json!({ "body": "Spam" }))
			.await;
		author
			.post("/post/hello/")
			.json(&json!({ "body": "Ham" }))
			.await;

		let spam = sqlx::query_scalar::<_, i64>("SELECT id FROM comment WHERE body = 'Spam'")
			.fetch_one(&pool)
			.await
			.unwrap();

		let response = author
			.post(&format!("/comment/{spam}/moderate/"))
			.json(&json!({ "active": false }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = staff
			.post(&format!("/comment/{spam}/moderate/"))
			.json(&json!({ "active": false }))
			.await;

		assert_eq!(response.status_code(), 302);
		assert_eq!(response.header("location"), "/post/hello/");

		let detail = author.get("/post/hello/").await.json::<Value>();
		let comments = detail["comments"].as_array().unwrap();

		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0]["body"], "Ham");

		let response = staff
			.post("/comment/9999/moderate/")
			.json(&json!({ "active": true }))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
