use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single account.
///
/// Use this when fetching from the database and returning to the client.
/// The `email` and `password` fields are not serialized to the client.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The username that is displayed to the public.
	pub username: String,
	/// Copied onto the user's comments, may be empty.
	#[serde(skip_serializing)]
	pub email: String,
	/// Argon2 hash of the password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// Staff accounts may edit and delete any post, and manage tags and comments.
	pub is_staff: bool,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The privilege of whoever performed an action, recorded on posts and
/// comments at the time they are saved.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AuthorStatus {
	#[default]
	Anonymous,
	User,
	Staff,
}

impl AuthorStatus {
	/// Derives the status of the acting account, `None` being an anonymous visitor.
	pub fn of(user: Option<&User>) -> Self {
		match user {
			Some(user) if user.is_staff => Self::Staff,
			Some(_) => Self::User,
			None => Self::Anonymous,
		}
	}
}
