use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::AuthorStatus;

/// A comment left on a post.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The post the comment belongs to.
	#[serde(skip_deserializing)]
	pub post_id: i64,
	/// Taken from the account for logged in users.
	#[serde(default)]
	pub name: String,
	/// Taken from the account for logged in users. Never shown to visitors.
	// stored for moderators working on the database directly
	#[allow(dead_code)]
	#[serde(default, skip_serializing)]
	pub email: String,
	#[validate(length(min = 1, max = 2000))]
	#[serde(default)]
	pub body: String,
	/// Who wrote the comment, at the time it was written.
	#[serde(skip_deserializing)]
	pub author_status: AuthorStatus,
	/// Inactive comments are hidden by moderators.
	#[serde(skip_deserializing)]
	pub active: bool,
	/// The creation time of the comment.
	#[serde(skip_deserializing)]
	pub created: chrono::DateTime<chrono::Utc>,
}

/// A validated comment, ready to be saved.
#[derive(Debug, PartialEq, Eq)]
pub struct NewComment {
	pub name: String,
	pub email: String,
	pub body: String,
	pub author_status: AuthorStatus,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ModerateInput {
	/// Whether the comment is shown on its post.
	pub active: bool,
}
