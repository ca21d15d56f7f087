use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A category that posts can be filed under.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Tag {
	/// The unique identifier of the tag.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the tag. Its slug must not be taken by another tag.
	#[validate(
		length(min = 1, max = 50),
		custom(function = "crate::slug::validate_title")
	)]
	pub title: String,
	/// The lowercased, normalized title.
	#[serde(skip_deserializing)]
	pub slug: String,
	/// The account that created the tag, if it still exists.
	#[serde(skip)]
	pub author_id: Option<Uuid>,
}

/// Every tag, ordered by title.
#[derive(Debug, Serialize, JsonSchema)]
pub struct TagList {
	pub tags: Vec<Tag>,
}

/// Asks for confirmation before deleting a tag.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DeletePage {
	pub tag: Tag,
	/// The username of whoever created the tag, if the account still exists.
	pub author: Option<String>,
	/// How many posts will lose the tag.
	pub posts: i64,
}

/// The tag being edited.
#[derive(Debug, Serialize, JsonSchema)]
pub struct TagFormPage {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag: Option<Tag>,
}
