pub use crate::route::model::{Page, Paginate};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
	error::Message,
	media::Media,
	model::AuthorStatus,
	route::{comment::model::Comment, model::one, tag::model::Tag},
};

#[inline]
fn yes() -> bool {
	true
}

/// A single post, written by a user.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	pub id: i64,
	pub title: String,
	/// The normalized title, unique across posts.
	pub slug: String,
	pub body: String,
	#[serde(skip)]
	pub author_id: Uuid,
	/// The username of the author.
	pub author: String,
	/// The creation time of the post.
	pub created: chrono::DateTime<chrono::Utc>,
	/// Unpublished posts never show up in listings.
	pub published: bool,
	/// Whether the author was staff when the post was last saved.
	pub author_status: AuthorStatus,
	/// The photo's path relative to the media root.
	pub photo: Option<String>,
	/// The public URL of the photo.
	#[sqlx(skip)]
	pub photo_url: Option<String>,
	/// The tags of the post, ordered by title.
	#[sqlx(skip)]
	pub tags: Vec<Tag>,
}

/// The submitted fields of a post.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostForm {
	/// The title of the post. Its slug must not be taken by another post.
	#[validate(
		length(min = 1, max = 200),
		custom(function = "crate::slug::validate_title")
	)]
	pub title: String,
	#[validate(length(min = 1))]
	pub body: String,
	/// Defaults to `true`.
	#[serde(default = "yes")]
	pub published: bool,
	/// The ids of the post's tags, replacing any previous ones.
	#[serde(default)]
	pub tags: Vec<i64>,
	/// A path relative to the media root, such as `photos/cat.jpg`. Leaving
	/// it out removes the photo.
	#[validate(custom(function = "crate::media::validate_path"))]
	#[serde(default)]
	pub photo: Option<String>,
}

impl PostForm {
	/// The photo path to store, if any.
	pub fn photo(&self) -> Option<&str> {
		self.photo.as_deref().filter(|path| !path.is_empty())
	}
}

impl Post {
	/// Fills in [`Post::photo_url`] from the stored photo path.
	pub fn resolve_photo(&mut self, media: &Media) {
		self.photo_url = self.photo.as_deref().map(|path| media.url(path));
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// Case-insensitive text to find in the title or body.
	pub search: Option<String>,
	/// The page number to return (1-indexed).
	#[validate(range(min = 1))]
	#[serde(default = "one")]
	pub page: i64,
}

impl SearchInput {
	/// The search term, if one was given.
	pub fn term(&self) -> Option<&str> {
		self.search
			.as_deref()
			.map(str::trim)
			.filter(|term| !term.is_empty())
	}

	pub fn paginate(&self) -> Paginate {
		Paginate { page: self.page }
	}
}

/// A page of posts, along with the filter that selected them.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostListing {
	#[serde(flatten)]
	pub page: Page<Post>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub search: Option<String>,
	/// Set when listing the posts of a tag.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tag: Option<Tag>,
	/// Set when listing the posts of an author.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub author: Option<String>,
}

/// A post along with its active comments.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetail {
	pub post: Post,
	/// Active comments, oldest first.
	pub comments: Vec<Comment>,
	/// Set when rendering a rejected comment submission.
	pub detail: bool,
	/// Whether the visitor may edit or delete the post.
	pub can_edit: bool,
	/// Why the comment was rejected.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<Message<'static>>,
}

/// Everything the create and edit pages need to render the post form.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostFormPage {
	/// The post being edited, absent when creating one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub post: Option<Post>,
	/// Every tag that can be attached to the post.
	pub tags: Vec<Tag>,
}

/// Asks for confirmation before deleting a post.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DeletePage {
	pub post: Post,
}

#[cfg(test)]
mod test {
	use super::SearchInput;

	fn search(term: Option<&str>) -> SearchInput {
		SearchInput {
			search: term.map(Into::into),
			page: 1,
		}
	}

	#[test]
	fn test_search_term_is_trimmed() {
		assert_eq!(search(Some("  rust ")).term(), Some("rust"));
		assert_eq!(search(Some("   ")).term(), None);
		assert_eq!(search(None).term(), None);
	}
}
