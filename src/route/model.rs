use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of posts on every listing page.
pub const PAGE_SIZE: i64 = 3;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
pub(crate) fn one() -> i64 {
	1
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1))]
	#[serde(default = "one")]
	pub page: i64,
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * PAGE_SIZE
	}

	pub fn limit(&self) -> i64 {
		PAGE_SIZE
	}

	/// Returns `false` if the page lies past the last page of `count` items.
	/// The first page always exists, even when there is nothing on it.
	pub fn exists(&self, count: i64) -> bool {
		self.page <= num_pages(count)
	}
}

fn num_pages(count: i64) -> i64 {
	((count + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
}

/// One page of a listing.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// The current page number (1-indexed).
	pub page: i64,
	pub num_pages: i64,
	/// Total number of items across every page.
	pub count: i64,
	pub has_next: bool,
	pub has_previous: bool,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, paginate: &Paginate, count: i64) -> Self {
		let num_pages = num_pages(count);

		Self {
			items,
			page: paginate.page,
			num_pages,
			count,
			has_next: paginate.page < num_pages,
			has_previous: paginate.page > 1,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SlugPath {
	#[validate(length(min = 1, max = 255))]
	pub slug: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdPath {
	pub id: i64,
}

#[cfg(test)]
mod test {
	use super::{Page, Paginate};

	#[test]
	fn test_paginate_offset() {
		let mut paginate = Paginate { page: 1 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 3);

		paginate.page = 4;

		assert_eq!(paginate.offset(), 9);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = Paginate { page: 1 };

		assert_eq!(paginate.limit(), 3);
	}

	#[test]
	fn test_paginate_exists() {
		assert!(Paginate { page: 1 }.exists(0));
		assert!(Paginate { page: 2 }.exists(4));
		assert!(!Paginate { page: 2 }.exists(3));
		assert!(!Paginate { page: 3 }.exists(4));
	}

	#[test]
	fn test_page_flags() {
		let page = Page::new(vec![1, 2, 3], &Paginate { page: 1 }, 4);

		assert_eq!(page.num_pages, 2);
		assert!(page.has_next);
		assert!(!page.has_previous);

		let page = Page::new(vec![4], &Paginate { page: 2 }, 4);

		assert!(!page.has_next);
		assert!(page.has_previous);

		let page = Page::<i64>::new(Vec::new(), &Paginate { page: 1 }, 0);

		assert_eq!(page.num_pages, 1);
		assert!(!page.has_next);
	}
}
