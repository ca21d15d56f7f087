use validator::ValidationError;

/// Slug taken by the creation routes (`/post/new/`, `/tag/new/`).
pub const RESERVED: &str = "new";

/// Normalizes a title into its slug.
///
/// Non-ASCII text is transliterated (`Привет мир` becomes `privet-mir`), the
/// result is lowercased and every run of other characters becomes a single `-`.
pub fn normalize(title: &str) -> String {
	::slug::slugify(title).to_lowercase()
}

/// Validates that a title normalizes to a usable slug.
///
/// Uniqueness depends on the table the slug is stored in and is checked by
/// the routes instead.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
	let slug = normalize(title);

	if slug.is_empty() {
		let mut error = ValidationError::new("empty_slug");
		error.message = Some("The title must contain at least one letter or digit.".into());

		return Err(error);
	}

	if slug == RESERVED {
		let mut error = ValidationError::new("reserved_slug");
		error.message = Some("This title is reserved, please choose another one.".into());

		return Err(error);
	}

	Ok(())
}
