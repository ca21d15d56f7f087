use std::sync::Arc;

use validator::ValidationError;

/// Longest stored file path, matching the `photo` column's form limit.
pub const MAX_PATH_LENGTH: usize = 100;

/// The public URL prefix stored files are served under, such as `/media/`.
#[derive(Debug, Clone)]
pub struct Media {
	prefix: Arc<str>,
}

impl Media {
	pub fn new(prefix: &str) -> Self {
		let prefix = if prefix.ends_with('/') {
			prefix.to_owned()
		} else {
			format!("{prefix}/")
		};

		Self {
			prefix: prefix.into(),
		}
	}

	/// The public URL of the file stored at `path`.
	pub fn url(&self, path: &str) -> String {
		format!("{}{path}", self.prefix)
	}
}

/// Validates a file path relative to the media root.
///
/// The path may not leave the media root or point at another host. An empty
/// path means no file.
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
	if path.chars().count() > MAX_PATH_LENGTH {
		let mut error = ValidationError::new("length");
		error.message = Some("The file path is too long.".into());

		return Err(error);
	}

	let escapes = path.starts_with('/')
		|| path.contains('\\')
		|| path.contains(':')
		|| path.chars().any(char::is_control)
		|| path.split('/').any(|part| part == "..");

	if escapes {
		let mut error = ValidationError::new("invalid_path");
		error.message = Some("The file must be inside the media directory.".into());

		return Err(error);
	}

	Ok(())
}
