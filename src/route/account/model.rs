use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username
		.chars()
		.any(|c| !c.is_alphanumeric() && !"@.+-_".contains(c))
	{
		let mut error = ValidationError::new("invalid_username");
		error.message =
			Some("Letters, digits and the characters @ . + - _ only.".into());

		return Err(error);
	}

	Ok(())
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct SignupInput {
	/// The username that is displayed to the public.
	#[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
	pub username: String,
	/// Copied onto the user's comments.
	#[validate(email)]
	#[serde(default)]
	pub email: Option<String>,
	#[validate(length(min = 8, max = 128))]
	pub password1: String,
	/// Must repeat `password1`.
	pub password2: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(length(min = 1, max = 150))]
	pub username: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginQuery {
	/// Where to go once logged in. Only paths on this site are followed.
	pub next: Option<String>,
}

impl LoginQuery {
	/// The page to redirect to after logging in.
	pub fn target(&self) -> &str {
		match self.next.as_deref() {
			Some(next) if is_local_path(next) => next,
			_ => "/",
		}
	}
}

/// Whether `next` stays on this site. Browsers read `\` like `/`, so `/\host`
/// is as much a link to another host as `//host`.
fn is_local_path(next: &str) -> bool {
	let mut chars = next.chars();

	chars.next() == Some('/')
		&& !matches!(chars.next(), Some('/' | '\\'))
		&& !next.chars().any(char::is_control)
}

/// What the signup and login pages need to render their form.
#[derive(Debug, Serialize, JsonSchema)]
pub struct FormPage {
	/// The fields the form submits.
	pub fields: &'static [&'static str],
	#[serde(skip_serializing_if = "Option::is_none")]
	pub next: Option<String>,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::{LoginQuery, SignupInput};

	fn signup(username: &str) -> SignupInput {
		SignupInput {
			username: username.into(),
			email: None,
			password1: "hunter2hunter".into(),
			password2: "hunter2hunter".into(),
		}
	}

	#[test]
	fn test_username_characters() {
		assert!(signup("john.smith+blog@home_1-2").validate().is_ok());
		assert!(signup("Иван").validate().is_ok());
		assert!(signup("john smith").validate().is_err());
		assert!(signup("").validate().is_err());
	}

	#[test]
	fn test_login_target() {
		let target = |next: Option<&str>| {
			LoginQuery {
				next: next.map(Into::into),
			}
			.target()
			.to_owned()
		};

		assert_eq!(target(None), "/");
		assert_eq!(target(Some("/post/new/")), "/post/new/");
		assert_eq!(target(Some("//evil.com/")), "/");
		assert_eq!(target(Some("https://evil.com/")), "/");
		assert_eq!(target(Some("/\\evil.com/")), "/");
		assert_eq!(target(Some("/\tevil.com/")), "/");
		assert_eq!(target(Some("/post/a\\b/")), "/post/a\\b/");
	}
}
