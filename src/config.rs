use std::env;

/// An error raised while reading the configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be a number")]
	NotANumber(&'static str),
	#[error("ADMIN_USERNAME and ADMIN_PASSWORD must be set together")]
	PartialAdmin,
}

/// A staff account created at startup when it does not exist yet.
#[derive(Debug)]
pub struct Admin {
	pub username: String,
	pub password: String,
}

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug)]
pub struct Config {
	pub database_url: String,
	pub host: String,
	pub port: u16,
	/// The public URL prefix of stored files, such as post photos.
	pub media_url: String,
	/// When set, traces and metrics are exported to this OTLP collector.
	pub otlp_endpoint: Option<String>,
	pub admin: Option<Admin>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		let port = env::var("PORT").map_or(Ok(3000), |port| {
			port.parse().map_err(|_| Error::NotANumber("PORT"))
		})?;

		let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
			(Ok(username), Ok(password)) => Some(Admin { username, password }),
			(Err(_), Err(_)) => None,
			_ => return Err(Error::PartialAdmin),
		};

		Ok(Self {
			database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://blog.db".into()),
			host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
			port,
			media_url: env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".into()),
			otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
			admin,
		})
	}
}
