#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod media;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod slug;
#[cfg(test)]
mod test;
mod trace;

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{Extension, Router};
use sqlx::sqlite::SqliteConnectOptions;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub use error::AppError;

pub type Database = sqlx::Pool<sqlx::Sqlite>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the database connection pool and the password hasher.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub media: media::Media,
}

/// Builds the full application router, including the `OpenAPI` document.
///
/// Rate limiting is left to the caller since it depends on the peer address,
/// which only exists behind a real listener.
pub fn app(state: State) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();

	route::routes()
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(config.otlp_endpoint.as_deref());

	let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
	let database = Database::connect_with(options).await?;

	sqlx::migrate!().run(&database).await?;

	let state = State {
		database,
		hasher: Argon2::default(),
		media: media::Media::new(&config.media_url),
	};

	if let Some(admin) = &config.admin {
		route::account::ensure_admin(&state, &admin.username, &admin.password).await?;
	}

	let app = app(state).layer(ratelimit::layer());

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!("listening on {}", listener.local_addr()?);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
