use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError, GovernorLayer,
};

/// Requests replenished per second, per peer address.
const PER_SECOND: u64 = 5;
/// Requests a peer may make in a quick burst before being limited.
const BURST_SIZE: u32 = 30;
/// How often state for idle peers is dropped.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

type PeerConfig = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Limits every route by the peer's address and starts pruning idle peers
/// in the background. Requires the router to be served with
/// `into_make_service_with_connect_info`.
pub fn layer() -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
	let config = GovernorConfigBuilder::default()
		.per_second(PER_SECOND)
		.burst_size(BURST_SIZE)
		.use_headers()
		.error_handler(too_many_requests)
		.finish()
		.map(Arc::new)
		.expect("rate limit period and burst size are non-zero");

	prune_idle_peers(&config);

	GovernorLayer { config }
}

fn too_many_requests(error: GovernorError) -> Response<Body> {
	crate::AppError::from(error).into_response()
}

fn prune_idle_peers(config: &Arc<PeerConfig>) {
	let limiter = config.limiter().clone();

	std::thread::spawn(move || loop {
		std::thread::sleep(PRUNE_INTERVAL);

		tracing::debug!(peers = limiter.len(), "pruning rate limiter");
		limiter.retain_recent();
	});
}
