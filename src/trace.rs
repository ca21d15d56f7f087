use std::time::Duration;

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		MeterProviderBuilder, PeriodicReader, SdkMeterProvider,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const METRICS_INTERVAL: Duration = Duration::from_secs(5);

/// Describes this service to the collector.
fn resource() -> Resource {
	let environment = if cfg!(debug_assertions) {
		"development"
	} else {
		"production"
	};

	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(DEPLOYMENT_ENVIRONMENT, environment),
		],
		SCHEMA_URL,
	)
}

/// Log level from `RUST_LOG`, defaulting to `info`.
fn env_filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn meter_provider(endpoint: &str) -> Result<SdkMeterProvider, opentelemetry::metrics::MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.with_endpoint(endpoint)
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(METRICS_INTERVAL)
		.build();

	let provider = MeterProviderBuilder::default()
		.with_resource(resource())
		.with_reader(reader)
		.build();

	global::set_meter_provider(provider.clone());

	Ok(provider)
}

fn tracer(endpoint: &str) -> Result<Tracer, opentelemetry::trace::TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::AlwaysOn)
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(
			opentelemetry_otlp::new_exporter()
				.tonic()
				.with_endpoint(endpoint),
		)
		.install_batch(runtime::Tokio)
}

/// Initializes the global tracing subscriber.
///
/// Logs always go to stdout, filtered by `RUST_LOG`. With an OTLP `endpoint`,
/// spans and metrics are exported there too and the returned guard shuts the
/// exporters down when dropped. A collector that cannot be set up is logged
/// and otherwise ignored.
pub fn init_tracing_subscriber(endpoint: Option<&str>) -> Option<OtelGuard> {
	let registry = tracing_subscriber::registry()
		.with(env_filter())
		.with(fmt::layer().with_ansi(true));

	let Some(endpoint) = endpoint else {
		registry.init();
		return None;
	};

	let meter_provider = match meter_provider(endpoint) {
		Ok(provider) => provider,
		Err(error) => {
			registry.init();
			tracing::error!(%error, endpoint, "failed to set up metrics export");
			return None;
		}
	};

	let tracer = match tracer(endpoint) {
		Ok(tracer) => tracer,
		Err(error) => {
			registry.init();
			tracing::error!(%error, endpoint, "failed to set up trace export");
			return None;
		}
	};

	registry
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(tracer))
		.init();

	tracing::info!(endpoint, "exporting telemetry");

	Some(OtelGuard { meter_provider })
}

/// Flushes and shuts down the exporters.
pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(err) = self.meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		global::shutdown_tracer_provider();
	}
}
