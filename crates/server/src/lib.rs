//! fhir-server library crate
//!
//! Exposes `build_app`, `load_provider` and `config` for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod address;
pub mod config;
pub mod conformance;
mod error;
mod middleware;
pub mod response;
mod routes;

use std::sync::Arc;

use axum::{Extension, Router, middleware as axum_mw, routing::get};
use fhir_core::{FhirError, ResourceCatalog, ServerConfiguration};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use address::ServerAddressStrategy;
use config::Config;
use conformance::CapabilityStatementProvider;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<CapabilityStatementProvider>,
    pub address: ServerAddressStrategy,
}

/// Load the binding registry named by the configuration and wrap it in a
/// capability provider.
pub fn load_provider(config: &Config) -> Result<CapabilityStatementProvider, FhirError> {
    let registry = match &config.bindings_file {
        Some(path) => {
            tracing::info!(path = %path, "Loading binding registry");
            ServerConfiguration::from_json_file(path)?
        }
        None => {
            tracing::warn!("BINDINGS_FILE not set, serving an empty binding registry");
            ServerConfiguration::default()
        }
    };

    Ok(
        CapabilityStatementProvider::new(registry, ResourceCatalog::r4b())?
            .with_cache(config.capability_cache)
            .with_publisher(config.publisher.clone()),
    )
}

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(provider: CapabilityStatementProvider, config: &Config) -> Router {
    let state = AppState {
        provider: Arc::new(provider),
        address: config.address_strategy(),
    };

    // Install Prometheus metrics recorder.
    // Use build_recorder() + set_global_recorder() so that repeated calls
    // (e.g. in integration tests) don't panic; the second install is
    // silently ignored and we still get a valid handle for /metrics.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    // Build CORS layer
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route(
            "/OperationDefinition/{id}",
            get(routes::operation_definition::read),
        )
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle))
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
