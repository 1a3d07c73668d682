//! fhir-server: FHIR metadata server binary entrypoint.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir_server::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env();

    let provider = fhir_server::load_provider(&config).inspect_err(|e| {
        tracing::error!(
            error = %e,
            bindings_file = config.bindings_file.as_deref().unwrap_or("-"),
            "Binding registry rejected"
        );
    })?;

    tracing::info!(
        resources = provider.resource_count(),
        operations = ?provider.operation_names(),
        cache = config.capability_cache,
        publisher = config.publisher.as_deref().unwrap_or("-"),
        base = config.server_base_url.as_deref().unwrap_or("<from request>"),
        "Capability statement provider ready"
    );

    let app = fhir_server::build_app(provider, &config);

    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Serving /metadata");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            tracing::info!(signal, "Draining in-flight metadata requests");
        })
        .await?;

    tracing::info!("Metadata server stopped");
    Ok(())
}

/// Resolve with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = tokio::signal::ctrl_c() => "SIGINT",
                _ = sigterm.recv() => "SIGTERM",
            },
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl+C"
    }
}
