//! ariadne-resolver: OpenURL link resolver HTTP service
//!
//! Serves `GET /v0/?<openurl>` and `GET /healthcheck`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use ariadne_common::config::ResolverConfig;
use ariadne_common::logging::init_tracing;
use ariadne_resolver::cli::ConfigArgs;
use ariadne_resolver::{build_router, AppState, Resolver};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for ariadne-resolver
#[derive(Parser, Debug)]
#[command(name = "ariadne-resolver")]
#[command(about = "OpenURL link resolver backed by SFX and Primo")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ResolverConfig::resolve(&args.config.overrides(args.port))
        .context("Failed to resolve configuration")?;

    init_tracing(config.log_level);

    info!(
        "Starting Ariadne resolver (ariadne-resolver) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Coverage service: {}", config.coverage_url);
    info!("Catalog service: {} (institution {})", config.catalog_url, config.catalog_institution);
    info!("Upstream timeout: {}s", config.upstream_timeout.as_secs());

    let resolver = Resolver::new(&config).context("Failed to initialize resolver")?;
    let app = build_router(AppState::new(resolver));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("ariadne-resolver listening on http://{}", addr);
    info!("Health check: http://{}/healthcheck", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
