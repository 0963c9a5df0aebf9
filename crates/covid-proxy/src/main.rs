//! covid-proxy: thin REST facade over the RapidAPI covid-193 statistics API.
//!
//! SETUP:
//! 1. Export your RapidAPI key (or put it in a .env file next to the binary):
//!    $ export RAPID_API_KEY=...
//!
//! 2. Optionally create /etc/covid-proxy/config.toml (or point
//!    COVID_PROXY_CONFIG elsewhere) to change the listen address, the
//!    upstream endpoint, the timeout or outbound proxies.
//!
//! 3. Build and run:
//!    $ cargo run --release
//!
//! ENDPOINTS:
//! - GET  /             liveness
//! - GET  /countryList  every country name known upstream
//! - POST /data         {"country": "...", "date": "YYYY-MM-DD"} -> per-country figures
//! - GET  /all          current deaths/active figures for every country

use std::path::Path;

use covid_proxy::{
    config::{load_dotenv_from, Config},
    state::AppState,
};
use tokio::signal;
use tracing::info;

/// Main entry point for the proxy server
#[tokio::main]
async fn main() {
    // Loaded before logging so RUST_LOG may come from it; reported after.
    let dotenv = load_dotenv_from(Path::new(".env"));

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covid_proxy=debug,tower_http=debug".into()),
        )
        .init();

    if let Err(e) = dotenv {
        tracing::warn!("Ignoring unreadable .env file: {}", e);
    }

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    info!("Starting proxy server on {}", config.listen_addr());
    info!("Forwarding requests to: {}", config.upstream.endpoint);

    let addr = config.listen_addr();
    let state = AppState::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Failed to create HTTP client: {}", e);
        std::process::exit(1);
    });

    let app = covid_proxy::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });

    info!("Proxy server listening on {}", addr);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Proxy server stopped");
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
