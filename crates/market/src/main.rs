//! Librum market - peer-to-peer marketplace checkout backend.
//!
//! This binary serves the buyer-facing checkout API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON API only
//! - In-memory cart store and order ledger
//! - CoinGecko simple-price for fiat/crypto quoting
//! - Ethereum-style JSON-RPC provider for payment verification
//!
//! Authentication happens at the gateway; this binary trusts the
//! `x-buyer-id` header the gateway injects.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use librum_market::catalog::Catalog;
use librum_market::config::MarketConfig;
use librum_market::routes;
use librum_market::services::{
    ChainVerifier, CoinGeckoRates, EthRpcVerifier, RateSource,
};
use librum_market::state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = MarketConfig::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "librum_market=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rates: Arc<dyn RateSource> = Arc::new(
        CoinGeckoRates::new(&config.rate_oracle_url, config.external_timeout)
            .expect("Failed to build rate oracle client"),
    );
    let chain: Arc<dyn ChainVerifier> = Arc::new(
        EthRpcVerifier::new(config.chain_rpc_url.clone(), config.external_timeout)
            .expect("Failed to build chain RPC client"),
    );

    let addr = config.socket_addr();
    let state = AppState::new(config, Catalog::seeded(), rates, chain);

    let app = Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("market listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
