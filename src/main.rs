//! finchat - chat assistant backend for the finance dashboard
//!
//! Drives the dashboard's chat screen: an append-only message log with a
//! simulated assistant that answers each message after a short delay.

mod api;
mod config;
mod replies;
mod runtime;
mod state_machine;
mod store;

use api::{create_router, AppState};
use config::ChatConfig;
use replies::CannedReplies;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finchat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env()?;
    tracing::info!(
        port = config.port,
        reply_delay_ms = u64::try_from(config.reply_delay.as_millis()).unwrap_or(u64::MAX),
        max_input_chars = config.max_input_chars,
        "Configuration loaded"
    );

    let port = config.port;
    let state = AppState::new(config, CannedReplies::default());
    let manager = state.manager.clone();

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("finchat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    manager.shutdown();
    Ok(())
}
