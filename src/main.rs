//! Pro Price Stream - Price Feed Daemon
//!
//! Keeps a live subscription to the configured price stream and serves the
//! latest prices, connection status and metrics over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pro_price_stream::{Config, PriceReader, PriceStreamClient, StreamMetrics, StreamStatus};

/// Shared state of the HTTP handlers
#[derive(Clone)]
struct AppState {
    reader: PriceReader,
    status: watch::Receiver<StreamStatus>,
    metrics: Arc<StreamMetrics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting Pro Price Stream");

    // Load configuration
    let config = Config::load()?;
    info!(symbols = ?config.symbols, url = %config.ws_url, "Configuration loaded");

    let client = PriceStreamClient::spawn(&config)?;
    client.connect();

    let state = AppState {
        reader: client.reader(),
        status: client.watch_status(),
        metrics: client.metrics(),
    };

    // Start health check server
    let health_state = state.clone();
    let port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_state, port).await {
            warn!(error = %e, "Health server error");
        }
    });

    // Periodic status log
    let interval = Duration::from_secs(config.status_log_interval_secs.max(1));
    tokio::spawn(log_status(state, interval));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    client.shutdown().await?;
    info!("Price stream stopped");

    Ok(())
}

/// Start HTTP server for health checks, prices and metrics
async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/prices", get(all_prices))
        .route("/prices/:symbol", get(price_for))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_status(state: AppState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let status = state.status.borrow().clone();
        info!(
            state = ?status.state,
            attempt = status.attempt,
            acknowledged = status.acknowledged,
            error = ?status.error,
            symbols = state.reader.len(),
            last_update = ?state.reader.last_update(),
            "Stream status"
        );
        for snapshot in state.reader.all_prices() {
            info!(
                symbol = %snapshot.symbol,
                price = %snapshot.price,
                change_24h = %snapshot.change_24h,
                "Cached price"
            );
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.status.borrow().clone();
    let health = if status.is_connected() { "healthy" } else { "degraded" };
    Json(serde_json::json!({
        "status": health,
        "component": "price-stream",
        "connection": status,
        "symbols": state.reader.len(),
        "lastUpdate": state.reader.last_update().map(|t| t.to_rfc3339()),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn all_prices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.reader.all_prices())
}

async fn price_for(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    match state.reader.price_data(&symbol) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no price for {symbol}")).into_response(),
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => body.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
