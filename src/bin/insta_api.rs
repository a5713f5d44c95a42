//! Instagram Analytics Dashboard API Server
//!
//! JSON backend for the dashboard front-end: hashtag search, metrics,
//! AI content analysis and bookmarks.
//!
//! Usage:
//!   cargo run --bin insta_api
//!
//! Environment:
//!   INSTA_PORT  - Server port (default: 8080, `PORT` takes precedence)
//!   INSTA_HOST  - Server host (default: 0.0.0.0)
//!   DEBUG_MODE  - `true` for debug logging
//!   plus every variable of the `.env` template

use insta_analytics::api::{create_router, AppState};
use insta_analytics::core::{BookmarkStore, SecretsStore};
use insta_analytics::models::{parse_bool, AppConfig};
use insta_analytics::utils::constants::{APP_NAME, APP_VERSION, BOOKMARKS_FILE, ENV_DEBUG_MODE};
use insta_analytics::TelemetryCollector;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// How often expired search results are purged
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // DEBUG_MODE decides the log level, so peek at it before full config load
    let _ = dotenvy::dotenv();
    let debug = std::env::var(ENV_DEBUG_MODE)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(false);

    FmtSubscriber::builder()
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env();
    info!("⚙️ {:?}", config);

    let secrets = Arc::new(SecretsStore::from_env(config.ai_provider));
    let missing = secrets.missing_keys();
    if missing.is_empty() {
        info!("🔑 All required API keys configured");
    } else {
        warn!("⚠️ Missing API keys: {} (demo data / fallback analysis will be used)", missing.join(", "));
    }

    let bookmarks = match BookmarkStore::open(BOOKMARKS_FILE) {
        Ok(store) => store,
        Err(e) => {
            warn!("⚠️ {} - bookmarks kept in memory only", e);
            BookmarkStore::in_memory()
        }
    };

    let telemetry = Arc::new(TelemetryCollector::new());
    let telemetry_for_shutdown = telemetry.clone();

    let state = Arc::new(AppState::new(config, secrets, bookmarks, telemetry));
    state.start_cleanup_task(CACHE_CLEANUP_INTERVAL);
    info!("🧹 Background cache cleanup every {}s", CACHE_CLEANUP_INTERVAL.as_secs());

    let app = create_router(state);

    // PORT (PaaS convention) beats INSTA_PORT for local dev
    let host = std::env::var("INSTA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("INSTA_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 {} API v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /v1/health                 - Health check");
    info!("  GET  /v1/status                 - API key / connection status");
    info!("  GET  /v1/settings               - UI settings and filter options");
    info!("  GET  /v1/hashtags               - Hashtag presets");
    info!("  POST /v1/posts/search           - Search posts by hashtag");
    info!("  POST /v1/analyze                - AI content analysis");
    info!("  GET  /v1/bookmarks              - Bookmarked posts");
    info!("  POST /v1/bookmarks/:id/toggle   - Toggle a bookmark");
    info!("  GET  /v1/stats                  - Usage statistics");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = telemetry_for_shutdown.get_stats();
    info!("   Searches: {}", stats.total_searches);
    info!("   AI analyses: {}", stats.ai_analyses);

    match telemetry_for_shutdown.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 {} API shutdown complete", APP_NAME);
    Ok(())
}
