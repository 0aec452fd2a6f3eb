use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use web::config::Config;
use web::routes::build_router;
use web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume web v{}", env!("CARGO_PKG_VERSION"));

    if config.backend_configured {
        info!("Backend: {}", config.backend_url);
    } else {
        info!("Backend: {} (default)", config.backend_url);
    }
    info!("Identity portal: {}", config.portal_url());
    if config.flags.debug_printer {
        warn!("FLAG_DEBUG_PRINTER is set: server-only procedures are reachable over the network");
    }

    let state = AppState::from_config(config.clone())?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_URL once the SPA is served from it

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
