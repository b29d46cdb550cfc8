//! GIFTECH admin HTTP server binary.
//!
//! Loads configuration, initializes the repository, sets up the HTTP router
//! and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # In-memory repository with defaults
//! cargo run --bin giftech-server
//!
//! # Explicit config file
//! GIFTECH_CONFIG=/etc/giftech/giftech.toml cargo run --bin giftech-server
//! ```
//!
//! # Environment Variables
//!
//! - `GIFTECH_CONFIG`: Path to the TOML config file (default: search `giftech.toml`)
//! - `HOST`: Server host, overrides `[server] host`
//! - `PORT`: Server port, overrides `[server] port`
//! - `ACCESS_GRANT_USER`, `ACCESS_GRANT_PASSWORD`: Access-grant service account
//! - `ACCESS_GRANT_SCRIPT_ID`: Script to grant, overrides `[access_grant] script_id`
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use giftech_admin::config::AppConfig;
use giftech_admin::db;
use giftech_admin::http::{create_router, AppState};
use giftech_admin::services::{init_session_cache, AccessGranter, HttpPlatformClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting GIFTECH admin server");

    let config = AppConfig::load()?;

    // Initialize global repository once and reuse it across the app
    db::init_repository(&config.repository)?;
    let repository = Arc::clone(db::get_repository()?);
    info!(backend = %config.repository.repo_type, "Repository initialized");

    let mut state = AppState::new(repository);
    if config.access_grant.is_configured() {
        let platform = Arc::new(HttpPlatformClient::from_settings(&config.access_grant)?);
        init_session_cache(platform.clone(), config.session.ttl());
        state = state.with_access_granter(Arc::new(AccessGranter::new(platform)));
        info!(
            base_url = %config.access_grant.base_url,
            ttl_minutes = config.session.ttl_minutes,
            "Access grants enabled"
        );
    } else {
        warn!("Access-grant credentials not configured; grant requests will return 503");
    }

    let app = create_router(state, config.server.body_limit_bytes());

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
