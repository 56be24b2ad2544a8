//! recovery-desk: REST server for complaint and shipment records.
//!
//! Usage:
//!   recovery-desk --config desk.json
//!   recovery-desk --db desk.db --port 5000

use anyhow::Result;
use recovery_desk_core::{DeskConfig, DeskStore, SystemClock};
use recovery_desk_server::{desk_router, AppState};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = arg_value(&args, "--config");
    let mut config = DeskConfig::from_env(config_path)?;
    if let Some(db) = arg_value(&args, "--db") {
        config.database_path = db.to_string();
    }
    config.port = parse_arg(&args, "--port", config.port);

    log::info!("recovery-desk {}", env!("CARGO_PKG_VERSION"));
    log::info!("  db:      {}", config.database_path);
    log::info!("  listen:  {}", config.listen_addr());
    log::info!("  origins: {}", config.allowed_origins.join(", "));

    let store = Arc::new(DeskStore::open_migrated(&config.database_path)?);
    let addr = config.listen_addr();
    let state = AppState::new(store, Arc::new(SystemClock), config);
    let app = desk_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
