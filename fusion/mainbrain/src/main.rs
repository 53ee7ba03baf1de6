//! Thin orchestration binary: wires the downstream broadcast server and the
//! upstream tracking client into the tracking coordinator, then blocks on
//! an interactive stop signal. No CLI flags, no domain logic of its own —
//! it reads `Config` from the environment and gets out of the way.

mod callbacks;
mod config;
mod error;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use bearing_bus::{DataClient, DataServer};
use bearing_track::TrackingCoordinator;

use callbacks::UpstreamCallbacks;
use config::Config;
use error::MainbrainError;

#[tokio::main]
async fn main() -> Result<(), MainbrainError> {
    let _logging_guard = env_tracing_logger::init();
    let config = Config::from_env();
    tracing::info!(?config, "starting");

    let server = DataServer::start(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "downstream broadcast server listening");

    let coordinator = Arc::new(TrackingCoordinator::new(server.clone()));
    let callbacks = UpstreamCallbacks::new(coordinator.clone());
    let client = DataClient::start(&config.upstream_addr, callbacks).await?;
    tracing::info!(addr = %config.upstream_addr, "connected to upstream tracker");

    wait_for_stop_signal().await?;

    tracing::info!("stop signal received, shutting down");
    client.stop().await;
    server.stop().await;

    Ok(())
}

async fn wait_for_stop_signal() -> Result<(), MainbrainError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines.next_line().await?;
    Ok(())
}
