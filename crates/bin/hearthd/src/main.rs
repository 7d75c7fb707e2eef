//! # hearthd — hearth daemon
//!
//! Composition root that wires the control core together and starts the
//! server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the tracing subscriber
//! - Seed the default home devices
//! - Construct the hub and spawn the scheduler ticker
//! - Build the axum router and serve
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use hearth_adapter_http_axum::state::AppState;
use hearth_app::hub::Hub;
use hearth_app::registry::DeviceRegistry;
use hearth_domain::device::{Device, DeviceKind};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    // Device registry, optionally seeded with the default home.
    let registry = Arc::new(DeviceRegistry::new());
    if config.home.seed_defaults {
        registry.register(Device::new("Living Room Light", DeviceKind::Light))?;
        registry.register(Device::new("Bedroom Thermostat", DeviceKind::Thermostat))?;
        registry.register(Device::new("Front Door Camera", DeviceKind::SecurityCamera))?;
        tracing::info!("seeded default home devices");
    }

    // Hub and scheduler ticker.
    let hub = Arc::new(Hub::new(registry));
    let ticker = hub.spawn_ticker(Duration::from_secs(config.scheduler.tick_seconds));

    // HTTP
    let app = hearth_adapter_http_axum::router::build(AppState::new(Arc::clone(&hub)));

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "hearthd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    Ok(())
}

async fn shutdown_signal() {
    // SIGINT is enough for the supported platforms; the ticker task is
    // aborted after the server drains.
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown handler");
    }
}
