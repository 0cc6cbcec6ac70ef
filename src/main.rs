mod config;
mod database;
mod error;
mod models;
mod pipeline;
mod registry;
mod store;
mod utils;
mod web;

use log::{error, info};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::time::Duration;

use config::SensorConfig;
use database::{connect, PostgresStore};
use pipeline::Assembler;
use registry::DeviceRegistry;
use utils::format_datetime;
use web::{build_router, AppState};

/// Open one store per configured sensor
///
/// A sensor whose store cannot be reached at startup is fatal; later failures
/// surface per request instead.
async fn open_registry(config: &SensorConfig) -> Result<DeviceRegistry, Box<dyn std::error::Error>> {
    let mut registry = DeviceRegistry::new();

    for (sensor_id, name) in &config.tags {
        let client = connect(&config.database_url)
            .await
            .map_err(|e| format!("Failed to open store for {}: {}", sensor_id, e))?;
        let store = PostgresStore::new(client, &config.database_url, &config.table, sensor_id);
        registry = registry.with_device(sensor_id.as_str(), name.as_str(), Arc::new(store));
        info!("Opened store for {} ({})", name, sensor_id);
    }

    info!("{} sensor stores ready", registry.len());
    Ok(registry)
}

async fn serve(config: SensorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = open_registry(&config).await?;
    let assembler = Assembler::new(
        Arc::new(registry),
        Duration::from_secs(config.fetch_timeout_secs),
    );

    let state = AppState {
        assembler,
        refresh_interval_secs: config.refresh_interval_secs,
    };
    let app = build_router(state, &config.static_dir);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("Server is running on http://{}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    info!(
        "Starting sensor dashboard at {}",
        format_datetime(&OffsetDateTime::now_utc())
    );

    // Load configuration
    let config = match SensorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Run the server or wait for shutdown signal
    tokio::select! {
        result = serve(config) => {
            if let Err(e) = result {
                error!("Fatal error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
