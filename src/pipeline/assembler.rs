/// Fan out over all devices and merge their readings
use futures_util::future::join_all;
use log::{error, info};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::time::Duration;

use crate::error::DashboardError;
use crate::models::{DeviceConfig, Reading, ResultSet};
use crate::pipeline::{deriver, fetcher};
use crate::registry::DeviceRegistry;
use crate::utils::{format_datetime, relative_freshness};

/// Builds a fresh result set per request from an injected registry
///
/// Holds no state between runs, so concurrent requests each read the stores
/// independently.
#[derive(Debug, Clone)]
pub struct Assembler {
    registry: Arc<DeviceRegistry>,
    fetch_timeout: Duration,
}

impl Assembler {
    pub fn new(registry: Arc<DeviceRegistry>, fetch_timeout: Duration) -> Self {
        Self {
            registry,
            fetch_timeout,
        }
    }

    /// Fetch, derive and label the latest reading of every device
    pub async fn assemble(&self) -> Result<ResultSet, DashboardError> {
        self.assemble_at(OffsetDateTime::now_utc()).await
    }

    /// Same as `assemble`, with freshness measured against `now`
    ///
    /// Fails if any device fails; the error names the failing device with the
    /// lowest id. A partial result set is never returned.
    pub async fn assemble_at(&self, now: OffsetDateTime) -> Result<ResultSet, DashboardError> {
        let results = join_all(
            self.registry
                .devices()
                .map(|device| self.reading_for(device, now)),
        )
        .await;

        let mut readings = results
            .into_iter()
            .collect::<Result<Vec<Reading>, DashboardError>>()
            .inspect_err(|e| error!("Loading sensor data failed: {}", e))?;

        readings.sort_by(|a, b| a.device_id.cmp(&b.device_id));

        info!(
            "Assembled {} readings at {}",
            readings.len(),
            format_datetime(&now)
        );

        Ok(readings)
    }

    async fn reading_for(
        &self,
        device: &DeviceConfig,
        now: OffsetDateTime,
    ) -> Result<Reading, DashboardError> {
        let raw = fetcher::fetch(device, self.fetch_timeout).await?;
        let mut reading = deriver::derive(&raw, device)?;
        reading.freshness_label = relative_freshness(&reading.observed_at, now);
        Ok(reading)
    }
}
