/// Pull the latest raw sample for a single device
use log::debug;
use tokio::time::{timeout, Duration};

use crate::error::{DashboardError, StoreError};
use crate::models::{DeviceConfig, RawSample};

/// Fetch the most recent sample from `device`'s store
///
/// One read, no retries. Empty stores, query errors, and reads that exceed
/// `fetch_timeout` are all reported as `StoreUnavailable` for this device.
pub async fn fetch(
    device: &DeviceConfig,
    fetch_timeout: Duration,
) -> Result<RawSample, DashboardError> {
    let result = match timeout(fetch_timeout, device.store.latest_sample()).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(fetch_timeout.as_secs())),
    };

    match result {
        Ok(sample) => {
            debug!(
                "Received data from {}: temp={} humidity={} battery={}% at {}",
                device.id,
                sample.temperature_raw,
                sample.humidity_raw,
                sample.battery_percent,
                sample.observed_at
            );
            Ok(sample)
        }
        Err(reason) => Err(DashboardError::StoreUnavailable {
            device_id: device.id.clone(),
            reason,
        }),
    }
}
