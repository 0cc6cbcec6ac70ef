/// Read-side database operations for the per-device reading stores
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::debug;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio_postgres::{Client, Row};

use crate::database::connection::{connect, ClientSlot};
use crate::error::StoreError;
use crate::models::RawSample;
use crate::store::ReadingStore;

/// Build the "most recent row" query for a sample table
///
/// The table name cannot be bound as a parameter, so it is validated when the
/// configuration is loaded.
pub fn latest_sample_query(table: &str) -> String {
    format!(
        "SELECT temp, humidity, battery_mv, battery_level, time
         FROM {}
         WHERE sensor_mac = $1
         ORDER BY time DESC
         LIMIT 1",
        table
    )
}

/// Render a `timestamptz` value the way the freshness labels expect it
///
/// Keeps the offset the value carries. Falls back to the default string
/// representation for years RFC 3339 cannot express.
pub fn format_observed_at(observed_at: OffsetDateTime) -> String {
    observed_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| observed_at.to_string())
}

/// A missing row means the logger never wrote a sample for this sensor
pub fn require_row<R>(row: Option<R>) -> Result<R, StoreError> {
    row.ok_or(StoreError::Empty)
}

fn row_to_sample(row: &Row) -> Result<RawSample, tokio_postgres::Error> {
    let observed_at: OffsetDateTime = row.try_get(4)?;

    Ok(RawSample {
        temperature_raw: row.try_get(0)?,
        humidity_raw: row.try_get(1)?,
        battery_millivolts: row.try_get(2)?,
        battery_percent: row.try_get(3)?,
        observed_at: format_observed_at(observed_at),
    })
}

/// Fetch the newest sample written for `sensor_id`
///
/// # Arguments
/// * `client` - Open client for the device's store
/// * `table` - Validated table name
/// * `sensor_id` - MAC address of the sensor
///
/// # Returns
/// The newest sample, `StoreError::Empty` if nothing was ever written
pub async fn fetch_latest_sample(
    client: &Client,
    table: &str,
    sensor_id: &str,
) -> Result<RawSample, StoreError> {
    let row = client
        .query_opt(latest_sample_query(table).as_str(), &[&sensor_id])
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;
    let row = require_row(row)?;

    let sample = row_to_sample(&row).map_err(|e| StoreError::Query(e.to_string()))?;
    debug!("Latest sample for {}: {:?}", sensor_id, sample);

    Ok(sample)
}

/// PostgreSQL-backed store for a single device
///
/// Keeps the connection URL so a client that lost its connection is replaced
/// on the next read instead of failing every later poll.
pub struct PostgresStore {
    client: ClientSlot<Client>,
    database_url: String,
    table: String,
    sensor_id: String,
}

impl PostgresStore {
    pub fn new(client: Client, database_url: &str, table: &str, sensor_id: &str) -> Self {
        Self {
            client: ClientSlot::new(client),
            database_url: database_url.to_string(),
            table: table.to_string(),
            sensor_id: sensor_id.to_string(),
        }
    }
}

impl ReadingStore for PostgresStore {
    fn latest_sample(&self) -> BoxFuture<'_, Result<RawSample, StoreError>> {
        async move {
            let client = self
                .client
                .get(|| connect(&self.database_url))
                .await
                .map_err(StoreError::Query)?;
            fetch_latest_sample(&client, &self.table, &self.sensor_id).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::utils::relative_freshness;
    use std::sync::Arc;
    use time::macros::datetime;

    #[test]
    fn test_latest_sample_query_targets_table() {
        let query = latest_sample_query("sensor_data");
        assert!(query.contains("FROM sensor_data"));
        assert!(query.contains("ORDER BY time DESC"));
        assert!(query.contains("LIMIT 1"));
    }

    #[test]
    fn test_format_observed_at_utc() {
        let observed_at = datetime!(2026-10-15 10:05:00 UTC);
        assert_eq!(format_observed_at(observed_at), "2026-10-15T10:05:00Z");
    }

    #[test]
    fn test_format_observed_at_keeps_offset() {
        let observed_at = datetime!(2026-10-15 13:05:00 +02:00);
        let formatted = format_observed_at(observed_at);
        assert_eq!(formatted, "2026-10-15T13:05:00+02:00");

        // the label is computed from the same instant either way
        let now = datetime!(2026-10-15 12:05:00 UTC);
        assert_eq!(relative_freshness(&formatted, now), "1 Hour ago");
    }

    #[test]
    fn test_format_observed_at_subsecond() {
        let observed_at = datetime!(2026-10-15 10:05:00.25 UTC);
        let formatted = format_observed_at(observed_at);
        assert!(formatted.starts_with("2026-10-15T10:05:00.25"));
        assert_eq!(
            relative_freshness(&formatted, datetime!(2026-10-15 10:05:30 UTC)),
            "Up to date"
        );
    }

    #[test]
    fn test_require_row() {
        assert_eq!(require_row(Some(7)), Ok(7));
        assert_eq!(require_row::<i32>(None), Err(StoreError::Empty));
    }

    #[tokio::test]
    async fn test_empty_store_through_trait_object() {
        let store: Arc<dyn ReadingStore> = Arc::new(MemoryStore::new(Vec::new()));
        assert_eq!(store.latest_sample().await, Err(StoreError::Empty));
    }
}
