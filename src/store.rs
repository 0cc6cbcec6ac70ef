/// Capability interface over per-device sample stores
use futures_util::future::BoxFuture;

use crate::error::StoreError;
use crate::models::RawSample;

/// A read-only source of the most recent sample for one device
///
/// Implementations are opened once at startup and shared between requests,
/// so they must be usable through a shared reference.
pub trait ReadingStore: Send + Sync {
    /// Return the sample with the greatest observation time
    fn latest_sample(&self) -> BoxFuture<'_, Result<RawSample, StoreError>>;
}
