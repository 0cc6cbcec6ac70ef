/// Failures reported by a reading store adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store contains no samples")]
    Empty,
    #[error("query failed: {0}")]
    Query(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Failures that abort one pipeline run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    #[error("store for device {device_id} unavailable: {reason}")]
    StoreUnavailable { device_id: String, reason: StoreError },
    #[error("cannot derive metrics for device {device_id}: {reason}")]
    DerivationError { device_id: String, reason: String },
}

impl DashboardError {
    pub fn device_id(&self) -> &str {
        match self {
            DashboardError::StoreUnavailable { device_id, .. } => device_id,
            DashboardError::DerivationError { device_id, .. } => device_id,
        }
    }
}
