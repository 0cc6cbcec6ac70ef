/// Immutable set of configured devices and their store handles
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::DeviceConfig;
use crate::store::ReadingStore;

/// Device registry built once at startup and shared read-only afterwards
///
/// Devices are kept keyed by id, so iteration is always in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, DeviceConfig>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any earlier entry with the same id
    pub fn with_device(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        store: Arc<dyn ReadingStore>,
    ) -> Self {
        let id = id.into();
        self.devices.insert(
            id.clone(),
            DeviceConfig {
                id,
                label: label.into(),
                store,
            },
        );
        self
    }

    pub fn devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }
}
