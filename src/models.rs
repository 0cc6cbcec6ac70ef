use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::store::ReadingStore;

/// One configured sensor and the store holding its samples
#[derive(Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub label: String,
    pub store: Arc<dyn ReadingStore>,
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Most recent stored observation for a device, fields as written by the logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub temperature_raw: i32, // °C * 100
    pub humidity_raw: i32,    // %RH * 100
    pub battery_millivolts: i32,
    pub battery_percent: i32,
    pub observed_at: String, // RFC 3339 when the store can produce it
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryClass {
    Critical,
    Low,
    Quarter,
    Half,
    ThreeQuarter,
    Full,
}

impl BatteryClass {
    /// Font Awesome classes used by the sensor cards
    pub fn icon(self) -> &'static str {
        match self {
            BatteryClass::Critical => "fa-battery-empty red",
            // fa-battery-low is not in the free icon set
            BatteryClass::Low => "fa-battery-empty yellow",
            BatteryClass::Quarter => "fa-battery-quarter",
            BatteryClass::Half => "fa-battery-half",
            BatteryClass::ThreeQuarter => "fa-battery-three-quarters",
            BatteryClass::Full => "fa-battery-full green",
        }
    }
}

/// Which caption the dew point value is shown under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DewPointLabel {
    #[serde(rename = "Dew point")]
    DewPoint,
    #[serde(rename = "Freezing point")]
    FreezingPoint,
}

impl fmt::Display for DewPointLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DewPointLabel::DewPoint => f.write_str("Dew point"),
            DewPointLabel::FreezingPoint => f.write_str("Freezing point"),
        }
    }
}

/// Normalized and derived view of a device's latest sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub device_id: String,
    pub label: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub battery_millivolts: i32,
    pub battery_percent: i32,
    pub observed_at: String,
    pub dew_point_c: f64,
    pub dew_point_label: DewPointLabel,
    pub absolute_humidity: f64, // g/m³, whole number
    pub battery_class: BatteryClass,
    pub freshness_label: String,
}

/// Readings ordered by device id
pub type ResultSet = Vec<Reading>;
