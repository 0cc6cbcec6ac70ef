/// Unit normalization and derived physical quantities
///
/// Everything in here is pure: no I/O and no clock access.
use crate::error::DashboardError;
use crate::models::{BatteryClass, DeviceConfig, DewPointLabel, RawSample, Reading};

// Magnus coefficients (a in °C, b dimensionless)
const MAGNUS_WATER: (f64, f64) = (241.2, 17.5043);
const MAGNUS_ICE: (f64, f64) = (272.186, 22.4433);

/// Round to one decimal place, halves away from zero
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Dew point in °C for relative humidity `humidity` (0-100) at `temperature` °C
///
/// Uses the ice-phase coefficients below 0 °C. The result is rounded to one
/// decimal place, half away from zero.
///
/// # Returns
/// The dew point, or a reason string when humidity is not positive or the
/// formula does not produce a finite value
pub fn dew_point(humidity: f64, temperature: f64) -> Result<f64, String> {
    if !(humidity > 0.0) {
        return Err(format!("humidity must be positive, got {}", humidity));
    }

    let (a, b) = if temperature < 0.0 {
        MAGNUS_ICE
    } else {
        MAGNUS_WATER
    };

    let hn = (humidity / 100.0).ln();
    let r = temperature / (a + temperature);
    let point = (a * hn + a * b * r) / (b - hn - b * r);

    if !point.is_finite() {
        return Err(format!(
            "dew point undefined for {}% at {}°C",
            humidity, temperature
        ));
    }

    Ok(round_tenths(point))
}

/// Approximate absolute humidity in g/m³, rounded to the nearest whole number
///
/// `humidity` is relative humidity on the 0-100 scale.
pub fn absolute_humidity(humidity: f64, temperature: f64) -> Result<f64, String> {
    if !(humidity > 0.0) {
        return Err(format!("humidity must be positive, got {}", humidity));
    }

    let abs = 13.2471 * (17.67 * temperature / (temperature + 243.5)).exp() * humidity
        / (273.15 + temperature);

    if !abs.is_finite() {
        return Err(format!(
            "absolute humidity undefined for {}% at {}°C",
            humidity, temperature
        ));
    }

    Ok(abs.round())
}

/// Map a battery percentage onto display bands, lowest band first
pub fn classify_battery(percent: i32) -> BatteryClass {
    match percent {
        p if p < 5 => BatteryClass::Critical,
        p if p < 15 => BatteryClass::Low,
        p if p < 35 => BatteryClass::Quarter,
        p if p < 65 => BatteryClass::Half,
        p if p < 85 => BatteryClass::ThreeQuarter,
        _ => BatteryClass::Full,
    }
}

pub fn dew_point_label(temperature: f64) -> DewPointLabel {
    if temperature < 0.0 {
        DewPointLabel::FreezingPoint
    } else {
        DewPointLabel::DewPoint
    }
}

/// Turn a raw sample into a display reading for `device`
///
/// The freshness label is left as the raw `observed_at` string; the assembler
/// replaces it once it has a reference time.
pub fn derive(raw: &RawSample, device: &DeviceConfig) -> Result<Reading, DashboardError> {
    let temperature_c = raw.temperature_raw as f64 / 100.0;
    let humidity_pct = raw.humidity_raw as f64 / 100.0;

    let derivation_error = |reason: String| DashboardError::DerivationError {
        device_id: device.id.clone(),
        reason,
    };

    let dew_point_c = dew_point(humidity_pct, temperature_c).map_err(derivation_error)?;
    let absolute_humidity =
        absolute_humidity(humidity_pct, temperature_c).map_err(derivation_error)?;

    Ok(Reading {
        device_id: device.id.clone(),
        label: device.label.clone(),
        temperature_c,
        humidity_pct,
        battery_millivolts: raw.battery_millivolts,
        battery_percent: raw.battery_percent,
        observed_at: raw.observed_at.clone(),
        dew_point_c,
        dew_point_label: dew_point_label(temperature_c),
        absolute_humidity,
        battery_class: classify_battery(raw.battery_percent),
        freshness_label: raw.observed_at.clone(),
    })
}
