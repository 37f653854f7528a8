//! Unit conversion, rounding and suffixes for displayed values.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};

use crate::{
    activity::attribute::{AttributeKind, AttributeValue},
    foundation::error::{OverlayError, OverlayResult},
    template::model::{PointLabelConfig, Unit, ValueConfig},
};

/// m/s to mph.
pub const MPH_PER_MPS: f64 = 2.23694;
/// m/s to km/h.
pub const KMH_PER_MPS: f64 = 3.6;
/// Metres to feet.
pub const FT_PER_M: f64 = 3.28084;

/// Convert a metric reading of `kind` into `unit`.
pub fn convert(kind: AttributeKind, value: f64, unit: Option<Unit>) -> f64 {
    match (kind, unit) {
        (AttributeKind::Speed, Some(Unit::Imperial)) => value * MPH_PER_MPS,
        (AttributeKind::Speed, Some(Unit::Metric)) => value * KMH_PER_MPS,
        (AttributeKind::Elevation, Some(Unit::Imperial)) => value * FT_PER_M,
        (AttributeKind::Temperature, Some(Unit::Imperial)) => value * 9.0 / 5.0 + 32.0,
        _ => value,
    }
}

/// Suffix used when the template does not set one.
pub fn default_suffix(kind: AttributeKind, unit: Option<Unit>) -> &'static str {
    match (kind, unit) {
        (AttributeKind::Cadence, _) => " rpm",
        (AttributeKind::Gradient, _) => " %",
        (AttributeKind::Heartrate, _) => " bpm",
        (AttributeKind::Power, _) => " W",
        (AttributeKind::Elevation, Some(Unit::Imperial)) => " ft",
        (AttributeKind::Elevation, Some(Unit::Metric)) => " m",
        (AttributeKind::Speed, Some(Unit::Imperial)) => " mph",
        (AttributeKind::Speed, Some(Unit::Metric)) => " km/h",
        (AttributeKind::Temperature, Some(Unit::Imperial)) => "°F",
        (AttributeKind::Temperature, Some(Unit::Metric)) => "°C",
        _ => "",
    }
}

/// Render `value` with `decimals` places; `Some(0)` truncates toward zero.
pub fn round_value(value: f64, decimals: Option<u32>) -> String {
    match decimals {
        Some(0) => format!("{}", value.trunc() as i64),
        Some(d) => format!("{value:.prec$}", prec = d as usize),
        None => format!("{value}"),
    }
}

/// Shift by `hours_offset` and format with a `strftime` pattern.
pub fn format_time(t: DateTime<Utc>, hours_offset: f64, format: &str) -> OverlayResult<String> {
    let shifted = t + Duration::milliseconds((hours_offset * 3_600_000.0).round() as i64);
    let mut out = String::new();
    write!(out, "{}", shifted.format(format))
        .map_err(|_| OverlayError::validation(format!("invalid time_format {format:?}")))?;
    Ok(out)
}

/// Display text of a value element for one frame.
pub fn format_value(config: &ValueConfig, value: AttributeValue) -> OverlayResult<String> {
    let kind = config.value;
    let body = match value {
        AttributeValue::Number(v) => {
            round_value(convert(kind, v, config.unit), config.decimal_rounding)
        }
        AttributeValue::Time(t) => format_time(t, config.hours_offset, &config.time_format)?,
        AttributeValue::Course(p) => {
            let d = Some(config.decimal_rounding.unwrap_or(5));
            format!("{}, {}", round_value(p.lat, d), round_value(p.lon, d))
        }
    };
    let suffix = config
        .suffix
        .as_deref()
        .unwrap_or_else(|| default_suffix(kind, config.unit));
    Ok(body + suffix)
}

/// Elevation readout next to a profile marker: one line per configured unit.
pub fn elevation_label(elevation_m: f64, config: &PointLabelConfig) -> String {
    config
        .units
        .iter()
        .map(|u| {
            let v = convert(AttributeKind::Elevation, elevation_m, Some(*u));
            format!(
                "{}{}",
                round_value(v, config.decimal_rounding),
                default_suffix(AttributeKind::Elevation, Some(*u))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "../../tests/unit/compose/format.rs"]
mod tests;
