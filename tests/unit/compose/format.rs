use super::*;
use crate::{activity::attribute::LatLon, template::model::Template};
use chrono::TimeZone;

fn value(json: &str) -> ValueConfig {
    Template::from_json_str(&format!(
        r#"{{"scene": {{"width": 10, "height": 10, "font_size": 12}}, "values": [{json}]}}"#
    ))
    .unwrap()
    .values
    .remove(0)
}

#[test]
fn unit_conversions() {
    assert!((convert(AttributeKind::Speed, 10.0, Some(Unit::Imperial)) - 22.3694).abs() < 1e-9);
    assert!((convert(AttributeKind::Speed, 10.0, Some(Unit::Metric)) - 36.0).abs() < 1e-9);
    assert!(
        (convert(AttributeKind::Elevation, 100.0, Some(Unit::Imperial)) - 328.084).abs() < 1e-9
    );
    assert_eq!(convert(AttributeKind::Elevation, 100.0, Some(Unit::Metric)), 100.0);
    assert_eq!(convert(AttributeKind::Temperature, 20.0, Some(Unit::Imperial)), 68.0);
    assert_eq!(convert(AttributeKind::Power, 250.0, Some(Unit::Imperial)), 250.0);
    assert_eq!(convert(AttributeKind::Speed, 5.0, None), 5.0);
}

#[test]
fn zero_decimals_truncates_instead_of_rounding() {
    assert_eq!(round_value(12.99, Some(0)), "12");
    assert_eq!(round_value(-3.7, Some(0)), "-3");
    assert_eq!(round_value(12.96, Some(1)), "13.0");
    assert_eq!(round_value(1.5, None), "1.5");
}

#[test]
fn value_text_gets_default_or_custom_suffix() {
    let speed = value(
        r#"{"value": "speed", "x": 0, "y": 0, "unit": "metric", "decimal_rounding": 1}"#,
    );
    assert_eq!(
        format_value(&speed, AttributeValue::Number(10.0)).unwrap(),
        "36.0 km/h"
    );
    let power = value(
        r#"{"value": "power", "x": 0, "y": 0, "decimal_rounding": 0, "suffix": "w"}"#,
    );
    assert_eq!(
        format_value(&power, AttributeValue::Number(251.9)).unwrap(),
        "251w"
    );
    let temp = value(
        r#"{"value": "temperature", "x": 0, "y": 0, "unit": "imperial", "decimal_rounding": 0}"#,
    );
    assert_eq!(
        format_value(&temp, AttributeValue::Number(25.0)).unwrap(),
        "77°F"
    );
}

#[test]
fn time_is_offset_and_formatted() {
    let cfg = value(
        r#"{"value": "time", "x": 0, "y": 0, "hours_offset": -7, "time_format": "%H:%M"}"#,
    );
    let t = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
    assert_eq!(format_value(&cfg, AttributeValue::Time(t)).unwrap(), "07:30");
    assert_eq!(format_time(t, 0.5, "%H:%M:%S").unwrap(), "15:00:00");
}

#[test]
fn course_prints_coordinates() {
    let cfg = value(r#"{"value": "course", "x": 0, "y": 0, "decimal_rounding": 2}"#);
    let p = LatLon { lat: 45.1234, lon: 7.5678 };
    assert_eq!(format_value(&cfg, AttributeValue::Course(p)).unwrap(), "45.12, 7.57");
}

#[test]
fn elevation_label_has_one_line_per_unit() {
    let t = Template::from_json_str(
        r#"{"scene": {"width": 10, "height": 10, "font_size": 12},
            "plots": [{"value": "elevation", "x": 0, "y": 0,
                       "point_label": {"units": ["imperial", "metric"], "decimal_rounding": 0}}]}"#,
    )
    .unwrap();
    let label = t.plots[0].point_label.as_ref().unwrap();
    assert_eq!(elevation_label(100.0, label), "328 ft\n100 m");
}
