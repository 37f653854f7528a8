use super::*;
use crate::{foundation::core::Rgba8, template::model::Unit};

const TEMPLATE: &str = r##"{
  "scene": {
    "width": 1920, "height": 1080, "fps": 24, "start": 10, "end": 70,
    "color": "#ff0000", "font_size": 40, "unit": "imperial", "font": "Inter.ttf"
  },
  "values": [
    {"value": "speed", "x": 10, "y": 20, "decimal_rounding": 1},
    {"value": "time", "x": 10, "y": 80, "unit": "metric", "color": "#00ff00",
     "hours_offset": -7, "time_format": "%I:%M %p"}
  ],
  "labels": [{"text": "SPEED", "x": 10, "y": 0, "font_size": 12}],
  "plots": [
    {"value": "elevation", "x": 0, "y": 600, "width": 800, "height": 200,
     "fill": {"opacity": 0.3}, "points": [{"weight": 100}],
     "point_label": {"units": ["imperial", "metric"], "decimal_rounding": 0}}
  ]
}"##;

#[test]
fn elements_inherit_missing_scene_keys() {
    let t = Template::from_json_str(TEMPLATE).unwrap();
    assert_eq!(t.scene.fps.get(), 24);
    assert_eq!(t.scene.overlay_filename, "overlay.mov");

    let speed = &t.values[0];
    assert_eq!(speed.style.font_size, 40.0);
    assert_eq!(speed.style.font, "Inter.ttf");
    assert_eq!(speed.style.color, Rgba8::new(255, 0, 0, 255));
    assert_eq!(speed.unit, Some(Unit::Imperial));

    let time = &t.values[1];
    assert_eq!(time.unit, Some(Unit::Metric));
    assert_eq!(time.style.color, Rgba8::new(0, 255, 0, 255));
    assert_eq!(time.hours_offset, -7.0);

    assert_eq!(t.labels[0].style.font_size, 12.0);

    let plot = &t.plots[0];
    assert_eq!(plot.dpi, 300.0);
    assert_eq!(plot.margin, 0.1);
    assert_eq!(plot.points[0].weight, 100.0);
    assert_eq!(plot.points[0].opacity, 1.0);
    let label = plot.point_label.as_ref().unwrap();
    assert_eq!(label.font_size, 40.0);
    assert_eq!(label.font, "Inter.ttf");
    assert_eq!(label.units, vec![Unit::Imperial, Unit::Metric]);
    assert!(plot.is_dynamic());
}

#[test]
fn scene_rounding_and_suffix_reach_values_and_point_labels() {
    let t = Template::from_json_str(
        r#"{
          "scene": {"width": 10, "height": 10, "font_size": 8,
                    "decimal_rounding": 0, "suffix": " !"},
          "values": [
            {"value": "speed", "x": 0, "y": 0},
            {"value": "power", "x": 0, "y": 0, "decimal_rounding": 2, "suffix": ""}
          ],
          "plots": [{"value": "elevation", "x": 0, "y": 0,
                     "point_label": {"units": ["metric"]}}]
        }"#,
    )
    .unwrap();
    assert_eq!(t.values[0].decimal_rounding, Some(0));
    assert_eq!(t.values[0].suffix.as_deref(), Some(" !"));
    assert_eq!(t.values[1].decimal_rounding, Some(2));
    assert_eq!(t.values[1].suffix.as_deref(), Some(""));
    let label = t.plots[0].point_label.as_ref().unwrap();
    assert_eq!(label.decimal_rounding, Some(0));
}

#[test]
fn scene_defaults_apply_when_absent() {
    let t = Template::from_json_str(r#"{"scene": {"width": 10, "height": 10}}"#).unwrap();
    assert_eq!(t.scene.fps.get(), 30);
    assert_eq!(t.scene.font, "Arial.ttf");
    assert!(t.values.is_empty() && t.labels.is_empty() && t.plots.is_empty());
}

#[test]
fn rejects_structural_problems() {
    for bad in [
        r#"[]"#,
        r#"{"values": []}"#,
        r#"{"scene": {"width": 10, "height": 10}, "values": {}}"#,
        r#"{"scene": {"width": 0, "height": 10}}"#,
        r#"{"scene": {"width": 10, "height": 10, "fps": 0}}"#,
        r#"{"scene": {"width": 10, "height": 10, "start": 5, "end": 5}}"#,
        r#"{"scene": {"width": 10, "height": 10}, "values": [{"value": "speed", "x": 0, "y": 0}]}"#,
        r#"{"scene": {"width": 10, "height": 10}, "plots": [{"value": "power", "x": 0, "y": 0}]}"#,
        r#"{"scene": {"width": 10, "height": 10, "font_size": 9},
            "values": [{"value": "time", "x": 0, "y": 0, "time_format": "%Q"}]}"#,
        r#"{"scene": {"width": 10, "height": 10, "font_size": 9},
            "values": [{"value": "altitude", "x": 0, "y": 0}]}"#,
    ] {
        let err = Template::from_json_str(bad).unwrap_err();
        assert!(matches!(err, OverlayError::Validation(_)), "{bad}: {err}");
    }
}

#[test]
fn plot_size_falls_back_to_scene() {
    let t = Template::from_json_str(
        r#"{"scene": {"width": 640, "height": 360},
            "plots": [{"value": "course", "x": 0, "y": 0, "height": 100, "axis": "equal"}]}"#,
    )
    .unwrap();
    let size = t.plots[0].size(t.scene.canvas());
    assert_eq!((size.width, size.height), (640, 100));
    assert!(!t.plots[0].is_dynamic());
}

#[test]
fn oversized_canvas_is_rejected() {
    let err = Template::from_json_str(r#"{"scene": {"width": 4294967295, "height": 10}}"#)
        .unwrap_err();
    assert!(matches!(err, OverlayError::Validation(_)), "{err}");
    assert!(err.to_string().contains("at most 65534"), "{err}");

    let err = Template::from_json_str(
        r#"{"scene": {"width": 100, "height": 100},
            "plots": [{"value": "course", "x": 0, "y": 0, "width": 70000}]}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("plot width/height"), "{err}");

    assert!(Template::from_json_str(r#"{"scene": {"width": 65534, "height": 2}}"#).is_ok());
}

#[test]
fn missing_file_reports_path() {
    let err = Template::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("here.json"));
}
