use super::*;
use crate::{
    activity::RawActivity,
    template::model::Template,
    track::model::{Track, TrackPoint},
};
use chrono::{TimeZone, Utc};

fn activity() -> TrimmedActivity {
    let points = (0..20)
        .map(|i| TrackPoint {
            lat: Some(45.0 + f64::from(i) * 1e-4),
            lon: Some(7.0 + (f64::from(i) * 0.3).sin() * 1e-3),
            elevation: Some(100.0 + f64::from(i)),
            time: Some(Utc.timestamp_opt(1_700_000_000 + i64::from(i), 0).unwrap()),
            extensions: Vec::new(),
        })
        .collect();
    RawActivity::from_track(&Track::from_points(points))
        .unwrap()
        .trim(0, 20)
        .unwrap()
}

fn plot(json: &str) -> PlotConfig {
    let t = Template::from_json_str(&format!(
        r#"{{"scene": {{"width": 400, "height": 300}}, "plots": [{json}]}}"#
    ))
    .unwrap();
    t.plots[0].clone()
}

fn opaque_pixels(pm: &vello_cpu::Pixmap) -> usize {
    pm.data_as_u8_slice()
        .chunks_exact(4)
        .filter(|px| px[3] > 0)
        .count()
}

#[test]
fn elevation_chart_draws_line_and_fill() {
    let scene = Canvas { width: 400, height: 300 };
    let line_only = build_figure(
        &plot(r#"{"value": "elevation", "x": 0, "y": 0, "width": 200, "height": 100}"#),
        scene,
        &activity(),
    )
    .unwrap();
    assert_eq!(line_only.size(), Canvas { width: 200, height: 100 });
    assert_eq!(line_only.background().width(), 200);
    let line_px = opaque_pixels(line_only.background());
    assert!(line_px > 0);

    let filled = build_figure(
        &plot(r#"{"value": "elevation", "x": 0, "y": 0, "width": 200, "height": 100,
                  "fill": {"opacity": 0.5}}"#),
        scene,
        &activity(),
    )
    .unwrap();
    assert!(opaque_pixels(filled.background()) > line_px);
}

#[test]
fn course_chart_uses_scene_size_and_projects_markers_inside() {
    let fig = build_figure(
        &plot(r#"{"value": "course", "x": 10, "y": 10, "axis": "equal"}"#),
        Canvas { width: 400, height: 300 },
        &activity(),
    )
    .unwrap();
    assert_eq!(fig.kind(), AttributeKind::Course);
    assert_eq!(fig.size(), Canvas { width: 400, height: 300 });
    let p = course_marker(&fig, 45.001, 7.0);
    assert!(p.x > 0.0 && p.x < 400.0 && p.y > 0.0 && p.y < 300.0, "{p:?}");
}

#[test]
fn elevation_markers_follow_time_axis() {
    let fig = build_figure(
        &plot(r#"{"value": "elevation", "x": 0, "y": 0, "width": 200, "height": 100}"#),
        Canvas { width: 400, height: 300 },
        &activity(),
    )
    .unwrap();
    let early = elevation_marker(&fig, 1.0, 101.0);
    let late = elevation_marker(&fig, 18.0, 118.0);
    assert!(late.x > early.x);
    assert!(late.y < early.y);
}

#[test]
fn chart_data_rejects_other_attributes() {
    assert!(chart_data(AttributeKind::Power, &activity()).is_err());
}

#[test]
fn marker_radius_scales_with_dpi() {
    assert!((marker_radius(80.0, 72.0) - 80f64.sqrt() / 2.0).abs() < 1e-12);
    assert!((marker_radius(80.0, 300.0) - 80f64.sqrt() / 2.0 * 300.0 / 72.0).abs() < 1e-12);
    assert_eq!(marker_radius(-4.0, 300.0), 0.0);
}
