use super::*;
use crate::{
    activity::{RawActivity, attribute::LatLon},
    figure::chart::build_figure,
    track::model::{Track, TrackPoint},
};
use chrono::{TimeZone, Utc};

const FONT_DIR: &str = "/usr/share/fonts/truetype/dejavu";

fn raw() -> RawActivity {
    let points = (0..20)
        .map(|i| TrackPoint {
            lat: Some(45.0 + f64::from(i) * 1e-4),
            lon: Some(7.0 + f64::from(i) * 1e-4),
            elevation: Some(100.0 + f64::from(i)),
            time: Some(Utc.timestamp_opt(1_700_000_000 + i64::from(i), 0).unwrap()),
            extensions: Vec::new(),
        })
        .collect();
    RawActivity::from_track(&Track::from_points(points)).unwrap()
}

fn compositor(json: &str) -> OverlayResult<Compositor> {
    let template = Arc::new(Template::from_json_str(json).unwrap());
    let raw = raw();
    let trimmed = raw.trim(0, 20).unwrap();
    let canvas = template.scene.canvas();
    let mut figures = BTreeMap::new();
    for (i, plot) in template.plots.iter().enumerate() {
        figures.insert(i, build_figure(plot, canvas, &trimmed)?);
    }
    Compositor::new(
        template,
        raw.capabilities(),
        figures,
        Some(PathBuf::from(FONT_DIR)),
    )
}

fn course_at(lat: f64, lon: f64) -> AttributeSnapshot {
    AttributeSnapshot(BTreeMap::from([(
        AttributeKind::Course,
        AttributeValue::Course(LatLon { lat, lon }),
    )]))
}

fn pixel(frame: &[u8], canvas: Canvas, p: Point) -> [u8; 4] {
    let i = (p.y as usize * canvas.width as usize + p.x as usize) * 4;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

const COURSE_PLOT: &str = r##"{
  "scene": {"width": 201, "height": 151},
  "plots": [{"value": "course", "x": 10, "y": 10, "width": 160, "height": 120,
             "axis": "equal", "points": [{"color": "#ff0000", "weight": 20}]}]
}"##;

#[test]
fn odd_canvas_rounds_up_and_base_holds_the_background() {
    let c = compositor(COURSE_PLOT).unwrap();
    assert_eq!(c.canvas(), Canvas { width: 202, height: 152 });
    assert_eq!(c.base().len(), c.canvas().rgba_len());
    assert!(c.base().chunks_exact(4).any(|px| px[3] > 0));
    assert_eq!(c.plan().dynamics, vec![DynamicElement::PlotMarkers(0)]);
}

#[test]
fn marker_is_drawn_at_the_projected_position() {
    let mut c = compositor(COURSE_PLOT).unwrap();
    let fig = c.figures[&0].clone();
    let mut frame = Vec::new();

    let (lat, lon) = (45.0005, 7.0005);
    c.compose(FrameStamp { second: 5, sub: 0 }, &course_at(lat, lon), &mut frame)
        .unwrap();
    assert_eq!(frame.len(), c.canvas().rgba_len());
    let at = course_marker(&fig, lat, lon) + Vec2::new(10.0, 10.0);
    assert_eq!(pixel(&frame, c.canvas(), at), [255, 0, 0, 255]);

    let mut other = Vec::new();
    c.compose(FrameStamp { second: 15, sub: 0 }, &course_at(45.0015, 7.0015), &mut other)
        .unwrap();
    assert_ne!(frame, other);
    assert_ne!(pixel(&other, c.canvas(), at), [255, 0, 0, 255]);
}

#[test]
fn rotation_moves_markers_but_not_the_background() {
    let rotated = COURSE_PLOT.replace(
        r#""axis": "equal","#,
        r#""axis": "equal", "rotation": 180,"#,
    );
    let mut plain = compositor(COURSE_PLOT).unwrap();
    let mut turned = compositor(&rotated).unwrap();
    assert_eq!(plain.base(), turned.base());

    let fig = plain.figures[&0].clone();
    let values = course_at(45.0003, 7.0003);
    let stamp = FrameStamp { second: 3, sub: 0 };
    let (mut a, mut b) = (Vec::new(), Vec::new());
    plain.compose(stamp, &values, &mut a).unwrap();
    turned.compose(stamp, &values, &mut b).unwrap();

    let p = course_marker(&fig, 45.0003, 7.0003);
    let mirrored = Point::new(160.0 - p.x, 120.0 - p.y);
    let offset = Vec2::new(10.0, 10.0);
    assert_eq!(pixel(&b, turned.canvas(), mirrored + offset), [255, 0, 0, 255]);
    assert_eq!(pixel(&a, plain.canvas(), p + offset), [255, 0, 0, 255]);
}

#[test]
fn first_marker_layer_is_on_top() {
    let json = COURSE_PLOT.replace(
        r##""points": [{"color": "#ff0000", "weight": 20}]"##,
        r##""points": [{"color": "#0000ff", "weight": 4}, {"color": "#ff0000", "weight": 40}]"##,
    );
    let mut c = compositor(&json).unwrap();
    let fig = c.figures[&0].clone();
    let mut frame = Vec::new();
    c.compose(FrameStamp { second: 1, sub: 0 }, &course_at(45.0001, 7.0001), &mut frame)
        .unwrap();
    let at = course_marker(&fig, 45.0001, 7.0001) + Vec2::new(10.0, 10.0);
    assert_eq!(pixel(&frame, c.canvas(), at), [0, 0, 255, 255]);
}

#[test]
fn missing_value_is_an_evaluation_error() {
    let mut c = compositor(COURSE_PLOT).unwrap();
    let err = c
        .compose(FrameStamp::default(), &AttributeSnapshot::default(), &mut Vec::new())
        .unwrap_err();
    assert!(matches!(err, OverlayError::Evaluation(_)));
}

#[test]
fn planned_plot_without_figure_is_rejected() {
    let template = Arc::new(Template::from_json_str(COURSE_PLOT).unwrap());
    let err = Compositor::new(template, raw().capabilities(), BTreeMap::new(), None).unwrap_err();
    assert!(err.to_string().contains("no prebuilt figure"));
}

#[test]
fn static_templates_copy_the_base() {
    if !std::path::Path::new(FONT_DIR).join("DejaVuSans.ttf").is_file() {
        return;
    }
    let mut c = compositor(
        r#"{"scene": {"width": 120, "height": 40, "font": "DejaVuSans.ttf", "font_size": 16},
            "labels": [{"text": "Power", "x": 4, "y": 4}]}"#,
    )
    .unwrap();
    assert!(c.plan().is_static());
    assert!(c.base().chunks_exact(4).any(|px| px[3] > 0));
    let mut frame = Vec::new();
    c.compose(FrameStamp::default(), &AttributeSnapshot::default(), &mut frame)
        .unwrap();
    assert_eq!(frame.as_slice(), c.base());
}

#[test]
fn values_change_per_frame_and_reclaim_drops_layouts() {
    if !std::path::Path::new(FONT_DIR).join("DejaVuSans.ttf").is_file() {
        return;
    }
    let mut c = compositor(
        r#"{"scene": {"width": 120, "height": 40, "font": "DejaVuSans.ttf", "font_size": 16},
            "values": [{"value": "elevation", "x": 4, "y": 4, "unit": "metric", "decimal_rounding": 0}]}"#,
    )
    .unwrap();
    let at = |ele: f64| {
        AttributeSnapshot(BTreeMap::from([(
            AttributeKind::Elevation,
            AttributeValue::Number(ele),
        )]))
    };
    let (mut a, mut b) = (Vec::new(), Vec::new());
    c.compose(FrameStamp::default(), &at(100.0), &mut a).unwrap();
    c.compose(FrameStamp { second: 1, sub: 0 }, &at(117.0), &mut b).unwrap();
    assert_ne!(a, b);
    assert_eq!(c.cached_layouts(), 2);
    c.reclaim();
    assert_eq!(c.cached_layouts(), 0);
}
