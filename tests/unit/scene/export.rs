use super::*;
use crate::{
    encode::sink::InMemorySink,
    foundation::core::FrameIndex,
    track::model::{Track, TrackPoint},
};
use chrono::{TimeZone, Utc};

/// `rate` samples per second for `seconds`, no sensor extensions.
fn raw(rate: u32, seconds: u32) -> RawActivity {
    let n = rate * seconds;
    let points = (0..n)
        .map(|i| TrackPoint {
            lat: Some(45.0 + f64::from(i) * 1e-5),
            lon: Some(7.0 + f64::from(i) * 2e-5),
            elevation: Some(300.0 + f64::from(i % 7)),
            time: Some(
                Utc.timestamp_millis_opt(1_700_000_000_000 + i64::from(i) * 1000 / i64::from(rate))
                    .unwrap(),
            ),
            extensions: Vec::new(),
        })
        .collect();
    RawActivity::from_track(&Track::from_points(points)).unwrap()
}

fn template(extra_scene: &str) -> Template {
    Template::from_json_str(&format!(
        r##"{{
          "scene": {{"width": 64, "height": 48, "fps": 30 {extra_scene}}},
          "values": [
            {{"value": "cadence", "x": 0, "y": 0, "font_size": 10}},
            {{"value": "heartrate", "x": 0, "y": 0, "font_size": 10}},
            {{"value": "power", "x": 0, "y": 0, "font_size": 10}},
            {{"value": "temperature", "x": 0, "y": 0, "font_size": 10}}
          ],
          "plots": [
            {{"value": "elevation", "x": 0, "y": 0, "width": 64, "height": 24, "dpi": 72,
              "fill": {{"opacity": 0.4}}, "points": [{{"color": "#00ff00", "weight": 30}}]}},
            {{"value": "course", "x": 0, "y": 24, "width": 64, "height": 24, "dpi": 72,
              "points": [{{"color": "#ff00ff", "weight": 30}}]}}
          ]
        }}"##
    ))
    .unwrap()
}

fn scene(extra_scene: &str) -> Scene {
    let mut s = Scene::new(&raw(10, 5), template(extra_scene), None).unwrap();
    s.build_figures().unwrap();
    s
}

#[test]
fn trimmed_window_yields_ninety_frames() {
    let mut s = scene(r#", "start": 1, "end": 4"#);
    assert_eq!(s.seconds(), 3);
    s.build_frames(3).unwrap();
    assert_eq!(s.frames().len(), 90);
}

#[test]
fn sensorless_track_skips_sensor_values() {
    let s = scene("");
    let plan = s.compositor().unwrap().plan();
    assert_eq!(plan.dynamics.len(), 2);
}

#[test]
fn export_streams_every_frame_in_order() {
    let mut s = scene(r#", "start": 0, "end": 2"#);
    s.build_frames(2).unwrap();
    let mut sink = InMemorySink::new();
    let mut calls = Vec::new();
    let stats = s
        .export(&mut sink, |g, t, e| calls.push((g, t, e)), || false)
        .unwrap();

    assert_eq!(
        stats,
        ExportStats {
            frames_total: 60,
            frames_written: 60,
            frames_encoded: 60
        }
    );
    assert!(sink.is_ended());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.total_frames), (64, 48, 60));
    for (i, (idx, _)) in sink.frames().iter().enumerate() {
        assert_eq!(*idx, FrameIndex(i as u64));
    }
    assert_eq!(calls.len(), 60);
    assert_eq!(calls[0], (1, 60, 1));
    assert_eq!(calls[59], (60, 60, 60));
    assert_ne!(sink.frames()[0].1, sink.frames()[59].1);
}

#[test]
fn cancellation_stops_before_the_next_frame() {
    let mut s = scene("");
    s.build_frames(2).unwrap();
    let mut sink = InMemorySink::new();
    let generated = std::cell::Cell::new(0);
    let err = s
        .export(
            &mut sink,
            |g, _, _| generated.set(g),
            || generated.get() >= 5,
        )
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(matches!(err, OverlayError::Cancelled { frame: 5 }));
    assert!(sink.is_aborted());
    assert!(!sink.is_ended());
}

struct FailingSink {
    inner: InMemorySink,
    fail_at: u64,
    abort_fails: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, cfg: SinkConfig) -> OverlayResult<()> {
        self.inner.begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> OverlayResult<()> {
        if idx.0 == self.fail_at {
            return Err(OverlayError::encoder("sink rejected frame"));
        }
        self.inner.push_frame(idx, frame)
    }

    fn encoded_frames(&self) -> u64 {
        self.inner.encoded_frames()
    }

    fn end(&mut self) -> OverlayResult<()> {
        self.inner.end()
    }

    fn abort(&mut self) -> OverlayResult<()> {
        self.inner.abort()?;
        if self.abort_fails {
            return Err(OverlayError::encoder("cleanup failed"));
        }
        Ok(())
    }
}

#[test]
fn sink_failures_abort_and_propagate() {
    let mut s = scene("");
    s.build_frames(1).unwrap();
    let mut sink = FailingSink {
        inner: InMemorySink::new(),
        fail_at: 3,
        abort_fails: false,
    };
    let err = s.export(&mut sink, |_, _, _| {}, || false).unwrap_err();
    assert!(matches!(err, OverlayError::Encoder(_)));
    assert!(!err.is_cancelled());
    assert!(sink.inner.is_aborted());
}

#[test]
fn cancellation_survives_a_failed_cleanup() {
    let mut s = scene("");
    s.build_frames(1).unwrap();
    let mut sink = FailingSink {
        inner: InMemorySink::new(),
        fail_at: u64::MAX,
        abort_fails: true,
    };
    let generated = std::cell::Cell::new(0);
    let err = s
        .export(
            &mut sink,
            |g, _, _| generated.set(g),
            || generated.get() >= 2,
        )
        .unwrap_err();
    assert!(err.is_cancelled(), "{err}");
    assert!(matches!(err, OverlayError::Cancelled { frame: 2 }));
    assert!(sink.inner.is_aborted());
}

#[test]
fn export_requires_figures_and_frames() {
    let mut bare = Scene::new(&raw(10, 5), template(""), None).unwrap();
    bare.build_frames(1).unwrap();
    assert!(bare.export(&mut InMemorySink::new(), |_, _, _| {}, || false).is_err());

    let mut no_frames = scene("");
    let err = no_frames
        .export(&mut InMemorySink::new(), |_, _, _| {}, || false)
        .unwrap_err();
    assert!(matches!(err, OverlayError::Validation(_)));
}

#[test]
fn preview_matches_the_exported_frame() {
    let mut s = scene(r#", "end": 3"#);
    s.build_frames(3).unwrap();
    let mut sink = InMemorySink::new();
    s.export(&mut sink, |_, _, _| {}, || false).unwrap();
    let preview = s.render_preview(2).unwrap();
    assert_eq!(preview, sink.frames()[60].1);
    assert!(matches!(
        s.render_preview(3),
        Err(OverlayError::Bounds(_))
    ));
}

#[test]
fn window_outside_the_activity_is_rejected() {
    let err = Scene::new(&raw(10, 5), template(r#", "start": 2, "end": 9"#), None).unwrap_err();
    assert!(matches!(err, OverlayError::Bounds(_)));
}
