use super::*;
use crate::track::model::{Extension, TrackPoint};
use chrono::{TimeZone, Utc};

fn track_at(rate_hz: i64, seconds: i64, with_power: bool) -> Track {
    let step_ms = 1000 / rate_hz;
    let points = (0..rate_hz * seconds)
        .map(|i| TrackPoint {
            lat: Some(45.0 + i as f64 * 1e-5),
            lon: Some(7.0 + i as f64 * 1e-5),
            elevation: Some(200.0 + (i as f64 * 0.2).sin() * 3.0),
            time: Some(
                Utc.timestamp_millis_opt(1_700_000_000_000 + i * step_ms)
                    .unwrap(),
            ),
            extensions: if with_power {
                vec![Extension::leaf("power", format!("{}", 150 + i))]
            } else {
                Vec::new()
            },
        })
        .collect();
    Track::from_points(points)
}

#[test]
fn ten_hz_window_resamples_to_ninety_frames() {
    let raw = RawActivity::from_track(&track_at(10, 5, true)).unwrap();
    assert_eq!(raw.native_rate(), 10);
    assert_eq!(raw.duration_seconds(), 5);

    let trimmed = raw.trim(1, 4).unwrap();
    assert_eq!(trimmed.seconds(), 3);
    let resampled = trimmed.resample(Fps::new(30).unwrap());
    for kind in resampled.capabilities().iter() {
        let len = resampled.series(kind).unwrap().len();
        if kind.is_interpolated() {
            assert_eq!(len, 90, "{kind}");
        } else {
            assert_eq!(len, 30, "{kind}");
        }
    }
}

#[test]
fn track_without_sensors_has_core_attributes_only() {
    let raw = RawActivity::from_track(&track_at(1, 10, false)).unwrap();
    assert_eq!(
        raw.capabilities().iter().collect::<Vec<_>>(),
        vec![
            AttributeKind::Course,
            AttributeKind::Elevation,
            AttributeKind::Gradient,
            AttributeKind::Speed,
            AttributeKind::Time,
        ]
    );
    let resampled = raw.trim(0, 10).unwrap().resample(Fps::default());
    for second in 0..10 {
        for sub in 0..30 {
            let snap = resampled.snapshot(FrameStamp { second, sub }).unwrap();
            assert_eq!(snap.0.len(), 5);
            assert!(snap.get(AttributeKind::Power).is_none());
        }
    }
}

#[test]
fn invalid_windows_fail_and_leave_activity_intact() {
    let raw = RawActivity::from_track(&track_at(1, 10, true)).unwrap();
    let before = raw.clone();
    for (s, e) in [(5, 5), (6, 2), (10, 12), (0, 11)] {
        let err = raw.trim(s, e).unwrap_err();
        assert!(matches!(err, OverlayError::Bounds(_)), "{s}..{e}: {err}");
    }
    assert_eq!(raw, before);
}

#[test]
fn resampled_values_stay_within_native_range() {
    let raw = RawActivity::from_track(&track_at(1, 20, true)).unwrap();
    let trimmed = raw.trim(2, 18).unwrap();
    let resampled = trimmed.resample(Fps::new(25).unwrap());
    for kind in [AttributeKind::Elevation, AttributeKind::Power, AttributeKind::Speed] {
        let native = trimmed.series(kind).unwrap().as_numeric().unwrap();
        let ext = resample::extend_tail(native);
        let lo = ext.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = ext.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for v in resampled.series(kind).unwrap().as_numeric().unwrap() {
            assert!(*v >= lo - 1e-9 && *v <= hi + 1e-9, "{kind}: {v}");
        }
    }
}

#[test]
fn snapshot_reads_time_at_native_second() {
    let raw = RawActivity::from_track(&track_at(2, 6, true)).unwrap();
    let resampled = raw.trim(1, 5).unwrap().resample(Fps::new(10).unwrap());
    let snap = resampled.snapshot(FrameStamp { second: 2, sub: 7 }).unwrap();
    let AttributeValue::Time(t) = snap.get(AttributeKind::Time).unwrap() else {
        panic!("time should be a timestamp");
    };
    // Window starts at second 1, so relative second 2 is absolute second 3.
    assert_eq!(t.timestamp(), 1_700_000_003);
    assert!(snap.number(AttributeKind::Power).is_some());
}

#[test]
fn empty_track_is_rejected() {
    let err = RawActivity::from_track(&Track::default()).unwrap_err();
    assert!(matches!(err, OverlayError::Track(_)));
}
