//! Activity pipeline: raw track points to a dense per-frame attribute timeline.
//!
//! Stages are separate snapshot types so the order is enforced by the compiler:
//! [`RawActivity`] (native rate, gradients smoothed) → [`TrimmedActivity`] (window applied) →
//! [`ResampledActivity`] (one sample per output frame).

use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::{Fps, FrameStamp},
        error::{OverlayError, OverlayResult},
    },
    track::model::Track,
};

pub(crate) mod attribute;
pub(crate) mod discover;
pub(crate) mod extract;
pub(crate) mod gradient;
pub(crate) mod resample;

use attribute::{AttributeKind, AttributeValue, Capabilities, Series};
use gradient::SmoothingParams;

/// Parsed and derived attributes at the track's native sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct RawActivity {
    capabilities: Capabilities,
    native_rate: u32,
    len: usize,
    series: BTreeMap<AttributeKind, Series>,
}

impl RawActivity {
    /// Build from the first segment of `track` with default smoothing constants.
    pub fn from_track(track: &Track) -> OverlayResult<Self> {
        Self::from_track_with(track, &SmoothingParams::default())
    }

    /// Build from the first segment of `track`.
    #[tracing::instrument(skip(track, params))]
    pub fn from_track_with(track: &Track, params: &SmoothingParams) -> OverlayResult<Self> {
        let segment = track
            .primary_segment()
            .filter(|s| !s.points.is_empty())
            .ok_or_else(|| OverlayError::track("track has no points"))?;

        let discovery = discover::discover(&segment.points);
        let mut series = extract::extract(segment, &discovery);
        if let Some(Series::Numeric(g)) = series.get_mut(&AttributeKind::Gradient) {
            *g = gradient::smooth_gradients(g, params);
        }

        let native_rate = native_rate(series.get(&AttributeKind::Time));
        tracing::info!(
            points = segment.points.len(),
            native_rate,
            attributes = discovery.capabilities.len(),
            "activity parsed"
        );
        Ok(Self {
            capabilities: discovery.capabilities,
            native_rate,
            len: segment.points.len(),
            series,
        })
    }

    /// Valid attribute set.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Native samples per second.
    pub fn native_rate(&self) -> u32 {
        self.native_rate
    }

    /// Number of native samples.
    pub fn point_count(&self) -> usize {
        self.len
    }

    /// Whole seconds addressable by [`trim`](Self::trim).
    pub fn duration_seconds(&self) -> u32 {
        u32::try_from(self.len / self.native_rate as usize).unwrap_or(u32::MAX)
    }

    /// Series for `kind`, when valid.
    pub fn series(&self, kind: AttributeKind) -> Option<&Series> {
        self.series.get(&kind)
    }

    /// Keep seconds `[start, end)`. Fails without touching `self` when the window is empty or
    /// out of range.
    pub fn trim(&self, start: u32, end: u32) -> OverlayResult<TrimmedActivity> {
        let duration = self.duration_seconds();
        if start >= duration {
            return Err(OverlayError::bounds(format!(
                "start {start} must be less than the activity duration ({duration} s)"
            )));
        }
        if end > duration || end <= start {
            return Err(OverlayError::bounds(format!(
                "end {end} must be greater than start {start} and at most {duration}"
            )));
        }

        let rate = self.native_rate as usize;
        let range = start as usize * rate..end as usize * rate;
        let series = self
            .series
            .iter()
            .map(|(k, s)| (*k, s.slice(range.clone())))
            .collect();
        tracing::debug!(start, end, "activity trimmed");
        Ok(TrimmedActivity {
            capabilities: self.capabilities,
            native_rate: self.native_rate,
            seconds: end - start,
            series,
        })
    }
}

/// Native-rate attributes limited to a window of whole seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TrimmedActivity {
    capabilities: Capabilities,
    native_rate: u32,
    seconds: u32,
    series: BTreeMap<AttributeKind, Series>,
}

impl TrimmedActivity {
    /// Valid attribute set.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Native samples per second.
    pub fn native_rate(&self) -> u32 {
        self.native_rate
    }

    /// Window length in seconds.
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Series for `kind`, when valid.
    pub fn series(&self, kind: AttributeKind) -> Option<&Series> {
        self.series.get(&kind)
    }

    /// Interpolate every attribute except time to `fps`.
    #[tracing::instrument(skip(self), fields(seconds = self.seconds))]
    pub fn resample(&self, fps: Fps) -> ResampledActivity {
        let series = self
            .series
            .iter()
            .map(|(k, s)| {
                let out = if k.is_interpolated() {
                    resample::resample_series(s, self.native_rate, fps.get())
                } else {
                    s.clone()
                };
                (*k, out)
            })
            .collect();
        ResampledActivity {
            capabilities: self.capabilities,
            native_rate: self.native_rate,
            fps,
            seconds: self.seconds,
            series,
        }
    }
}

/// One value per output frame for every interpolated attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct ResampledActivity {
    capabilities: Capabilities,
    native_rate: u32,
    fps: Fps,
    seconds: u32,
    series: BTreeMap<AttributeKind, Series>,
}

impl ResampledActivity {
    /// Valid attribute set.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Window length in seconds.
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Series for `kind`, when valid.
    pub fn series(&self, kind: AttributeKind) -> Option<&Series> {
        self.series.get(&kind)
    }

    /// Value of every valid attribute at `stamp`.
    ///
    /// Interpolated attributes are read at the flat frame index; time is read at the start of
    /// the stamp's second.
    pub fn snapshot(&self, stamp: FrameStamp) -> OverlayResult<AttributeSnapshot> {
        let frame = stamp.index(self.fps).0 as usize;
        let native = stamp.second as usize * self.native_rate as usize;
        let mut values = BTreeMap::new();
        for (kind, series) in &self.series {
            let at = if kind.is_interpolated() { frame } else { native };
            let v = series.value_at(at).ok_or_else(|| {
                OverlayError::bounds(format!(
                    "{kind} has {} samples, frame needs index {at}",
                    series.len()
                ))
            })?;
            values.insert(*kind, v);
        }
        Ok(AttributeSnapshot(values))
    }
}

/// Single-valued view of every valid attribute for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSnapshot(pub BTreeMap<AttributeKind, AttributeValue>);

impl AttributeSnapshot {
    /// Value of `kind`, when valid.
    pub fn get(&self, kind: AttributeKind) -> Option<AttributeValue> {
        self.0.get(&kind).copied()
    }

    /// Numeric value of `kind`, when valid and scalar.
    pub fn number(&self, kind: AttributeKind) -> Option<f64> {
        match self.get(kind)? {
            AttributeValue::Number(v) => Some(v),
            _ => None,
        }
    }
}

/// Integer samples per second from the median timestamp spacing; `1` without usable time.
fn native_rate(time: Option<&Series>) -> u32 {
    let Some(Series::Time(times)) = time else {
        return 1;
    };
    let mut deltas: Vec<i64> = times
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds())
        .filter(|d| *d > 0)
        .collect();
    if deltas.is_empty() {
        return 1;
    }
    deltas.sort_unstable();
    let median_ms = deltas[deltas.len() / 2] as f64;
    ((1000.0 / median_ms).round() as u32).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/activity/mod.rs"]
mod tests;
