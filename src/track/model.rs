use chrono::{DateTime, Utc};

/// Metres per degree of latitude used by the small-distance approximation.
pub const ONE_DEGREE_M: f64 = 1000.0 * 10000.8 / 90.0;
/// Equatorial earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6378.137 * 1000.0;

/// One node of a point's extension tree.
///
/// Tags are namespaced as `{namespace-uri}local-name`, or just `local-name` when the element has
/// no namespace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extension {
    /// Namespaced tag.
    pub tag: String,
    /// Trimmed text content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<Extension>,
}

impl Extension {
    /// Leaf node carrying `text`.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Interior node wrapping `children`.
    pub fn node(tag: impl Into<String>, children: Vec<Extension>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children,
        }
    }
}

/// A single recorded sample.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackPoint {
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lon: Option<f64>,
    /// Elevation in metres.
    pub elevation: Option<f64>,
    /// Sample timestamp.
    pub time: Option<DateTime<Utc>>,
    /// Top-level extension elements.
    pub extensions: Vec<Extension>,
}

impl TrackPoint {
    /// `(lat, lon)` when both are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }

    /// Horizontal distance in metres to `other`, when both have positions.
    pub fn distance_2d(&self, other: &TrackPoint) -> Option<f64> {
        let (lat1, lon1) = self.position()?;
        let (lat2, lon2) = other.position()?;
        Some(distance_m(lat1, lon1, lat2, lon2))
    }

    /// Distance in metres including the elevation delta when both elevations are known.
    pub fn distance_3d(&self, other: &TrackPoint) -> Option<f64> {
        let flat = self.distance_2d(other)?;
        match (self.elevation, other.elevation) {
            (Some(a), Some(b)) => Some((flat * flat + (a - b) * (a - b)).sqrt()),
            _ => Some(flat),
        }
    }

    /// Slope angle in degrees climbing from `previous` to `self`.
    ///
    /// Zero horizontal distance yields `0.0`; missing elevation or position yields `None`.
    pub fn elevation_angle_from(&self, previous: &TrackPoint) -> Option<f64> {
        let rise = self.elevation? - previous.elevation?;
        let run = previous.distance_2d(self)?;
        if run == 0.0 {
            return Some(0.0);
        }
        Some((rise / run).atan().to_degrees())
    }

    /// Speed in metres per second between `self` and `other`.
    pub fn speed_between(&self, other: &TrackPoint) -> Option<f64> {
        let dt = (self.time? - other.time?).num_milliseconds().abs() as f64 / 1000.0;
        if dt == 0.0 {
            return None;
        }
        let length = self.distance_3d(other)?;
        Some(length / dt)
    }
}

/// Ordered run of points recorded without interruption.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    /// Points in recording order.
    pub points: Vec<TrackPoint>,
}

impl Segment {
    /// Instantaneous speed at `index` in m/s: mean of the speeds to both neighbours.
    pub fn speed_at(&self, index: usize) -> Option<f64> {
        let point = self.points.get(index)?;
        let prev = index
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
            .and_then(|p| point.speed_between(p));
        let next = self
            .points
            .get(index + 1)
            .and_then(|p| point.speed_between(p));
        match (prev, next) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        }
    }
}

/// A parsed activity recording.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    /// Recorded segments in order.
    pub segments: Vec<Segment>,
}

impl Track {
    /// Build a single-segment track.
    pub fn from_points(points: Vec<TrackPoint>) -> Self {
        Self {
            segments: vec![Segment { points }],
        }
    }

    /// The segment fed to the activity pipeline.
    pub fn primary_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }
}

/// Distance in metres between two coordinates.
///
/// Short hops use an equirectangular approximation; anything spanning more than 0.2° in either
/// axis falls back to haversine.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if (lat1 - lat2).abs() > 0.2 || (lon1 - lon2).abs() > 0.2 {
        return haversine_m(lat1, lon1, lat2, lon2);
    }
    let coef = lat1.to_radians().cos();
    let x = lat1 - lat2;
    let y = (lon1 - lon2) * coef;
    (x * x + y * y).sqrt() * ONE_DEGREE_M
}

fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
#[path = "../../tests/unit/track/model.rs"]
mod tests;
