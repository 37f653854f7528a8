use chrono::{DateTime, Utc};

/// Closed vocabulary of per-sample attributes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// `(lat, lon)` position.
    Course,
    /// Elevation in metres.
    Elevation,
    /// Smoothed slope angle, derived from position + elevation.
    Gradient,
    /// Speed in m/s, derived from position over time.
    Speed,
    /// Sample timestamp.
    Time,
    /// Cadence sensor channel.
    Cadence,
    /// Heart-rate sensor channel.
    Heartrate,
    /// Power sensor channel.
    Power,
    /// Temperature sensor channel (°C).
    Temperature,
}

impl AttributeKind {
    /// Every attribute in vocabulary order.
    pub const ALL: [AttributeKind; 9] = [
        Self::Course,
        Self::Elevation,
        Self::Gradient,
        Self::Speed,
        Self::Time,
        Self::Cadence,
        Self::Heartrate,
        Self::Power,
        Self::Temperature,
    ];

    /// Sensor channels read from the extension tree.
    pub const SENSORS: [AttributeKind; 4] = [
        Self::Cadence,
        Self::Heartrate,
        Self::Power,
        Self::Temperature,
    ];

    /// Stable lowercase name used in templates.
    pub fn name(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Elevation => "elevation",
            Self::Gradient => "gradient",
            Self::Speed => "speed",
            Self::Time => "time",
            Self::Cadence => "cadence",
            Self::Heartrate => "heartrate",
            Self::Power => "power",
            Self::Temperature => "temperature",
        }
    }

    /// `false` for attributes kept at native rate through resampling.
    pub fn is_interpolated(self) -> bool {
        self != Self::Time
    }

    /// Map a namespaced extension tag to the sensor channel it carries.
    pub fn from_extension_tag(tag: &str) -> Option<Self> {
        match tag {
            "{http://www.garmin.com/xmlschemas/TrackPointExtension/v1}atemp" => {
                Some(Self::Temperature)
            }
            "{http://www.garmin.com/xmlschemas/TrackPointExtension/v1}hr" => Some(Self::Heartrate),
            "{http://www.garmin.com/xmlschemas/TrackPointExtension/v1}cad" => Some(Self::Cadence),
            "{http://www.garmin.com/xmlschemas/PowerExtension/v1}PowerInWatts" | "power" => {
                Some(Self::Power)
            }
            "{http://www.garmin.com/xmlschemas/GpxExtensions/v3}Temperature" => {
                Some(Self::Temperature)
            }
            _ => None,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural path from a point's extension list to a sensor value: `(index, tag)` per level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPath(pub Vec<(usize, String)>);

/// Set of attributes the source data supports, computed once at discovery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(u16);

impl Capabilities {
    /// Empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Add `kind`.
    pub fn insert(&mut self, kind: AttributeKind) {
        self.0 |= kind.bit();
    }

    /// Whether `kind` is valid for this activity.
    pub fn contains(self, kind: AttributeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Valid attributes in vocabulary order.
    pub fn iter(self) -> impl Iterator<Item = AttributeKind> {
        AttributeKind::ALL
            .into_iter()
            .filter(move |k| self.contains(*k))
    }

    /// Number of valid attributes.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// `true` when nothing is valid.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<AttributeKind> for Capabilities {
    fn from_iter<I: IntoIterator<Item = AttributeKind>>(iter: I) -> Self {
        let mut caps = Self::empty();
        for k in iter {
            caps.insert(k);
        }
        caps
    }
}

/// Geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// One attribute's ordered samples.
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Scalar samples.
    Numeric(Vec<f64>),
    /// Position samples.
    Course(Vec<LatLon>),
    /// Timestamp samples.
    Time(Vec<DateTime<Utc>>),
}

impl Series {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Course(v) => v.len(),
            Self::Time(v) => v.len(),
        }
    }

    /// `true` when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of samples in `range`.
    pub(crate) fn slice(&self, range: std::ops::Range<usize>) -> Self {
        match self {
            Self::Numeric(v) => Self::Numeric(v[range].to_vec()),
            Self::Course(v) => Self::Course(v[range].to_vec()),
            Self::Time(v) => Self::Time(v[range].to_vec()),
        }
    }

    /// Sample at `index`.
    pub fn value_at(&self, index: usize) -> Option<AttributeValue> {
        match self {
            Self::Numeric(v) => v.get(index).copied().map(AttributeValue::Number),
            Self::Course(v) => v.get(index).copied().map(AttributeValue::Course),
            Self::Time(v) => v.get(index).copied().map(AttributeValue::Time),
        }
    }

    /// Scalar samples, when numeric.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Position samples, when a course.
    pub fn as_course(&self) -> Option<&[LatLon]> {
        match self {
            Self::Course(v) => Some(v),
            _ => None,
        }
    }
}

/// Single-valued snapshot of one attribute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeValue {
    /// Scalar value.
    Number(f64),
    /// Position.
    Course(LatLon),
    /// Timestamp.
    Time(DateTime<Utc>),
}

#[cfg(test)]
#[path = "../../tests/unit/activity/attribute.rs"]
mod tests;
