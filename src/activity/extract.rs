use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    activity::{
        attribute::{AttributeKind, ChannelPath, LatLon, Series},
        discover::Discovery,
    },
    track::model::{Extension, Segment},
};

/// Build every valid attribute's native-rate series in one pass over `segment`.
///
/// Gradient comes back unsmoothed, with index 0 set to `0.0` as a placeholder.
pub(crate) fn extract(segment: &Segment, discovery: &Discovery) -> BTreeMap<AttributeKind, Series> {
    let caps = discovery.capabilities;
    let n = segment.points.len();

    let mut course = Vec::with_capacity(n);
    let mut elevation = Vec::with_capacity(n);
    let mut time = Vec::with_capacity(n);
    let mut speed = Vec::with_capacity(n);
    let mut gradient = Vec::with_capacity(n);
    let mut sensors: BTreeMap<AttributeKind, Vec<f64>> = BTreeMap::new();

    // Gaps carry the previous value forward; leading gaps take the first known one.
    let points = &segment.points;
    let mut last_pos = points
        .iter()
        .find_map(|p| p.position())
        .map(|(lat, lon)| LatLon { lat, lon })
        .unwrap_or(LatLon { lat: 0.0, lon: 0.0 });
    let mut last_ele = points.iter().find_map(|p| p.elevation).unwrap_or(0.0);
    let mut last_time: Option<DateTime<Utc>> = points.iter().find_map(|p| p.time);

    for (i, p) in points.iter().enumerate() {
        if let Some((lat, lon)) = p.position() {
            last_pos = LatLon { lat, lon };
        }
        course.push(last_pos);

        if let Some(e) = p.elevation {
            last_ele = e;
        }
        elevation.push(last_ele);

        if p.time.is_some() {
            last_time = p.time;
        }
        time.push(last_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));

        speed.push(segment.speed_at(i).unwrap_or(0.0));

        let g = i
            .checked_sub(1)
            .and_then(|j| p.elevation_angle_from(&points[j]))
            .unwrap_or(0.0);
        gradient.push(g);

        for (kind, path) in &discovery.channels {
            sensors
                .entry(*kind)
                .or_default()
                .push(channel_value(&p.extensions, path));
        }
    }

    let mut out = BTreeMap::new();
    for kind in caps.iter() {
        let series = match kind {
            AttributeKind::Course => Series::Course(std::mem::take(&mut course)),
            AttributeKind::Elevation => Series::Numeric(std::mem::take(&mut elevation)),
            AttributeKind::Time => Series::Time(std::mem::take(&mut time)),
            AttributeKind::Speed => Series::Numeric(std::mem::take(&mut speed)),
            AttributeKind::Gradient => Series::Numeric(std::mem::take(&mut gradient)),
            AttributeKind::Cadence
            | AttributeKind::Heartrate
            | AttributeKind::Power
            | AttributeKind::Temperature => {
                Series::Numeric(sensors.remove(&kind).unwrap_or_else(|| vec![0.0; n]))
            }
        };
        out.insert(kind, series);
    }
    out
}

/// Follow `path` through `extensions`; misses and unparsable text read as `0.0`.
///
/// At each level the recorded index is tried first, then the level is searched by tag.
pub(crate) fn channel_value(extensions: &[Extension], path: &ChannelPath) -> f64 {
    let mut level = extensions;
    let mut found: Option<&Extension> = None;
    for (index, tag) in &path.0 {
        let hit = level
            .get(*index)
            .filter(|e| &e.tag == tag)
            .or_else(|| level.iter().find(|e| &e.tag == tag));
        match hit {
            Some(e) => {
                found = Some(e);
                level = &e.children;
            }
            None => return 0.0,
        }
    }
    found
        .and_then(|e| e.text.as_deref())
        .and_then(|t| t.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/activity/extract.rs"]
mod tests;
