use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{OverlayError, OverlayResult},
    track::model::{Extension, Segment, Track, TrackPoint},
};

impl Track {
    /// Read and parse a GPX file.
    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read gpx '{}'", path.display()))?;
        Self::from_gpx_str(&text)
    }

    /// Parse GPX 1.0/1.1 text. Only `trk/trkseg/trkpt` content is read.
    pub fn from_gpx_str(text: &str) -> OverlayResult<Self> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| OverlayError::track(format!("invalid gpx xml: {e}")))?;
        let root = doc.root_element();
        if root.tag_name().name() != "gpx" {
            return Err(OverlayError::track(format!(
                "expected <gpx> root element, found <{}>",
                root.tag_name().name()
            )));
        }

        let mut track = Track::default();
        for trk in elements(root, "trk") {
            for seg in elements(trk, "trkseg") {
                let points = elements(seg, "trkpt")
                    .map(parse_point)
                    .collect::<OverlayResult<Vec<_>>>()?;
                track.segments.push(Segment { points });
            }
        }

        if track.segments.iter().all(|s| s.points.is_empty()) {
            return Err(OverlayError::track("gpx contains no track points"));
        }
        Ok(track)
    }
}

fn elements<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    local: &'static str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == local)
}

fn parse_point(node: roxmltree::Node<'_, '_>) -> OverlayResult<TrackPoint> {
    let coord = |name: &str| -> OverlayResult<Option<f64>> {
        node.attribute(name)
            .map(|v| {
                v.trim().parse::<f64>().map_err(|_| {
                    OverlayError::track(format!("trkpt {name} attribute is not a number: {v:?}"))
                })
            })
            .transpose()
    };

    let mut point = TrackPoint {
        lat: coord("lat")?,
        lon: coord("lon")?,
        ..TrackPoint::default()
    };

    for child in node.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "ele" => point.elevation = child.text().and_then(|t| t.trim().parse().ok()),
            "time" => point.time = child.text().and_then(parse_time),
            "extensions" => {
                point.extensions = child
                    .children()
                    .filter(|c| c.is_element())
                    .map(parse_extension)
                    .collect();
            }
            _ => {}
        }
    }
    Ok(point)
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_extension(node: roxmltree::Node<'_, '_>) -> Extension {
    let name = node.tag_name();
    let tag = match name.namespace() {
        Some(ns) => format!("{{{ns}}}{}", name.name()),
        None => name.name().to_owned(),
    };
    let text = node
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    Extension {
        tag,
        text,
        children: node
            .children()
            .filter(|c| c.is_element())
            .map(parse_extension)
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/gpx.rs"]
mod tests;
