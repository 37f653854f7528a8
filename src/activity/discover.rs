use std::collections::BTreeMap;

use crate::{
    activity::attribute::{AttributeKind, Capabilities, ChannelPath},
    track::model::{Extension, TrackPoint},
};

/// Result of probing a point sample for supported attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Discovery {
    /// Valid attribute set.
    pub capabilities: Capabilities,
    /// Where each discovered sensor channel lives in the extension tree.
    pub channels: BTreeMap<AttributeKind, ChannelPath>,
}

/// Probe the first, middle and last points and union what they support.
///
/// Sensor channels are searched one and two levels deep; when several probes expose the same
/// channel, the path from the last one wins.
pub fn discover(points: &[TrackPoint]) -> Discovery {
    let mut out = Discovery::default();
    if points.is_empty() {
        return out;
    }

    let probes = [0, points.len() / 2, points.len() - 1];
    for &i in &probes {
        let p = &points[i];
        if p.position().is_some() {
            out.capabilities.insert(AttributeKind::Course);
            out.capabilities.insert(AttributeKind::Speed);
        }
        if p.time.is_some() {
            out.capabilities.insert(AttributeKind::Time);
        }
        if p.elevation.is_some() {
            out.capabilities.insert(AttributeKind::Elevation);
        }
        probe_extensions(&p.extensions, &mut out);
    }

    if out.capabilities.contains(AttributeKind::Course)
        && out.capabilities.contains(AttributeKind::Elevation)
    {
        out.capabilities.insert(AttributeKind::Gradient);
    }
    out
}

fn probe_extensions(extensions: &[Extension], out: &mut Discovery) {
    for (i, ext) in extensions.iter().enumerate() {
        if let Some(kind) = AttributeKind::from_extension_tag(&ext.tag) {
            out.capabilities.insert(kind);
            out.channels
                .insert(kind, ChannelPath(vec![(i, ext.tag.clone())]));
        }
        for (j, child) in ext.children.iter().enumerate() {
            if let Some(kind) = AttributeKind::from_extension_tag(&child.tag) {
                out.capabilities.insert(kind);
                out.channels.insert(
                    kind,
                    ChannelPath(vec![(i, ext.tag.clone()), (j, child.tag.clone())]),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/activity/discover.rs"]
mod tests;
