//! Recorded activity tracks: point model, segment speed query and the GPX reader.

pub(crate) mod gpx;
pub(crate) mod model;
