//! Chart figures: course map and elevation profile backgrounds with marker placement.

pub(crate) mod chart;
pub(crate) mod projection;
