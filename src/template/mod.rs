//! Overlay templates: typed element configuration and the scene-default resolver.

pub(crate) mod model;
pub(crate) mod resolve;
