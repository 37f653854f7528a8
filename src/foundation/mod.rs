//! Shared primitives: frame addressing, canvas and color types, error taxonomy, pixel math.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
pub(crate) mod raster;
