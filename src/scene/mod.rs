//! Render orchestration: frame list, export loop, progress record and the render job.

pub(crate) mod export;
pub(crate) mod frames;
pub(crate) mod job;
pub(crate) mod progress;
