//! Frame sinks: the ordering contract, an in-memory sink and the encoder subprocess sink.

pub(crate) mod diagnostics;
pub(crate) mod ffmpeg;
pub(crate) mod sink;
