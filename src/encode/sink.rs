use crate::foundation::{
    core::{Canvas, Fps, FrameIndex},
    error::{OverlayError, OverlayResult},
    math::unpremultiply_rgba8,
};

/// One composited frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major.
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Transparent frame of `canvas` size.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
        }
    }

    /// Frame size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Straight-alpha copy of the pixels, as image files expect.
    pub fn to_straight_alpha(&self) -> Vec<u8> {
        let mut out = vec![0; self.data.len()];
        unpremultiply_rgba8(&mut out, &self.data);
        out
    }
}

/// Configuration provided to a [`FrameSink`] at the start of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Frames that will be pushed.
    pub total_frames: u64,
}

impl SinkConfig {
    /// Frame size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Sink contract for consuming composited frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order with no
/// gaps; implementations reject anything else.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> OverlayResult<()>;
    /// Fail with [`OverlayError::ProcessDied`] when the consumer has already exited.
    fn check_alive(&mut self, _idx: FrameIndex) -> OverlayResult<()> {
        Ok(())
    }
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> OverlayResult<()>;
    /// Frames the consumer reports as fully encoded so far.
    fn encoded_frames(&self) -> u64;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> OverlayResult<()>;
    /// Stop early and discard partial output.
    fn abort(&mut self) -> OverlayResult<()>;
}

/// Reject frames that break the strictly-increasing, gap-free order.
pub(crate) fn check_order(last: Option<FrameIndex>, idx: FrameIndex) -> OverlayResult<()> {
    let expected = last.map_or(0, |l| l.0 + 1);
    if idx.0 != expected {
        return Err(OverlayError::evaluation(format!(
            "sink received frame {} out of order (expected {expected})",
            idx.0
        )));
    }
    Ok(())
}

/// In-memory sink for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRgba)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRgba)] {
        &self.frames
    }

    /// `true` once `end` completed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// `true` once `abort` ran.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> OverlayResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> OverlayResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| OverlayError::evaluation("in-memory sink not started"))?;
        if frame.canvas() != cfg.canvas() {
            return Err(OverlayError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        check_order(self.frames.last().map(|(i, _)| *i), idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn encoded_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    fn end(&mut self) -> OverlayResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) -> OverlayResult<()> {
        self.frames.clear();
        self.aborted = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
