use crate::{
    activity::{AttributeSnapshot, ResampledActivity},
    foundation::{
        core::{FrameIndex, FrameStamp},
        error::{OverlayError, OverlayResult},
    },
};

/// One output frame and the attribute values it shows.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Position in export order.
    pub index: FrameIndex,
    /// Second and sub-second step.
    pub stamp: FrameStamp,
    /// Values of every valid attribute.
    pub values: AttributeSnapshot,
}

/// Materialize frames for the first `seconds` of `activity`, second-major.
pub fn build_frames(activity: &ResampledActivity, seconds: u32) -> OverlayResult<Vec<Frame>> {
    if seconds > activity.seconds() {
        return Err(OverlayError::bounds(format!(
            "cannot build {seconds}s of frames from a {}s window",
            activity.seconds()
        )));
    }
    let fps = activity.fps();
    let mut frames = Vec::with_capacity(fps.frames_in(seconds) as usize);
    for second in 0..seconds {
        for sub in 0..fps.get() {
            let stamp = FrameStamp { second, sub };
            frames.push(Frame {
                index: stamp.index(fps),
                stamp,
                values: activity.snapshot(stamp)?,
            });
        }
    }
    Ok(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/frames.rs"]
mod tests;
