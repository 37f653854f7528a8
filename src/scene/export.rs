use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use crate::{
    activity::{RawActivity, ResampledActivity, TrimmedActivity},
    compose::{
        compositor::{Compositor, RECLAIM_INTERVAL},
        plan::ElementPlan,
    },
    encode::sink::{FrameRgba, FrameSink, SinkConfig},
    figure::chart::build_figure,
    foundation::{
        core::{Canvas, FrameStamp},
        error::{OverlayError, OverlayResult},
    },
    scene::frames::{Frame, build_frames},
    template::model::Template,
};

/// Counters reported by [`Scene::export`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames planned.
    pub frames_total: u64,
    /// Frames written to the sink.
    pub frames_written: u64,
    /// Frames the sink reported as encoded when it finished.
    pub frames_encoded: u64,
}

/// One render job: an activity window bound to a template.
///
/// Usage follows the pipeline order: [`Scene::build_figures`], [`Scene::build_frames`], then
/// [`Scene::export`]. [`Scene::render_preview`] only needs the figures.
pub struct Scene {
    template: Arc<Template>,
    trimmed: TrimmedActivity,
    resampled: ResampledActivity,
    fonts_dir: Option<PathBuf>,
    frames: Vec<Frame>,
    compositor: Option<Compositor>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("seconds", &self.seconds())
            .field("frames", &self.frames.len())
            .field("compositor", &self.compositor)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Trim `activity` to the template window and resample it to the template frame rate.
    #[tracing::instrument(skip_all)]
    pub fn new(
        activity: &RawActivity,
        template: Template,
        fonts_dir: Option<PathBuf>,
    ) -> OverlayResult<Self> {
        let start = template.scene.start.unwrap_or(0);
        let end = template
            .scene
            .end
            .unwrap_or_else(|| activity.duration_seconds());
        let trimmed = activity.trim(start, end)?;
        let resampled = trimmed.resample(template.scene.fps);
        tracing::info!(
            start,
            end,
            fps = template.scene.fps.get(),
            attributes = activity.capabilities().len(),
            "scene ready"
        );
        Ok(Self {
            template: Arc::new(template),
            trimmed,
            resampled,
            fonts_dir,
            frames: Vec::new(),
            compositor: None,
        })
    }

    /// Resolved template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Seconds in the rendered window.
    pub fn seconds(&self) -> u32 {
        self.resampled.seconds()
    }

    /// Output size (even-rounded).
    pub fn canvas(&self) -> Canvas {
        self.template.scene.canvas().even()
    }

    /// Per-frame attribute data.
    pub fn activity(&self) -> &ResampledActivity {
        &self.resampled
    }

    /// Frames built so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Compositor, once figures are built.
    pub fn compositor(&self) -> Option<&Compositor> {
        self.compositor.as_ref()
    }

    /// Build chart backgrounds from the native-rate window and draw the static base canvas.
    #[tracing::instrument(skip(self))]
    pub fn build_figures(&mut self) -> OverlayResult<()> {
        let capabilities = self.trimmed.capabilities();
        let plan = ElementPlan::new(&self.template, capabilities);
        let scene_canvas = self.template.scene.canvas();
        let mut figures = BTreeMap::new();
        for i in plan.plots() {
            figures.insert(
                i,
                build_figure(&self.template.plots[i], scene_canvas, &self.trimmed)?,
            );
        }
        self.compositor = Some(Compositor::new(
            Arc::clone(&self.template),
            capabilities,
            figures,
            self.fonts_dir.clone(),
        )?);
        Ok(())
    }

    /// Materialize the frame list for the first `seconds` of the window.
    #[tracing::instrument(skip(self))]
    pub fn build_frames(&mut self, seconds: u32) -> OverlayResult<()> {
        self.frames = build_frames(&self.resampled, seconds)?;
        tracing::debug!(frames = self.frames.len(), "frames built");
        Ok(())
    }

    /// Stream every frame into `sink` in index order.
    ///
    /// Per frame: poll `cancel`, check the sink is alive, composite and write, then report
    /// `progress(generated, total, encoded)`. Cancellation and mid-stream failures abort the sink,
    /// which discards partial output.
    #[tracing::instrument(skip_all, fields(frames = self.frames.len()))]
    pub fn export(
        &mut self,
        sink: &mut dyn FrameSink,
        mut progress: impl FnMut(u64, u64, u64),
        cancel: impl Fn() -> bool,
    ) -> OverlayResult<ExportStats> {
        let compositor = self.compositor.as_mut().ok_or_else(|| {
            OverlayError::evaluation("figures must be built before export")
        })?;
        if self.frames.is_empty() {
            return Err(OverlayError::validation("no frames to export"));
        }

        let canvas = compositor.canvas();
        let total = self.frames.len() as u64;
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.template.scene.fps,
            total_frames: total,
        })?;
        tracing::info!(total, width = canvas.width, height = canvas.height, "export started");

        let mut buf = FrameRgba::new(canvas);
        for frame in &self.frames {
            if cancel() {
                tracing::info!(frame = frame.index.0, "export cancelled");
                if let Err(abort) = sink.abort() {
                    tracing::warn!(error = %abort, "sink cleanup failed after cancel");
                }
                return Err(OverlayError::Cancelled {
                    frame: frame.index.0,
                });
            }
            if let Err(e) = write_frame(sink, compositor, frame, &mut buf) {
                tracing::error!(frame = frame.index.0, error = %e, "export failed");
                if let Err(abort) = sink.abort() {
                    tracing::warn!(error = %abort, "sink cleanup failed");
                }
                return Err(e);
            }

            let generated = frame.index.0 + 1;
            progress(generated, total, sink.encoded_frames());
            if generated.is_multiple_of(RECLAIM_INTERVAL) {
                compositor.reclaim();
            }
        }

        sink.end()?;
        let stats = ExportStats {
            frames_total: total,
            frames_written: total,
            frames_encoded: sink.encoded_frames(),
        };
        tracing::info!(?stats, "export finished");
        Ok(stats)
    }

    /// Composite the first frame of `second` without touching any sink.
    pub fn render_preview(&mut self, second: u32) -> OverlayResult<FrameRgba> {
        if second >= self.seconds() {
            return Err(OverlayError::bounds(format!(
                "preview second {second} is outside the {}s window",
                self.seconds()
            )));
        }
        if self.compositor.is_none() {
            self.build_figures()?;
        }
        let compositor = self
            .compositor
            .as_mut()
            .ok_or_else(|| OverlayError::evaluation("figures must be built before preview"))?;
        let stamp = FrameStamp { second, sub: 0 };
        let values = self.resampled.snapshot(stamp)?;
        let mut out = FrameRgba::new(compositor.canvas());
        compositor.compose(stamp, &values, &mut out.data)?;
        Ok(out)
    }
}

fn write_frame(
    sink: &mut dyn FrameSink,
    compositor: &mut Compositor,
    frame: &Frame,
    buf: &mut FrameRgba,
) -> OverlayResult<()> {
    sink.check_alive(frame.index)?;
    compositor.compose(frame.stamp, &frame.values, &mut buf.data)?;
    sink.push_frame(frame.index, buf)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/export.rs"]
mod tests;
