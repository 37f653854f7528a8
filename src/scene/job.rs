use std::{path::PathBuf, sync::Arc};

use crate::{
    activity::{RawActivity, gradient::SmoothingParams},
    encode::ffmpeg::{EncoderBackend, EncoderSink, FfmpegProRes},
    foundation::error::OverlayResult,
    scene::{
        export::Scene,
        progress::{CANCELLED_MESSAGE, CancelFlag, RenderProgress, RenderStatus},
    },
    template::model::Template,
    track::model::Track,
};

/// Options for [`render_video`].
#[derive(Clone, Debug)]
pub struct ExportOpts {
    /// Encoder launched for the output file.
    pub encoder: Arc<dyn EncoderBackend>,
    /// Directory bare font names resolve against.
    pub fonts_dir: Option<PathBuf>,
    /// Output path; defaults to the template's `overlay_filename`.
    pub output: Option<PathBuf>,
    /// Gradient smoothing constants.
    pub smoothing: SmoothingParams,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            encoder: Arc::new(FfmpegProRes::default()),
            fonts_dir: None,
            output: None,
            smoothing: SmoothingParams::default(),
        }
    }
}

/// Render `track` through `template` into a video file and return its path.
///
/// Resets `cancel`, drives `progress` through the render and leaves it `complete`, `cancelled`
/// or `error`. Only one render may use a given progress record at a time.
#[tracing::instrument(skip_all)]
pub fn render_video(
    track: &Track,
    template: Template,
    opts: &ExportOpts,
    progress: &RenderProgress,
    cancel: &CancelFlag,
) -> OverlayResult<PathBuf> {
    cancel.reset();
    progress.start(0);

    let result = run(track, template, opts, progress, cancel);
    match &result {
        Ok(path) => progress.finish(
            RenderStatus::Complete,
            format!("Video saved to {}", path.display()),
        ),
        Err(e) if e.is_cancelled() => progress.finish(RenderStatus::Cancelled, CANCELLED_MESSAGE),
        Err(e) => {
            tracing::error!(error = %e, "render failed");
            progress.finish(RenderStatus::Error, e.to_string());
        }
    }
    result
}

fn run(
    track: &Track,
    template: Template,
    opts: &ExportOpts,
    progress: &RenderProgress,
    cancel: &CancelFlag,
) -> OverlayResult<PathBuf> {
    let activity = RawActivity::from_track_with(track, &opts.smoothing)?;
    let out = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&template.scene.overlay_filename));

    let mut scene = Scene::new(&activity, template, opts.fonts_dir.clone())?;
    scene.build_figures()?;
    scene.build_frames(scene.seconds())?;
    progress.start(scene.frames().len() as u64);

    let mut sink = EncoderSink::new(Arc::clone(&opts.encoder), &out);
    scene.export(
        &mut sink,
        |generated, total, encoded| progress.record_frame(generated, total, encoded),
        || cancel.is_requested(),
    )?;
    Ok(out)
}
