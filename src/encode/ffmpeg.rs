use std::{
    ffi::OsString,
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
    sync::{Arc, Mutex},
    thread::JoinHandle,
};

use crate::{
    encode::{
        diagnostics::{Diagnostics, FfmpegProgress, ProgressSource, lock, spawn_reader},
        sink::{FrameRgba, FrameSink, SinkConfig, check_order},
    },
    foundation::{
        core::FrameIndex,
        error::{OverlayError, OverlayResult},
        math::unpremultiply_rgba8,
    },
};

/// How to launch an encoder that reads raw straight-alpha RGBA8 frames on stdin.
pub trait EncoderBackend: Send + Sync + std::fmt::Debug {
    /// Command writing `cfg`-shaped frames from stdin into `out_path`.
    fn command(&self, cfg: &SinkConfig, out_path: &Path) -> Command;

    /// Parser for the process's stderr.
    fn progress_source(&self) -> Arc<dyn ProgressSource> {
        Arc::new(FfmpegProgress)
    }
}

/// `ffmpeg` writing ProRes 4444 with a 10-bit alpha plane.
#[derive(Clone, Debug)]
pub struct FfmpegProRes {
    /// Executable name or path.
    pub program: PathBuf,
}

impl Default for FfmpegProRes {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegProRes {
    /// Use `program` as the ffmpeg executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments after the program name.
    pub fn args(cfg: &SinkConfig, out_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-loglevel".to_owned(),
            "info".to_owned(),
            "-f".to_owned(),
            "rawvideo".to_owned(),
            "-s".to_owned(),
            format!("{}x{}", cfg.width, cfg.height),
            "-pix_fmt".to_owned(),
            "rgba".to_owned(),
            "-r".to_owned(),
            cfg.fps.get().to_string(),
            "-i".to_owned(),
            "-".to_owned(),
            "-c:v".to_owned(),
            "prores_ks".to_owned(),
            "-pix_fmt".to_owned(),
            "yuva444p10le".to_owned(),
            "-y".to_owned(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(out_path.as_os_str().to_owned());
        args
    }
}

impl EncoderBackend for FfmpegProRes {
    fn command(&self, cfg: &SinkConfig, out_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(cfg, out_path));
        cmd
    }
}

/// Sink that spawns an encoder process and streams frames to its stdin.
///
/// Frames arrive premultiplied and are written straight-alpha, which is what `-pix_fmt rgba`
/// means to ffmpeg. Stderr is drained on a background thread that tracks the encoded-frame counter.
pub struct EncoderSink {
    backend: Arc<dyn EncoderBackend>,
    out_path: PathBuf,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader: Option<JoinHandle<()>>,
    diagnostics: Arc<Mutex<Diagnostics>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for EncoderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSink")
            .field("backend", &self.backend)
            .field("out_path", &self.out_path)
            .field("running", &self.child.is_some())
            .field("last_idx", &self.last_idx)
            .finish_non_exhaustive()
    }
}

impl EncoderSink {
    /// Sink launching `backend` to write `out_path`.
    pub fn new(backend: Arc<dyn EncoderBackend>, out_path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            out_path: out_path.into(),
            child: None,
            stdin: None,
            reader: None,
            diagnostics: Arc::new(Mutex::new(Diagnostics::default())),
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Sink using `ffmpeg` from `PATH`.
    pub fn ffmpeg(out_path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FfmpegProRes::default()), out_path)
    }

    /// Output file path.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }

    fn diagnostics_tail(&self) -> String {
        lock(&self.diagnostics).tail()
    }

    fn join_reader(&mut self) -> OverlayResult<()> {
        if let Some(handle) = self.reader.take() {
            handle
                .join()
                .map_err(|_| OverlayError::encoder("encoder diagnostic reader panicked"))?;
        }
        Ok(())
    }
}

impl FrameSink for EncoderSink {
    #[tracing::instrument(skip(self), fields(out = %self.out_path.display()))]
    fn begin(&mut self, cfg: SinkConfig) -> OverlayResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(OverlayError::validation(
                "encoder sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(OverlayError::validation(
                "encoder sink width/height must be even",
            ));
        }
        ensure_parent_dir(&self.out_path)?;

        let mut cmd = self.backend.command(&cfg, &self.out_path);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        tracing::info!(command = ?cmd, "starting encoder");

        let mut child = cmd.spawn().map_err(|e| {
            OverlayError::encoder(format!(
                "failed to start encoder '{}': {e}",
                cmd.get_program().to_string_lossy()
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OverlayError::encoder("failed to open encoder stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| OverlayError::encoder("failed to open encoder stderr"))?;

        self.diagnostics = Arc::new(Mutex::new(Diagnostics::default()));
        let reader = spawn_reader(
            stderr,
            self.backend.progress_source(),
            Arc::clone(&self.diagnostics),
        )
        .map_err(|e| OverlayError::encoder(format!("failed to spawn diagnostic reader: {e}")))?;

        self.scratch = vec![0u8; cfg.canvas().rgba_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.reader = Some(reader);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn check_alive(&mut self, idx: FrameIndex) -> OverlayResult<()> {
        let Some(child) = self.child.as_mut() else {
            return Err(OverlayError::evaluation("encoder sink not started"));
        };
        let status = child
            .try_wait()
            .map_err(|e| OverlayError::encoder(format!("failed to poll encoder: {e}")))?;
        let Some(status) = status else {
            return Ok(());
        };
        tracing::error!(frame = idx.0, %status, "encoder exited unexpectedly");
        Err(OverlayError::ProcessDied {
            frame: idx.0,
            exit_code: status.code(),
            diagnostics: self.diagnostics_tail(),
        })
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> OverlayResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| OverlayError::evaluation("encoder sink not started"))?;
        check_order(self.last_idx, idx)?;
        if frame.canvas() != cfg.canvas() || frame.data.len() != self.scratch.len() {
            return Err(OverlayError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        unpremultiply_rgba8(&mut self.scratch, &frame.data);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(OverlayError::evaluation("encoder sink is already finalized"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|source| OverlayError::EncodingBroken {
                frame: idx.0,
                source,
            })?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn encoded_frames(&self) -> u64 {
        lock(&self.diagnostics).encoded()
    }

    fn end(&mut self) -> OverlayResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| OverlayError::evaluation("encoder sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| OverlayError::encoder(format!("failed to wait for encoder: {e}")))?;
        self.join_reader()?;
        self.cfg = None;

        if !status.success() {
            tracing::error!(%status, "encoder failed");
            return Err(OverlayError::EncodeFailed {
                exit_code: status.code(),
                diagnostics: self.diagnostics_tail(),
            });
        }
        tracing::info!(
            out = %self.out_path.display(),
            encoded = self.encoded_frames(),
            "encoder finished"
        );
        Ok(())
    }

    fn abort(&mut self) -> OverlayResult<()> {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "encoder already exited");
            }
            child
                .wait()
                .map_err(|e| OverlayError::encoder(format!("failed to wait for encoder: {e}")))?;
        }
        self.join_reader()?;
        self.cfg = None;

        match std::fs::remove_file(&self.out_path) {
            Ok(()) => tracing::info!(out = %self.out_path.display(), "partial output removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!(
                        "remove partial output '{}'",
                        self.out_path.display()
                    ))
                    .into());
            }
        }
        Ok(())
    }
}

impl Drop for EncoderSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> OverlayResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `program -version` runs successfully.
pub fn is_encoder_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
