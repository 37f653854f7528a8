use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Frame durations averaged for the remaining-time estimate.
pub const ETA_WINDOW: usize = 20;

/// Message recorded when a render is cancelled.
pub const CANCELLED_MESSAGE: &str = "Rendering cancelled by user";

/// Lifecycle of a render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Frames are being produced.
    Rendering,
    /// Output written successfully.
    Complete,
    /// Render failed.
    Error,
    /// Render stopped on request.
    Cancelled,
}

/// Point-in-time copy of a [`RenderProgress`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ProgressSnapshot {
    /// Frames generated.
    pub current: u64,
    /// Frames planned.
    pub total: u64,
    /// Frames the encoder reports as written.
    pub encoded: u64,
    /// Lifecycle state.
    pub status: RenderStatus,
    /// Human-readable status line.
    pub message: String,
    /// Seconds until all frames are generated, when estimable.
    pub estimated_seconds_remaining: Option<f64>,
}

#[derive(Debug, Default)]
struct ProgressState {
    current: u64,
    total: u64,
    encoded: u64,
    status: RenderStatus,
    message: String,
    started: Option<Instant>,
    last_frame: Option<Instant>,
    durations: VecDeque<Duration>,
}

impl ProgressState {
    fn eta_at(&self, now: Instant) -> Option<f64> {
        if self.current == 0 {
            return None;
        }
        let per_frame = if self.durations.is_empty() {
            now.duration_since(self.started?).as_secs_f64() / self.current as f64
        } else {
            self.durations.iter().map(Duration::as_secs_f64).sum::<f64>()
                / self.durations.len() as f64
        };
        Some(per_frame * self.total.saturating_sub(self.current) as f64)
    }
}

/// Progress record of one render, written by the export loop and read by pollers.
#[derive(Debug, Default)]
pub struct RenderProgress {
    state: Mutex<ProgressState>,
}

impl RenderProgress {
    /// Idle record.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Reset for a new render of `total` frames.
    pub fn start(&self, total: u64) {
        self.start_at(total, Instant::now());
    }

    pub(crate) fn start_at(&self, total: u64, now: Instant) {
        *self.lock() = ProgressState {
            total,
            status: RenderStatus::Rendering,
            message: "Rendering frames".to_owned(),
            started: Some(now),
            ..ProgressState::default()
        };
    }

    /// Record that `current` of `total` frames are generated and `encoded` are written.
    pub fn record_frame(&self, current: u64, total: u64, encoded: u64) {
        self.record_frame_at(current, total, encoded, Instant::now());
    }

    pub(crate) fn record_frame_at(&self, current: u64, total: u64, encoded: u64, now: Instant) {
        let mut s = self.lock();
        if let Some(prev) = s.last_frame.or(s.started) {
            if s.durations.len() == ETA_WINDOW {
                s.durations.pop_front();
            }
            s.durations.push_back(now.saturating_duration_since(prev));
        }
        s.last_frame = Some(now);
        s.current = current;
        s.total = total;
        s.encoded = encoded;
        if s.status == RenderStatus::Rendering {
            s.message = format!("Rendering frame {current}/{total}");
        }
    }

    /// Final state of the render.
    pub fn finish(&self, status: RenderStatus, message: impl Into<String>) {
        let mut s = self.lock();
        s.status = status;
        s.message = message.into();
    }

    /// Raise `cancel` and mark a running render as cancelled.
    pub fn request_cancel(&self, cancel: &CancelFlag) {
        cancel.request();
        let mut s = self.lock();
        if s.status == RenderStatus::Rendering {
            s.status = RenderStatus::Cancelled;
            s.message = CANCELLED_MESSAGE.to_owned();
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        let s = self.lock();
        ProgressSnapshot {
            current: s.current,
            total: s.total,
            encoded: s.encoded,
            status: s.status,
            message: s.message.clone(),
            estimated_seconds_remaining: s.eta_at(now),
        }
    }
}

/// Externally settable cancellation signal, polled once per frame.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running render to stop. Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new render.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/progress.rs"]
mod tests;
