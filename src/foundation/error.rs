/// Convenience result type used across the crate.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Top-level error taxonomy used by pipeline and export APIs.
#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    /// Invalid user-provided template or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Track data could not be read or does not contain usable points.
    #[error("track error: {0}")]
    Track(String),

    /// Requested window lies outside the activity timeline.
    #[error("bounds error: {0}")]
    Bounds(String),

    /// Errors while drawing figures or frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Encoder process could not be launched or waited on.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// Encoder exited while frames were still being streamed.
    #[error("encoder process died at frame {frame} (exit {}){}", fmt_exit(*exit_code), fmt_diag(diagnostics))]
    ProcessDied {
        /// Index of the frame that was about to be written.
        frame: u64,
        /// Exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Tail of captured diagnostic output.
        diagnostics: String,
    },

    /// Writing pixels into the encoder input failed.
    #[error("encoding broken at frame {frame}: {source}")]
    EncodingBroken {
        /// Index of the frame being written.
        frame: u64,
        /// Underlying pipe error.
        #[source]
        source: std::io::Error,
    },

    /// Encoder exited with a non-zero status after the input was closed.
    #[error("encoding failed (exit {}){}", fmt_exit(*exit_code), fmt_diag(diagnostics))]
    EncodeFailed {
        /// Exit code, `None` when terminated by a signal.
        exit_code: Option<i32>,
        /// Tail of captured diagnostic output.
        diagnostics: String,
    },

    /// Render was cancelled by the caller.
    #[error("rendering cancelled at frame {frame}")]
    Cancelled {
        /// Index of the first frame that was not written.
        frame: u64,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OverlayError {
    /// Build an [`OverlayError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`OverlayError::Track`] value.
    pub fn track(msg: impl Into<String>) -> Self {
        Self::Track(msg.into())
    }

    /// Build an [`OverlayError::Bounds`] value.
    pub fn bounds(msg: impl Into<String>) -> Self {
        Self::Bounds(msg.into())
    }

    /// Build an [`OverlayError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build an [`OverlayError::Encoder`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Return `true` for a caller-requested cancellation, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn fmt_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_owned(),
    }
}

fn fmt_diag(diagnostics: &str) -> String {
    let d = diagnostics.trim();
    if d.is_empty() {
        String::new()
    } else {
        format!(": {d}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
