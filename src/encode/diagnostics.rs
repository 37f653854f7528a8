//! Encoder diagnostic stream: progress parsing and the background reader that drains it.

use std::{
    collections::VecDeque,
    io::{BufRead as _, BufReader, Read},
    sync::{Arc, LazyLock, Mutex},
    thread::JoinHandle,
};

/// Lines of diagnostic output retained for error reports.
pub const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Severity tag of one diagnostic line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Line mentions an error.
    Error,
    /// Line mentions a warning.
    Warning,
    /// Anything else.
    Info,
}

/// Parses an encoder's diagnostic lines.
///
/// Isolates the text format of one encoder so the export loop never sees it.
pub trait ProgressSource: Send + Sync {
    /// Encoded-frame counter carried by `line`, if any.
    fn encoded_frames(&self, line: &str) -> Option<u64>;

    /// Severity of `line`.
    fn severity(&self, line: &str) -> Severity {
        let lower = line.to_ascii_lowercase();
        if lower.contains("error") {
            Severity::Error
        } else if lower.contains("warning") {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

/// Progress parser for `ffmpeg` stats lines (`frame=  123 fps=...`).
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegProgress;

static FRAME_RE: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"frame=\s*(\d+)").ok());

impl ProgressSource for FfmpegProgress {
    fn encoded_frames(&self, line: &str) -> Option<u64> {
        FRAME_RE
            .as_ref()?
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// State shared between the diagnostic reader and the export loop.
#[derive(Debug, Default)]
pub struct Diagnostics {
    encoded: u64,
    tail: VecDeque<String>,
}

impl Diagnostics {
    /// Highest encoded-frame counter seen.
    pub fn encoded(&self) -> u64 {
        self.encoded
    }

    /// Last retained lines joined with newlines.
    pub fn tail(&self) -> String {
        self.tail.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    fn record(&mut self, source: &dyn ProgressSource, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(n) = source.encoded_frames(line) {
            self.encoded = self.encoded.max(n);
        }
        match source.severity(line) {
            Severity::Error => tracing::error!(target: "encoder", "{line}"),
            Severity::Warning => tracing::warn!(target: "encoder", "{line}"),
            Severity::Info => tracing::trace!(target: "encoder", "{line}"),
        }
        if self.tail.len() == DIAGNOSTIC_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_owned());
    }
}

/// Lock `shared`, recovering the data if a holder panicked.
pub(crate) fn lock(shared: &Mutex<Diagnostics>) -> std::sync::MutexGuard<'_, Diagnostics> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Feed every line of `stream` through `source` into `shared`.
///
/// Lines end at `\n` or `\r`; ffmpeg rewrites its stats line with carriage returns.
pub(crate) fn read_diagnostics(
    stream: impl Read,
    source: &dyn ProgressSource,
    shared: &Mutex<Diagnostics>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        let buf = match reader.fill_buf() {
            Ok([]) => break,
            Ok(buf) => buf,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let consumed = buf.len();
        for &b in buf {
            if b == b'\n' || b == b'\r' {
                lock(shared).record(source, &String::from_utf8_lossy(&line));
                line.clear();
            } else {
                line.push(b);
            }
        }
        reader.consume(consumed);
    }
    if !line.is_empty() {
        lock(shared).record(source, &String::from_utf8_lossy(&line));
    }
    Ok(())
}

/// Drain `stream` on a background thread; draining keeps the encoder from blocking on a full pipe.
pub(crate) fn spawn_reader(
    stream: impl Read + Send + 'static,
    source: Arc<dyn ProgressSource>,
    shared: Arc<Mutex<Diagnostics>>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("encoder-diagnostics".to_owned())
        .spawn(move || {
            if let Err(e) = read_diagnostics(stream, source.as_ref(), &shared) {
                tracing::warn!(error = %e, "encoder diagnostic stream read failed");
            }
        })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/diagnostics.rs"]
mod tests;
