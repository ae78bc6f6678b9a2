//! Progress reporting for sync runs.
//!
//! Two modes:
//! - Interactive mode (TTY): animated progress bars using indicatif
//! - Logging mode (non-TTY): structured logging using tracing

mod interactive;
mod logging;

use chrono::{DateTime, Utc};
use console::Term;

use atelier::sync::{StreamEvent, SyncProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Interactive progress bars for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (cron, pipes).
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    pub fn heartbeat(&self, at: DateTime<Utc>) {
        match self {
            Self::Interactive(r) => r.heartbeat(at),
            Self::Logging(r) => r.heartbeat(at),
        }
    }

    /// Dispatch one item of the relayed stream.
    pub fn handle_stream(&self, event: StreamEvent) {
        match event {
            StreamEvent::Progress(progress) => self.handle(progress),
            StreamEvent::Heartbeat { at } => self.heartbeat(at),
        }
    }

    /// Finish all progress bars (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
