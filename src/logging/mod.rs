mod error;
mod formatters;
mod logger;
mod registry;
mod severity;
mod sinks;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

pub use error::LogError;
pub use formatters::DefaultFormatter;
pub use logger::{Builder, Logger};
pub use registry::Registry;
pub use severity::Severity;
pub use sinks::{FileMode, FileSink, LogTarget, SharedStream, SinkKind, StreamSink};

/// One message on its way to the sinks.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub label: &'a str,
    pub message: &'a str,
}

pub trait LogFormatter: Sync + Send {
    fn format(&self, record: &Record<'_>) -> String;
}

/// A destination for formatted lines with its own minimum severity.
///
/// Sinks keep the formatter of the logger that attached them, so lines
/// written through any handle of a label keep the attaching handle's layout.
pub trait LogSink: Sync + Send {
    fn kind(&self) -> SinkKind;
    fn min_level(&self) -> Severity;
    fn formatter(&self) -> &Arc<dyn LogFormatter>;

    /// Appends `line` plus a newline and flushes.
    fn write_line(&self, line: &str) -> eyre::Result<()>;
    fn flush(&self);

    fn should_emit(&self, severity: Severity) -> bool {
        severity >= self.min_level()
    }

    /// Only writers opened by the sink itself are closed on detach.
    fn owns_writer(&self) -> bool {
        false
    }

    fn close(&self) {}
}

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
