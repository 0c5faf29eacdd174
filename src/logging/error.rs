use thiserror::Error;

/// Errors surfaced to callers of the logging API.
///
/// Failing to open a log file is deliberately absent: it is reported on the
/// fallback channel and never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// A severity rank or name outside DEBUG, INFO, WARNING, ERROR, CRITICAL
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A log file mode other than truncate ("w") or append ("a")
    #[error("Invalid log file mode: {0}")]
    InvalidFileMode(String),

    /// The logger handle was already closed
    #[error("Logger '{0}' is closed")]
    Closed(String),
}
