//! Label-keyed loggers writing to shared console streams and log files.
//!
//! Every [`Logger`] built with the same label on the same [`Registry`] is the
//! same logical logger: sinks attached through one handle receive the
//! messages of all of them, and each label owns at most one log file.
//!
//! ```rust,no_run
//! use labellog::{FileMode, Logger, Severity};
//!
//! let log = Logger::new("worker");
//! log.set_log_file("worker.log", FileMode::Append, Severity::Info).unwrap();
//! log.info("started");
//! ```

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{
    Builder, DefaultFormatter, FileMode, FileSink, LogError, LogFormatter, LogSink, LogTarget,
    Logger, Record, Registry, Severity, SharedStream, SinkKind, StreamSink,
};
