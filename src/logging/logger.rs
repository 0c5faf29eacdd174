use std::{
    error::Error,
    fmt::Write as _,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use eyre::Context;
use log::{LevelFilter, Log};

use super::{
    formatters::DefaultFormatter,
    lock,
    registry::{Registry, Slot},
    sinks::{FileMode, FileSink, LogTarget, SharedStream, StreamSink},
    LogError, LogFormatter, LogSink, Record, Severity,
};
use crate::config::Config;

/// A handle on the logger registered under a label.
///
/// Every handle built with the same label on the same [`Registry`] shares
/// the sinks and the minimum severity of that label. Dropping a handle only
/// releases it; the label's sinks go away with its last handle or on an
/// explicit [`Logger::close`].
pub struct Logger {
    label: String,
    registry: Registry,
    slot: Arc<Mutex<Slot>>,
    formatter: Arc<dyn LogFormatter>,
    closed: AtomicBool,
}

impl Logger {
    /// Verbose logger on stderr, registered in the global registry.
    pub fn new(label: impl Into<String>) -> Self {
        Builder::new(label).build()
    }

    pub fn builder(label: impl Into<String>) -> Builder {
        Builder::new(label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn level(&self) -> Severity {
        lock(&self.slot).level()
    }

    pub fn sink_count(&self) -> usize {
        lock(&self.slot).sink_count()
    }

    fn ensure_active(&self) -> Result<(), LogError> {
        if self.is_closed() {
            return Err(LogError::Closed(self.label.clone()));
        }
        Ok(())
    }

    /// Sets the minimum severity of the label. Messages below it never reach
    /// a sink, whatever the sinks' own levels.
    pub fn set_level(&self, level: Severity) -> Result<(), LogError> {
        self.ensure_active()?;
        lock(&self.slot).set_level(level);
        Ok(())
    }

    pub fn add_stream(&self, stream: SharedStream, min_level: Severity) -> Result<(), LogError> {
        self.ensure_active()?;
        let sink = StreamSink::new(stream, min_level, self.formatter.clone());
        lock(&self.slot).attach(Arc::new(sink));
        Ok(())
    }

    /// Attaches a sink of any kind. Its `close` runs on detach only when it
    /// reports `owns_writer`.
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) -> Result<(), LogError> {
        self.ensure_active()?;
        lock(&self.slot).attach(sink);
        Ok(())
    }

    /// Sends output to a log file.
    ///
    /// The label's previous log file, if it was opened from a path, is closed
    /// first. A [`LogTarget::Stream`] is attached like [`Logger::add_stream`]
    /// and stays open. A path that cannot be opened is reported on stderr and
    /// the logger keeps its other sinks.
    pub fn set_log_file(
        &self,
        target: impl Into<LogTarget>,
        mode: FileMode,
        min_level: Severity,
    ) -> Result<(), LogError> {
        self.ensure_active()?;

        let mut slot = lock(&self.slot);
        slot.detach_file_sink();

        match target.into() {
            LogTarget::Stream(stream) => {
                let sink = StreamSink::new(stream, min_level, self.formatter.clone());
                slot.attach(Arc::new(sink));
            }
            LogTarget::Path(path) => {
                match FileSink::open(&path, mode, min_level, self.formatter.clone()) {
                    Ok(sink) => {
                        slot.replace_file_sink(Arc::new(sink));
                    }
                    Err(err) => {
                        eprintln!(
                            "[labellog] Could not open '{}' for logging: {:#}",
                            path.display(),
                            err
                        );
                    }
                }
            }
        }

        Ok(())
    }

    pub fn log(&self, severity: Severity, message: &str) {
        self.dispatch(severity, message, None);
    }

    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(Severity::Critical, message);
    }

    /// Logs at error severity, followed by `failure` and its chain of
    /// sources when one is given.
    pub fn exception(&self, message: &str, failure: Option<&(dyn Error + 'static)>) {
        let report = failure.map(failure_report);
        self.dispatch(Severity::Error, message, report.as_deref());
    }

    fn dispatch(&self, severity: Severity, message: &str, suffix: Option<&str>) {
        if self.is_closed() {
            return;
        }

        emit(&self.slot, &self.label, severity, message, suffix);
    }

    pub fn flush(&self) {
        lock(&self.slot).flush();
    }

    /// Detaches every sink of the label and closes its owned log file. The
    /// label is forgotten once its last handle is closed. Closing twice is a
    /// no-op; later emits are ignored.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.registry.release_handle(&self.label, &self.slot, true);
    }

    /// Routes `log` crate records to this label. The installed backend holds
    /// its own handle on the label, which keeps the sinks alive after this
    /// one is dropped and is released without teardown if installing fails.
    /// Records are filtered by the label's severity and sinks, so the global
    /// max level is opened fully.
    pub fn init(&self) -> eyre::Result<()> {
        self.ensure_active()?;

        let (slot, _) = self.registry.get_or_create(&self.label);
        let bridge = Bridge {
            label: self.label.clone(),
            registry: self.registry.clone(),
            slot,
        };

        log::set_boxed_logger(Box::new(bridge)).context("Failed registering boxed logger")?;
        log::set_max_level(LevelFilter::Trace);

        Ok(())
    }
}

fn emit(slot: &Mutex<Slot>, label: &str, severity: Severity, message: &str, suffix: Option<&str>) {
    let mut slot = lock(slot);
    if severity < slot.level() {
        return;
    }

    let record = Record {
        timestamp: chrono::Local::now(),
        severity,
        label,
        message,
    };
    slot.dispatch(&record, suffix);
}

fn failure_report(failure: &(dyn Error + 'static)) -> String {
    let mut report = format!("\nError: {}", failure);

    let mut source = failure.source();
    if source.is_some() {
        report.push_str("\nCaused by:");
    }

    let mut depth = 0;
    while let Some(cause) = source {
        let _ = write!(report, "\n  {}: {}", depth, cause);
        depth += 1;
        source = cause.source();
    }

    report
}

impl Drop for Logger {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.registry.release_handle(&self.label, &self.slot, false);
        }
    }
}

/// `log` backend installed by [`Logger::init`].
struct Bridge {
    label: String,
    registry: Registry,
    slot: Arc<Mutex<Slot>>,
}

impl Log for Bridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Severity::from(metadata.level()) >= lock(&self.slot).level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let message = record.args().to_string();
            emit(&self.slot, &self.label, Severity::from(record.level()), &message, None);
        }
    }

    fn flush(&self) {
        lock(&self.slot).flush();
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.registry.release_handle(&self.label, &self.slot, false);
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        !self.is_closed() && Severity::from(metadata.level()) >= self.level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let message = record.args().to_string();
            self.dispatch(Severity::from(record.level()), &message, None);
        }
    }

    fn flush(&self) {
        Logger::flush(self)
    }
}

pub struct Builder {
    label: String,
    verbose: bool,
    config: Config,
    formatter: Option<Arc<dyn LogFormatter>>,
    stream: Option<SharedStream>,
    registry: Option<Registry>,
}

impl Builder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            verbose: true,
            config: Config::new(),
            formatter: None,
            stream: Some(SharedStream::stderr()),
            registry: None,
        }
    }

    /// Not verbose means the default stream only receives warnings and above.
    pub fn verbose(self, verbose: bool) -> Self {
        Self { verbose, ..self }
    }

    pub fn with_config(self, config: Config) -> Self {
        Self { config, ..self }
    }

    pub fn with_message_format(self, message_format: impl Into<String>) -> Self {
        let config = self.config.clone().with_message_format(message_format);
        Self { config, ..self }
    }

    pub fn with_datetime_format(self, datetime_format: impl Into<String>) -> Self {
        let config = self.config.clone().with_datetime_format(datetime_format);
        Self { config, ..self }
    }

    /// Replaces the template formatter entirely; the config formats are then
    /// unused.
    pub fn with_formatter(self, formatter: impl LogFormatter + 'static) -> Self {
        let formatter: Arc<dyn LogFormatter> = Arc::new(formatter);
        Self {
            formatter: Some(formatter),
            ..self
        }
    }

    pub fn with_stream(self, stream: SharedStream) -> Self {
        Self {
            stream: Some(stream),
            ..self
        }
    }

    pub fn without_stream(self) -> Self {
        Self {
            stream: None,
            ..self
        }
    }

    pub fn with_registry(self, registry: &Registry) -> Self {
        Self {
            registry: Some(registry.clone()),
            ..self
        }
    }

    /// Registers the handle. Only the first handle of a label attaches the
    /// default stream; later ones reuse the label's sinks and ignore the
    /// stream and verbosity given here.
    pub fn build(self) -> Logger {
        let registry = self.registry.unwrap_or_else(|| Registry::global().clone());
        let formatter: Arc<dyn LogFormatter> = match self.formatter {
            Some(formatter) => formatter,
            None => Arc::new(DefaultFormatter::new(self.config)),
        };

        let (slot, created) = registry.get_or_create(&self.label);

        if created {
            if let Some(stream) = self.stream {
                let min_level = if self.verbose {
                    Severity::Info
                } else {
                    Severity::Warning
                };
                let sink = StreamSink::new(stream, min_level, formatter.clone());
                lock(&slot).attach(Arc::new(sink));
            }
        }

        Logger {
            label: self.label,
            registry,
            slot,
            formatter,
            closed: AtomicBool::new(false),
        }
    }
}
