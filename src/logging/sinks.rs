use std::{
    fmt,
    fs::File,
    io::{LineWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex},
};

use eyre::Context;

use super::{lock, LogError, LogFormatter, LogSink, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Stream,
    File,
}

/// How a log file is opened when given as a path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    #[default]
    Truncate,
    Append,
}

impl FromStr for FileMode {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" | "truncate" => Ok(FileMode::Truncate),
            "a" | "append" => Ok(FileMode::Append),
            _ => Err(LogError::InvalidFileMode(s.to_string())),
        }
    }
}

/// A writable handle supplied by the caller.
///
/// Clones share the same writer behind one mutex, so sinks on different
/// labels or threads never interleave partial lines.
#[derive(Clone)]
pub struct SharedStream {
    name: Arc<str>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedStream {
    pub fn new(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        let name: String = name.into();
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            name: Arc::from(name),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stderr() -> Self {
        Self::new("<stderr>", std::io::stderr())
    }

    pub fn stdout() -> Self {
        Self::new("<stdout>", std::io::stdout())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptr_eq(&self, other: &SharedStream) -> bool {
        Arc::ptr_eq(&self.writer, &other.writer)
    }

    fn write_line(&self, line: &str) -> eyre::Result<()> {
        let mut writer = lock(&self.writer);
        writeln!(writer, "{}", line)
            .with_context(|| format!("Failed writing to stream {}", self.name))?;
        writer.flush().context("Can't flush stream")
    }

    fn flush(&self) {
        let _ = lock(&self.writer).flush();
    }
}

impl fmt::Debug for SharedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStream").field("name", &self.name).finish()
    }
}

/// Where `Logger::set_log_file` sends its output.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Opened and owned by the logger, closed on replacement or close.
    Path(PathBuf),
    /// Already open; attached like any other stream and never closed.
    Stream(SharedStream),
}

impl From<&str> for LogTarget {
    fn from(path: &str) -> Self {
        LogTarget::Path(PathBuf::from(path))
    }
}

impl From<String> for LogTarget {
    fn from(path: String) -> Self {
        LogTarget::Path(PathBuf::from(path))
    }
}

impl From<&Path> for LogTarget {
    fn from(path: &Path) -> Self {
        LogTarget::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for LogTarget {
    fn from(path: PathBuf) -> Self {
        LogTarget::Path(path)
    }
}

impl From<SharedStream> for LogTarget {
    fn from(stream: SharedStream) -> Self {
        LogTarget::Stream(stream)
    }
}

pub struct StreamSink {
    stream: SharedStream,
    min_level: Severity,
    formatter: Arc<dyn LogFormatter>,
}

impl StreamSink {
    pub fn new(stream: SharedStream, min_level: Severity, formatter: Arc<dyn LogFormatter>) -> Self {
        Self {
            stream,
            min_level,
            formatter,
        }
    }

    pub fn stream(&self) -> &SharedStream {
        &self.stream
    }
}

impl LogSink for StreamSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Stream
    }

    fn min_level(&self) -> Severity {
        self.min_level
    }

    fn formatter(&self) -> &Arc<dyn LogFormatter> {
        &self.formatter
    }

    fn write_line(&self, line: &str) -> eyre::Result<()> {
        self.stream.write_line(line)
    }

    fn flush(&self) {
        self.stream.flush()
    }
}

pub struct FileSink {
    file: Mutex<Option<LineWriter<File>>>,
    file_path: PathBuf,
    mode: FileMode,
    min_level: Severity,
    formatter: Arc<dyn LogFormatter>,
}

impl FileSink {
    pub fn open(
        path: impl Into<PathBuf>,
        mode: FileMode,
        min_level: Severity,
        formatter: Arc<dyn LogFormatter>,
    ) -> eyre::Result<Self> {
        let path: PathBuf = path.into();
        let mut options = std::fs::OpenOptions::new();
        options.create(true);
        match mode {
            FileMode::Truncate => options.write(true).truncate(true),
            FileMode::Append => options.append(true),
        };

        let file = options
            .open(&path)
            .with_context(|| format!("Failed opening or creating log file {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(Some(LineWriter::new(file))),
            file_path: path,
            mode,
            min_level,
            formatter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.file).is_none()
    }
}

impl LogSink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn min_level(&self) -> Severity {
        self.min_level
    }

    fn formatter(&self) -> &Arc<dyn LogFormatter> {
        &self.formatter
    }

    fn write_line(&self, line: &str) -> eyre::Result<()> {
        let mut file = lock(&self.file);
        let Some(file) = file.as_mut() else {
            eyre::bail!("Log file {} is closed", self.file_path.display());
        };

        writeln!(file, "{}", line)?;
        file.flush().context("Can't flush file")
    }

    fn flush(&self) {
        if let Some(file) = lock(&self.file).as_mut() {
            let _ = file.flush();
        }
    }

    fn owns_writer(&self) -> bool {
        true
    }

    fn close(&self) {
        if let Some(mut file) = lock(&self.file).take() {
            let _ = file.flush();
        }
    }
}
