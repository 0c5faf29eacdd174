mod test_severity;

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use super::{Registry, SharedStream};
use crate::logging::{Builder, Logger};

/// In-memory writer whose clones share one buffer.
#[derive(Clone, Default)]
pub(super) struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub(super) fn stream(&self) -> SharedStream {
        SharedStream::new("capture", self.clone())
    }

    pub(super) fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub(super) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that fails every call, like a full disk.
pub(super) struct Broken;

impl Write for Broken {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

pub(super) fn builder(registry: &Registry, label: &str) -> Builder {
    Logger::builder(label).with_registry(registry)
}

pub(super) fn capturing(registry: &Registry, label: &str) -> (Logger, Capture) {
    let capture = Capture::default();
    let logger = builder(registry, label).with_stream(capture.stream()).build();
    (logger, capture)
}
