use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use super::{lock, FileSink, LogSink, Record, Severity};

/// Shared state of every logger handle carrying the same label.
pub(crate) struct Slot {
    sinks: Vec<AttachedSink>,
    level: Severity,
    file_sink: Option<Arc<FileSink>>,
    handles: usize,
}

struct AttachedSink {
    sink: Arc<dyn LogSink>,
    failed: bool,
}

impl AttachedSink {
    // Write failures are swallowed; the first one per sink is reported.
    fn deliver(&mut self, line: &str) {
        if let Err(err) = self.sink.write_line(line) {
            if !self.failed {
                self.failed = true;
                eprintln!("[labellog] Failed writing log line: {:#}", err);
            }
        }
    }
}

fn same_sink(a: &Arc<dyn LogSink>, b: &Arc<FileSink>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl Slot {
    fn new() -> Self {
        Self {
            sinks: Vec::new(),
            level: Severity::Debug,
            file_sink: None,
            handles: 0,
        }
    }

    pub(crate) fn level(&self) -> Severity {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: Severity) {
        self.level = level;
    }

    pub(crate) fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub(crate) fn file_sink(&self) -> Option<&Arc<FileSink>> {
        self.file_sink.as_ref()
    }

    pub(crate) fn attach(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(AttachedSink {
            sink,
            failed: false,
        });
    }

    /// Detaches and closes the owned file sink, if any.
    pub(crate) fn detach_file_sink(&mut self) -> Option<Arc<FileSink>> {
        let previous = self.file_sink.take()?;
        self.sinks.retain(|entry| !same_sink(&entry.sink, &previous));
        previous.close();
        Some(previous)
    }

    pub(crate) fn replace_file_sink(&mut self, sink: Arc<FileSink>) -> Option<Arc<FileSink>> {
        let previous = self.detach_file_sink();
        self.attach(sink.clone());
        self.file_sink = Some(sink);
        previous
    }

    /// Drops every sink. Owned writers are closed, caller streams only flushed.
    pub(crate) fn detach_all(&mut self) {
        self.detach_file_sink();
        for entry in self.sinks.drain(..) {
            entry.sink.flush();
            if entry.sink.owns_writer() {
                entry.sink.close();
            }
        }
    }

    pub(crate) fn flush(&self) {
        for entry in &self.sinks {
            entry.sink.flush();
        }
    }

    /// Formats once per distinct formatter and writes to every sink whose
    /// own minimum severity lets the record through. `suffix` is appended
    /// to each formatted line.
    pub(crate) fn dispatch(&mut self, record: &Record<'_>, suffix: Option<&str>) {
        let mut lines: Vec<(*const (), String)> = Vec::new();

        for entry in self.sinks.iter_mut() {
            if !entry.sink.should_emit(record.severity) {
                continue;
            }

            let formatter = entry.sink.formatter();
            let key = Arc::as_ptr(formatter) as *const ();
            let index = match lines.iter().position(|(k, _)| *k == key) {
                Some(index) => index,
                None => {
                    let mut line = formatter.format(record);
                    if let Some(suffix) = suffix {
                        line.push_str(suffix);
                    }
                    lines.push((key, line));
                    lines.len() - 1
                }
            };

            entry.deliver(&lines[index].1);
        }
    }
}

/// Maps labels to their shared sink state.
///
/// Cloning is cheap and yields a handle to the same registry. Lock order is
/// always the label map first, then a single slot.
#[derive(Clone, Default)]
pub struct Registry {
    slots: Arc<Mutex<HashMap<String, Arc<Mutex<Slot>>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by loggers built without an explicit one.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Returns the slot for `label`, creating an empty one the first time the
    /// label is seen, and counts one more active handle on it. The flag is
    /// true when the slot was created by this call.
    pub(crate) fn get_or_create(&self, label: &str) -> (Arc<Mutex<Slot>>, bool) {
        let mut slots = lock(&self.slots);
        let mut created = false;
        let slot = slots
            .entry(label.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(Slot::new()))
            })
            .clone();

        lock(&slot).handles += 1;
        (slot, created)
    }

    fn slot(&self, label: &str) -> Option<Arc<Mutex<Slot>>> {
        lock(&self.slots).get(label).cloned()
    }

    pub fn contains(&self, label: &str) -> bool {
        lock(&self.slots).contains_key(label)
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = lock(&self.slots).keys().cloned().collect();
        labels.sort();
        labels
    }

    pub fn handle_count(&self, label: &str) -> usize {
        self.slot(label).map_or(0, |slot| lock(&slot).handles)
    }

    pub fn sink_count(&self, label: &str) -> usize {
        self.slot(label).map_or(0, |slot| lock(&slot).sink_count())
    }

    pub fn file_sink(&self, label: &str) -> Option<Arc<FileSink>> {
        self.slot(label).and_then(|slot| lock(&slot).file_sink().cloned())
    }

    /// Installs `sink` as the owned file sink of `label`, closing and
    /// detaching the previous one. `None` only removes the current one.
    /// Returns the replaced sink; unknown labels are left untouched.
    pub fn replace_file_sink(&self, label: &str, sink: Option<Arc<FileSink>>) -> Option<Arc<FileSink>> {
        let slot = self.slot(label)?;
        let mut slot = lock(&slot);
        match sink {
            Some(sink) => slot.replace_file_sink(sink),
            None => slot.detach_file_sink(),
        }
    }

    /// Forgets `label` regardless of open handles, closing its owned file.
    /// Handles still alive keep working on a detached, sink-less slot.
    pub fn release(&self, label: &str) -> bool {
        let Some(slot) = lock(&self.slots).remove(label) else {
            return false;
        };

        lock(&slot).detach_all();
        true
    }

    /// Drops one handle of `slot`. With `detach` the label's sinks go right
    /// away; otherwise they go with the last handle, which also forgets the
    /// label if `slot` is still its entry. Runs under the map lock so a
    /// concurrent `get_or_create` never sees a half torn down slot.
    pub(crate) fn release_handle(&self, label: &str, slot: &Arc<Mutex<Slot>>, detach: bool) -> bool {
        let mut slots = lock(&self.slots);
        {
            let mut state = lock(slot);
            if detach {
                state.detach_all();
            }

            state.handles = state.handles.saturating_sub(1);
            if state.handles > 0 {
                return false;
            }
            state.detach_all();
        }

        if !slots.get(label).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            return false;
        }

        slots.remove(label);
        true
    }

    pub fn clear(&self) {
        let drained: Vec<_> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        for slot in drained {
            lock(&slot).detach_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::{tests::Broken, DefaultFormatter, SharedStream, StreamSink};

    fn attached(stream: SharedStream) -> AttachedSink {
        let sink = StreamSink::new(stream, Severity::Info, Arc::new(DefaultFormatter::default()));
        AttachedSink {
            sink: Arc::new(sink),
            failed: false,
        }
    }

    #[test]
    fn test_deliver_flags_first_failure_only() {
        let mut broken = attached(SharedStream::new("broken", Broken));

        broken.deliver("one");
        assert!(broken.failed);
        broken.deliver("two");
        assert!(broken.failed);
    }

    #[test]
    fn test_deliver_success_leaves_flag_clear() {
        let mut working = attached(SharedStream::new("sink", std::io::sink()));

        working.deliver("fine");
        assert!(!working.failed);
    }

    #[test]
    fn test_last_release_removes_slot() {
        let registry = Registry::new();
        let (slot, _) = registry.get_or_create("x");
        let (again, _) = registry.get_or_create("x");

        assert!(!registry.release_handle("x", &again, false));
        assert!(registry.contains("x"));
        assert!(registry.release_handle("x", &slot, false));
        assert!(!registry.contains("x"));
    }

    // the count drops and the label goes in one step
    #[test]
    fn test_construction_after_last_release_starts_fresh() {
        let registry = Registry::new();
        let (slot, _) = registry.get_or_create("y");
        lock(&slot).attach(Arc::new(StreamSink::new(
            SharedStream::new("sink", std::io::sink()),
            Severity::Info,
            Arc::new(DefaultFormatter::default()),
        )));

        registry.release_handle("y", &slot, true);
        let (fresh, created) = registry.get_or_create("y");
        assert!(created);
        assert!(!Arc::ptr_eq(&fresh, &slot));
        assert_eq!(lock(&slot).sink_count(), 0);
    }
}
