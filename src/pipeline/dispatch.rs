//! Log dispatch.
//!
//! Resolves the effective level for an event, builds the one-line
//! summary, and routes the event to the injected structured sink or to
//! the baseline platform log. Dispatch never fails the pipeline: a
//! structured sink error is reported through the fallback path and the
//! event continues.

use crate::core::config::HandlerConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{ErrorRecord, LogLevel};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Structured logging collaborator.
///
/// Injected once at handler construction; implementations must be safe
/// to call from the panic hook.
pub trait StructuredLog: Send + Sync {
    /// Record one event.
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        context: &BTreeMap<String, String>,
        trace: &[String],
    ) -> Result<()>;

    /// Make previously logged events durable.
    fn flush(&self) -> Result<()>;
}

/// Where dispatched events go.
pub enum LogSink {
    /// An injected structured sink
    Structured(Box<dyn StructuredLog>),
    /// The baseline platform log (the `log` crate)
    Fallback,
}

/// Routes classified events to the configured sink.
pub struct LogDispatcher {
    sink: LogSink,
}

impl LogDispatcher {
    /// Create a dispatcher over the given sink.
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    /// Create a dispatcher that uses only the baseline platform log.
    pub fn fallback() -> Self {
        Self {
            sink: LogSink::Fallback,
        }
    }

    /// Log one event at its effective level.
    ///
    /// For a structured sink the context rides along and the entry is
    /// flushed before returning, so it is durable before any
    /// termination that follows.
    pub fn dispatch(
        &self,
        config: &HandlerConfig,
        record: &ErrorRecord,
        context: &BTreeMap<String, String>,
        trace_lines: &[String],
    ) {
        let level = config.effective_level(&record.type_name);
        let summary = format_summary(record);

        match &self.sink {
            LogSink::Structured(sink) => {
                let outcome = sink
                    .log(level, &summary, context, trace_lines)
                    .and_then(|_| sink.flush());
                if let Err(e) = outcome {
                    // The event must still leave a trace somewhere
                    log::error!("Structured sink failed ({}): {}", e, summary);
                }
            }
            LogSink::Fallback => {
                log::log!(level.to_log_level(), "{}", summary);
            }
        }
    }
}

/// One-line summary of an event for log output.
pub fn format_summary(record: &ErrorRecord) -> String {
    format!(
        "[{}] {} in {} on line {}",
        record.type_name,
        record.message,
        record.file.display(),
        record.line
    )
}

/// Structured sink that appends one JSON object per event to a file.
///
/// Flush calls fsync, so an entry survives the process exit that a
/// fatal event triggers right after dispatch.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open (or create) the sink file in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::sink_open(&path, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::sink_open(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked_file(&self) -> std::sync::MutexGuard<'_, File> {
        match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StructuredLog for JsonLinesSink {
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        context: &BTreeMap<String, String>,
        trace: &[String],
    ) -> Result<()> {
        let entry = serde_json::json!({
            "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "level": level.as_str(),
            "message": message,
            "context": context,
            "trace": trace,
        });

        let mut file = self.locked_file();
        writeln!(file, "{}", entry).map_err(Error::SinkWrite)
    }

    fn flush(&self) -> Result<()> {
        let mut file = self.locked_file();
        file.flush().map_err(Error::SinkFlush)?;
        file.sync_all().map_err(Error::SinkFlush)
    }
}

/// In-memory sink that records every call, for tests and embedders.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    events: Mutex<Vec<MemoryEvent>>,
    flushes: AtomicUsize,
    fail_writes: AtomicBool,
}

/// One recorded `log` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    pub level: LogLevel,
    pub message: String,
    pub context: BTreeMap<String, String>,
    pub trace: Vec<String>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `log` calls fail, to exercise the fallback path.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<MemoryEvent> {
        match self.inner.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of `flush` calls seen.
    pub fn flush_count(&self) -> usize {
        self.inner.flushes.load(Ordering::SeqCst)
    }
}

impl StructuredLog for MemorySink {
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        context: &BTreeMap<String, String>,
        trace: &[String],
    ) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::SinkWrite(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated sink failure",
            )));
        }

        let event = MemoryEvent {
            level,
            message: message.to_string(),
            context: context.clone(),
            trace: trace.to_vec(),
        };
        match self.inner.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.inner.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record() -> ErrorRecord {
        ErrorRecord::new("E_WARNING", "disk almost full", "/srv/app/main.rs", 120)
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(
            format_summary(&sample_record()),
            "[E_WARNING] disk almost full in /srv/app/main.rs on line 120"
        );
    }

    #[test]
    fn test_dispatch_to_memory_sink() {
        let sink = MemorySink::new();
        let dispatcher = LogDispatcher::new(LogSink::Structured(Box::new(sink.clone())));
        let config = HandlerConfig::default();
        let trace = vec!["#1 called by 'main'".to_string()];
        let mut context = BTreeMap::new();
        context.insert("recorded_at".to_string(), "2026-08-25 10:00:00".to_string());

        dispatcher.dispatch(&config, &sample_record(), &context, &trace);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Error);
        assert_eq!(
            events[0].message,
            "[E_WARNING] disk almost full in /srv/app/main.rs on line 120"
        );
        assert_eq!(events[0].context, context);
        assert_eq!(events[0].trace, trace);
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn test_dispatch_honors_level_override() {
        let sink = MemorySink::new();
        let dispatcher = LogDispatcher::new(LogSink::Structured(Box::new(sink.clone())));
        let config = HandlerConfig::default().with_level_override("E_WARNING", LogLevel::Notice);

        dispatcher.dispatch(&config, &sample_record(), &BTreeMap::new(), &[]);

        assert_eq!(sink.events()[0].level, LogLevel::Notice);
    }

    #[test]
    fn test_dispatch_survives_sink_failure() {
        let sink = MemorySink::new();
        sink.set_fail_writes(true);
        let dispatcher = LogDispatcher::new(LogSink::Structured(Box::new(sink.clone())));

        dispatcher.dispatch(&HandlerConfig::default(), &sample_record(), &BTreeMap::new(), &[]);

        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_json_lines_sink_writes_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("faults.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        let mut context = BTreeMap::new();
        context.insert("request_id".to_string(), "abc-123".to_string());
        sink.log(
            LogLevel::Critical,
            "[E_ERROR] boom in /srv/a.rs on line 3",
            &context,
            &["#1 called by 'main'".to_string()],
        )
        .unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);

        let entry: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry["level"], "critical");
        assert_eq!(entry["message"], "[E_ERROR] boom in /srv/a.rs on line 3");
        assert_eq!(entry["context"]["request_id"], "abc-123");
        assert_eq!(entry["trace"][0], "#1 called by 'main'");
        assert!(entry["timestamp"].is_string());
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("faults.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        sink.log(LogLevel::Error, "first", &BTreeMap::new(), &[]).unwrap();
        sink.log(LogLevel::Error, "second", &BTreeMap::new(), &[]).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
