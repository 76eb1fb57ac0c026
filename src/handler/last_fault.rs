//! Last-fault registry.
//!
//! Mirrors the runtime's "last error" state for the process-exit
//! inspection: every captured signal is recorded here, and at uninstall
//! the handler reports the remembered fault only if it is fatal-class
//! and nothing already handled it when it occurred.

use crate::core::types::TraceFrame;
use crate::pipeline::classify;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Snapshot of the most recent captured fault.
#[derive(Debug, Clone)]
pub struct LastFault {
    /// Raw severity code of the fault
    pub code: u32,
    /// Free-text message
    pub message: String,
    /// Source file the fault originated in
    pub file: PathBuf,
    /// Source line
    pub line: u32,
    /// Call stack at the time of the fault, innermost first
    pub trace: Vec<TraceFrame>,
    /// Whether the fault already went through the pipeline
    pub handled: bool,
    /// When the fault was recorded
    pub recorded_at: DateTime<Local>,
}

impl LastFault {
    /// Create an unhandled fault snapshot.
    pub fn new(
        code: u32,
        message: impl Into<String>,
        file: impl AsRef<Path>,
        line: u32,
        trace: Vec<TraceFrame>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            file: file.as_ref().to_path_buf(),
            line,
            trace,
            handled: false,
            recorded_at: Local::now(),
        }
    }

    /// Mark whether the fault was delivered through the pipeline.
    pub fn handled(mut self, handled: bool) -> Self {
        self.handled = handled;
        self
    }

    /// Whether the fault's severity belongs to the fatal class.
    pub fn is_fatal(&self) -> bool {
        classify::is_fatal_code(self.code)
    }
}

/// Holds the most recent fault; newer records replace older ones.
#[derive(Default)]
pub struct LastFaultRegistry {
    inner: Mutex<Option<LastFault>>,
}

impl LastFaultRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a fault, replacing any earlier one.
    pub fn record(&self, fault: LastFault) {
        *self.locked() = Some(fault);
    }

    /// Snapshot of the current fault, if any.
    pub fn last(&self) -> Option<LastFault> {
        self.locked().clone()
    }

    /// Consume the remembered fault when it warrants a post-mortem
    /// report: fatal-class and not already handled.
    ///
    /// Benign shutdown (no fault, a non-fatal fault, or a handled
    /// fatal) returns `None` and leaves nothing behind.
    pub fn take_unhandled_fatal(&self) -> Option<LastFault> {
        let mut slot = self.locked();
        match slot.as_ref() {
            Some(fault) if fault.is_fatal() && !fault.handled => slot.take(),
            _ => None,
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Option<LastFault>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Severity;

    #[test]
    fn test_unhandled_fatal_is_taken() {
        let registry = LastFaultRegistry::new();
        registry.record(LastFault::new(
            Severity::Error.code(),
            "out of memory",
            "/srv/app.rs",
            10,
            Vec::new(),
        ));

        let fault = registry.take_unhandled_fatal().unwrap();
        assert_eq!(fault.code, 1);
        assert_eq!(fault.message, "out of memory");

        // Consumed: a second inspection reports nothing
        assert!(registry.take_unhandled_fatal().is_none());
    }

    #[test]
    fn test_handled_fatal_is_not_taken() {
        let registry = LastFaultRegistry::new();
        registry.record(
            LastFault::new(Severity::Error.code(), "boom", "/srv/app.rs", 10, Vec::new())
                .handled(true),
        );

        assert!(registry.take_unhandled_fatal().is_none());
        assert!(registry.last().is_some());
    }

    #[test]
    fn test_non_fatal_is_not_taken() {
        let registry = LastFaultRegistry::new();
        registry.record(LastFault::new(
            Severity::Warning.code(),
            "low disk",
            "/srv/app.rs",
            10,
            Vec::new(),
        ));

        assert!(registry.take_unhandled_fatal().is_none());
    }

    #[test]
    fn test_newer_fault_replaces_older() {
        let registry = LastFaultRegistry::new();
        registry.record(LastFault::new(
            Severity::Notice.code(),
            "first",
            "/a.rs",
            1,
            Vec::new(),
        ));
        registry.record(LastFault::new(
            Severity::Parse.code(),
            "second",
            "/b.rs",
            2,
            Vec::new(),
        ));

        let fault = registry.take_unhandled_fatal().unwrap();
        assert_eq!(fault.message, "second");
    }

    #[test]
    fn test_empty_registry() {
        let registry = LastFaultRegistry::new();
        assert!(registry.last().is_none());
        assert!(registry.take_unhandled_fatal().is_none());
    }
}
