//! The interceptor.
//!
//! Owns the configuration and the injected sink, installs the capture
//! points (recoverable-signal entry points, the panic hook, and the
//! process-exit inspection), and drives every captured signal through
//! the shared pipeline: classify, format trace, dispatch, render,
//! optionally terminate.

pub mod last_fault;

pub use last_fault::{LastFault, LastFaultRegistry};

use crate::core::config::HandlerConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{ErrorRecord, Severity, TraceFrame};
use crate::pipeline::classify::{self, EXCEPTION_TYPE};
use crate::pipeline::dispatch::{format_summary, LogDispatcher, LogSink};
use crate::pipeline::{render, trace};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Exit code for every terminating outcome; no differentiation.
pub const FAILURE_EXIT_CODE: i32 = 1;

type PrevPanicHook = Box<dyn Fn(&std::panic::PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Whether any handler currently owns the process panic hook.
static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    // Same-thread re-entrancy guard for the pipeline
    static IN_PIPELINE: Cell<bool> = const { Cell::new(false) };
}

/// Flag this thread as handling a fault.
///
/// `false` means a fault is already in flight on this thread; the
/// caller must degrade to a minimal log-and-exit, never recursion.
fn enter_pipeline() -> bool {
    IN_PIPELINE.with(|flag| {
        if flag.get() {
            false
        } else {
            flag.set(true);
            true
        }
    })
}

fn leave_pipeline() {
    IN_PIPELINE.with(|flag| flag.set(false));
}

/// State shared between the handler and the installed panic hook.
struct Shared {
    config: HandlerConfig,
    dispatcher: LogDispatcher,
    registry: LastFaultRegistry,
    /// Critical section around log, render, terminate
    gate: Mutex<()>,
}

impl Shared {
    /// Drive one record through dispatch, render decision and the
    /// optional exit.
    ///
    /// A fault raised on this thread while another is in flight
    /// degrades to a baseline log followed by immediate exit, never
    /// recursion.
    fn run_pipeline(&self, record: &ErrorRecord, context: &BTreeMap<String, String>) {
        if !enter_pipeline() {
            log::error!(
                "Fault raised while another was being handled: {}",
                format_summary(record)
            );
            std::process::exit(FAILURE_EXIT_CODE);
        }

        let _guard = match self.gate.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let trace_lines = trace::format_trace(&record.trace);
        self.dispatcher.dispatch(&self.config, record, context, &trace_lines);

        let plan = render::decide(&self.config, record, &trace_lines);
        if let Some(body) = &plan.body {
            emit(body);
        }
        if plan.terminate {
            std::process::exit(FAILURE_EXIT_CODE);
        }

        leave_pipeline();
    }

    /// Pipeline entry for the panic hook.
    fn handle_exception(&self, message: String, file: PathBuf, line: u32) {
        let frames = trace::capture(self.config.max_trace_frames);
        self.registry.record(
            LastFault::new(Severity::Error.code(), message.clone(), &file, line, frames.clone())
                .handled(true),
        );

        let record = ErrorRecord::new(EXCEPTION_TYPE, message, file, line).with_trace(frames);
        self.run_pipeline(&record, &BTreeMap::new());
    }
}

/// Write a rendered body to the output channel.
fn emit(body: &str) {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(body.as_bytes());
    let _ = stdout.flush();
}

/// Unified fault handler.
///
/// Construct with a validated [`HandlerConfig`] and an injected sink,
/// then [`install`](Self::install) to take over the runtime's panic
/// report. Recoverable signals are raised explicitly through
/// [`raise`](Self::raise) and friends.
pub struct FaultHandler {
    shared: Arc<Shared>,
    previous_hook: Option<PrevPanicHook>,
    installed: bool,
}

impl FaultHandler {
    /// Create a handler over an injected sink.
    ///
    /// Nothing is intercepted until [`install`](Self::install); raising
    /// signals works immediately.
    pub fn new(config: HandlerConfig, sink: LogSink) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                dispatcher: LogDispatcher::new(sink),
                registry: LastFaultRegistry::new(),
                gate: Mutex::new(()),
            }),
            previous_hook: None,
            installed: false,
        }
    }

    /// Create a handler that logs through the baseline platform log.
    pub fn with_fallback(config: HandlerConfig) -> Self {
        Self::new(config, LogSink::Fallback)
    }

    /// Validate the configuration and install the panic hook.
    ///
    /// The runtime's own panic report (the default hook's stderr print)
    /// is replaced, making this pipeline the sole reporting path. At
    /// most one handler can be installed per process; a second install
    /// fails until the first uninstalls. The previous hook is retained
    /// and restored on uninstall; it is never chained during handling.
    pub fn install(&mut self) -> Result<()> {
        self.shared.config.validate()?;
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyInstalled);
        }

        let shared = Arc::clone(&self.shared);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                panic_info.to_string()
            };
            let (file, line) = match panic_info.location() {
                Some(location) => (PathBuf::from(location.file()), location.line()),
                None => (PathBuf::from("unknown"), 0),
            };
            shared.handle_exception(message, file, line);
        }));

        self.previous_hook = Some(previous);
        self.installed = true;
        Ok(())
    }

    /// Restore the previous panic hook and run the process-exit
    /// inspection. Runs automatically on drop.
    pub fn uninstall(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;

        // Hooks cannot be swapped from a panicking thread
        if std::thread::panicking() {
            return;
        }

        if let Some(previous) = self.previous_hook.take() {
            std::panic::set_hook(previous);
        }
        INSTALLED.store(false, Ordering::SeqCst);
        self.inspect_exit();
    }

    /// Report a recoverable signal from the callsite.
    ///
    /// Fires only when the report mask permits the severity; a masked
    /// signal is remembered for the exit inspection and nothing else.
    /// Returns whether the signal was delivered.
    #[track_caller]
    pub fn raise(&self, severity: Severity, message: impl Into<String>) -> bool {
        let caller = std::panic::Location::caller();
        let frames = trace::capture(self.shared.config.max_trace_frames);
        self.deliver(
            severity.code(),
            classify::classify(severity),
            message.into(),
            PathBuf::from(caller.file()),
            caller.line(),
            frames,
        )
    }

    /// Report a recoverable signal with a raw severity code.
    ///
    /// Unknown codes classify as their stringified value and are never
    /// fatal.
    #[track_caller]
    pub fn raise_code(&self, code: u32, message: impl Into<String>) -> bool {
        let caller = std::panic::Location::caller();
        let frames = trace::capture(self.shared.config.max_trace_frames);
        let type_name = classify::classify_code(code);
        self.deliver(
            code,
            &type_name,
            message.into(),
            PathBuf::from(caller.file()),
            caller.line(),
            frames,
        )
    }

    /// Report a recoverable signal with an explicit origin and frames.
    pub fn raise_at(
        &self,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        line: u32,
        frames: Vec<TraceFrame>,
    ) -> bool {
        self.deliver(
            severity.code(),
            classify::classify(severity),
            message.into(),
            file.into(),
            line,
            frames,
        )
    }

    /// Snapshot a fatal condition that short-circuits normal delivery.
    ///
    /// Nothing runs now; the exit inspection reports it post-mortem.
    #[track_caller]
    pub fn record_fatal(&self, message: impl Into<String>) {
        let caller = std::panic::Location::caller();
        let frames = trace::capture(self.shared.config.max_trace_frames);
        self.shared.registry.record(LastFault::new(
            Severity::Error.code(),
            message,
            caller.file(),
            caller.line(),
            frames,
        ));
    }

    /// The configuration in effect.
    pub fn config(&self) -> &HandlerConfig {
        &self.shared.config
    }

    /// The last recorded fault, if any.
    pub fn last_fault(&self) -> Option<LastFault> {
        self.shared.registry.last()
    }

    fn deliver(
        &self,
        code: u32,
        type_name: &str,
        message: String,
        file: PathBuf,
        line: u32,
        frames: Vec<TraceFrame>,
    ) -> bool {
        let permitted = self.shared.config.report_mask.permits_code(code);
        self.shared.registry.record(
            LastFault::new(code, message.clone(), &file, line, frames.clone()).handled(permitted),
        );
        if !permitted {
            return false;
        }

        let record = ErrorRecord::new(type_name, message, file, line).with_trace(frames);
        self.shared.run_pipeline(&record, &BTreeMap::new());
        true
    }

    /// Forward the last recorded fault through the pipeline if it is
    /// fatal-class and was never handled.
    ///
    /// The fault's recording time rides along in the log context; the
    /// report happens at process end, not when the fault occurred.
    fn inspect_exit(&self) {
        if let Some(fault) = self.shared.registry.take_unhandled_fatal() {
            let mut context = BTreeMap::new();
            context.insert(
                "recorded_at".to_string(),
                fault.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            );

            let type_name = classify::classify_code(fault.code).into_owned();
            let record = ErrorRecord::new(type_name, fault.message, fault.file, fault.line)
                .with_trace(fault.trace);
            self.shared.run_pipeline(&record, &context);
        }
    }
}

impl Drop for FaultHandler {
    fn drop(&mut self) {
        self.uninstall();
    }
}
