//! Core type definitions used throughout faultline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity kind of a runtime signal.
///
/// The table is static and known at compile time: every kind has a stable
/// numeric code (a distinct bit, so kinds compose into a report mask) and a
/// canonical type name. Raw codes outside this table are still reportable;
/// they classify as their stringified numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fatal runtime error; normally only observable post-mortem
    Error,
    /// Non-fatal runtime warning
    Warning,
    /// Fatal parse error
    Parse,
    /// Minor runtime notice
    Notice,
    /// Fatal error raised during startup
    CoreError,
    /// Warning raised during startup
    CoreWarning,
    /// Fatal error raised while compiling a unit
    CompileError,
    /// Warning raised while compiling a unit
    CompileWarning,
    /// Error raised explicitly by host code
    UserError,
    /// Warning raised explicitly by host code
    UserWarning,
    /// Notice raised explicitly by host code
    UserNotice,
    /// Strict-mode advisory
    Strict,
    /// Recoverable error the host may continue past
    RecoverableError,
    /// Use of a deprecated construct
    Deprecated,
    /// Deprecation raised explicitly by host code
    UserDeprecated,
}

/// Every severity kind, in code order.
pub const ALL_SEVERITIES: [Severity; 15] = [
    Severity::Error,
    Severity::Warning,
    Severity::Parse,
    Severity::Notice,
    Severity::CoreError,
    Severity::CoreWarning,
    Severity::CompileError,
    Severity::CompileWarning,
    Severity::UserError,
    Severity::UserWarning,
    Severity::UserNotice,
    Severity::Strict,
    Severity::RecoverableError,
    Severity::Deprecated,
    Severity::UserDeprecated,
];

impl Severity {
    /// Get the numeric signal code (a distinct bit per kind).
    pub fn code(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Parse => 4,
            Severity::Notice => 8,
            Severity::CoreError => 16,
            Severity::CoreWarning => 32,
            Severity::CompileError => 64,
            Severity::CompileWarning => 128,
            Severity::UserError => 256,
            Severity::UserWarning => 512,
            Severity::UserNotice => 1024,
            Severity::Strict => 2048,
            Severity::RecoverableError => 4096,
            Severity::Deprecated => 8192,
            Severity::UserDeprecated => 16384,
        }
    }

    /// Get the canonical type name used in records, logs and overrides.
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Error => "E_ERROR",
            Severity::Warning => "E_WARNING",
            Severity::Parse => "E_PARSE",
            Severity::Notice => "E_NOTICE",
            Severity::CoreError => "E_CORE_ERROR",
            Severity::CoreWarning => "E_CORE_WARNING",
            Severity::CompileError => "E_COMPILE_ERROR",
            Severity::CompileWarning => "E_COMPILE_WARNING",
            Severity::UserError => "E_USER_ERROR",
            Severity::UserWarning => "E_USER_WARNING",
            Severity::UserNotice => "E_USER_NOTICE",
            Severity::Strict => "E_STRICT",
            Severity::RecoverableError => "E_RECOVERABLE_ERROR",
            Severity::Deprecated => "E_DEPRECATED",
            Severity::UserDeprecated => "E_USER_DEPRECATED",
        }
    }

    /// Look up a kind by numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_SEVERITIES.iter().copied().find(|s| s.code() == code)
    }

    /// Look up a kind by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_SEVERITIES.iter().copied().find(|s| s.name() == name)
    }

    /// Whether this kind is fatal/unrecoverable.
    ///
    /// Fatal kinds short-circuit normal handler delivery; they are caught
    /// by the process-exit inspection instead of the synchronous hook.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Severity::Error | Severity::Parse | Severity::CoreError | Severity::CompileError
        )
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Log level attached to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Detailed debug information
    Debug,
    /// Interesting events
    Info,
    /// Normal but significant events
    Notice,
    /// Exceptional occurrences that are not errors
    Warning,
    /// Runtime errors that do not require immediate action
    Error,
    /// Critical conditions
    Critical,
    /// Action must be taken immediately
    Alert,
    /// System is unusable
    Emergency,
}

impl LogLevel {
    /// Get string representation for config files and sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Alert => "alert",
            LogLevel::Emergency => "emergency",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "notice" => Some(LogLevel::Notice),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            "critical" => Some(LogLevel::Critical),
            "alert" => Some(LogLevel::Alert),
            "emergency" => Some(LogLevel::Emergency),
            _ => None,
        }
    }

    /// Map onto the platform log facade.
    ///
    /// The `log` crate has no notice or critical-and-above levels; notice
    /// collapses into info and everything from critical up into error.
    pub fn to_log_level(&self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info | LogLevel::Notice => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
                log::Level::Error
            }
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single raw call-stack frame.
///
/// Every field is optional; the formatter renders only the clauses it has
/// data for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceFrame {
    /// Name of the function the call originated from
    pub function: Option<String>,
    /// Owning path of the function (module path, or type for methods)
    pub class: Option<String>,
    /// Source file, if known
    pub file: Option<String>,
    /// Source line, if known
    pub line: Option<u32>,
}

impl TraceFrame {
    /// Create a frame with just a function name.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Default::default()
        }
    }

    /// Set the owning class/module path.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the source location. Both parts are required for the location
    /// clause to render.
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

/// A normalized record of one captured signal.
///
/// Transient by design: created when a signal is intercepted, dropped when
/// the event completes. Records are never persisted and never shared
/// across events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Canonical type name ("E_WARNING", "Exception", or a raw code)
    pub type_name: String,
    /// Free-text message
    pub message: String,
    /// Source file the signal originated from
    pub file: PathBuf,
    /// Source line (positive)
    pub line: u32,
    /// Raw call stack, innermost first
    pub trace: Vec<TraceFrame>,
}

impl ErrorRecord {
    /// Create a record with an empty trace.
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        line: u32,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            file: file.into(),
            line,
            trace: Vec::new(),
        }
    }

    /// Attach a captured call stack.
    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = trace;
        self
    }
}
