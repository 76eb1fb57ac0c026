//! Core types shared across the handler pipeline.

pub mod config;
pub mod error;
pub mod types;

pub use config::{HandlerConfig, ReportMask};
pub use error::{Error, Result};
pub use types::{ErrorRecord, LogLevel, Severity, TraceFrame};
