//! Faultline: a unified error-interception and reporting pipeline
//!
//! This crate captures every abnormal signal a process can produce,
//! recoverable conditions raised explicitly, unhandled panics, and
//! fatal conditions discovered only at process end, and funnels all of
//! them through one normalized record, one trace-formatting step, one
//! logging dispatch, and one display/termination decision.

pub mod cli;
pub mod core;
pub mod handler;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use crate::core::config::{HandlerConfig, ReportMask};
pub use crate::core::error::{Error, Result};
pub use crate::core::types::*;
pub use crate::handler::{FaultHandler, FAILURE_EXIT_CODE};
pub use crate::pipeline::dispatch::{JsonLinesSink, LogSink, MemorySink, StructuredLog};
