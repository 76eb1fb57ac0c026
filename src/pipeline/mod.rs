//! The shared event pipeline: classify, format trace, dispatch, render.

pub mod classify;
pub mod dispatch;
pub mod render;
pub mod trace;

pub use classify::EXCEPTION_TYPE;
pub use dispatch::{
    format_summary, JsonLinesSink, LogDispatcher, LogSink, MemoryEvent, MemorySink, StructuredLog,
};
pub use render::{decide, render_fragment, RenderPlan};
pub use trace::{capture, format_trace};
