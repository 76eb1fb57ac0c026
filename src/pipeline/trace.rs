//! Call stack capture and formatting.
//!
//! Capture parses the text of `std::backtrace::Backtrace` into
//! [`TraceFrame`]s; formatting turns frames into the fixed one-line
//! shape used by both the log sinks and the rendered fragment.

use crate::core::types::TraceFrame;
use regex::Regex;
use std::backtrace::Backtrace;
use std::sync::OnceLock;

/// Symbol prefixes that belong to the capture machinery itself, not to
/// the host program.
const SKIP_PREFIXES: &[&str] = &[
    "std::backtrace",
    "std::panicking",
    "std::panic",
    "std::rt",
    "std::sys",
    "core::panicking",
    "core::ops::function",
    "rust_begin_unwind",
    "__rust",
    "__libc_start_main",
    "_start",
    "faultline::pipeline::trace",
    "faultline::handler",
];

fn symbol_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+):\s+(.+?)\s*$").unwrap())
}

fn location_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s+at\s+(.+?):(\d+)(?::\d+)?\s*$").unwrap())
}

fn hash_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"::h[0-9a-f]{16}$").unwrap())
}

/// Capture the current thread's call stack, innermost frame first.
///
/// Frames from this crate's own plumbing and the runtime's backtrace
/// machinery are dropped; the result is capped at `max_frames`.
pub fn capture(max_frames: usize) -> Vec<TraceFrame> {
    let backtrace = Backtrace::force_capture();
    parse_backtrace(&backtrace.to_string(), max_frames)
}

/// Parse rendered backtrace text into frames.
pub(crate) fn parse_backtrace(text: &str, max_frames: usize) -> Vec<TraceFrame> {
    let mut frames: Vec<TraceFrame> = Vec::new();
    let mut current: Option<TraceFrame> = None;

    for line in text.lines() {
        if let Some(caps) = symbol_line_re().captures(line) {
            if let Some(frame) = current.take() {
                frames.push(frame);
            }
            current = symbol_to_frame(&caps[2]);
        } else if let Some(caps) = location_line_re().captures(line) {
            if let Some(frame) = current.as_mut() {
                frame.file = Some(caps[1].to_string());
                frame.line = caps[2].parse().ok();
            }
        }
    }
    if let Some(frame) = current.take() {
        frames.push(frame);
    }

    frames.truncate(max_frames);
    frames
}

/// Convert one symbol into a frame, or `None` when it should be skipped.
fn symbol_to_frame(symbol: &str) -> Option<TraceFrame> {
    let cleaned = hash_suffix_re().replace(symbol, "");
    if should_skip(&cleaned) {
        return None;
    }

    let (class, function) = split_symbol(&cleaned);
    Some(TraceFrame {
        function,
        class,
        file: None,
        line: None,
    })
}

fn should_skip(symbol: &str) -> bool {
    // Trait impl symbols wrap the path in angle brackets
    let probe = symbol.trim_start_matches('<');
    SKIP_PREFIXES.iter().any(|prefix| probe.starts_with(prefix))
}

/// Split a symbol path into owner and function name.
fn split_symbol(symbol: &str) -> (Option<String>, Option<String>) {
    match symbol.rfind("::") {
        Some(idx) => {
            let class = &symbol[..idx];
            let function = &symbol[idx + 2..];
            (non_empty(class), non_empty(function))
        }
        None => (None, non_empty(symbol)),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Format frames into display lines, one per frame.
///
/// Input order (innermost first) is preserved; labels count down from
/// `frames.len()` to 1. Pure and idempotent.
pub fn format_trace(frames: &[TraceFrame]) -> Vec<String> {
    let total = frames.len();
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| format_frame(total - i, frame))
        .collect()
}

/// Format one frame.
///
/// The class clause appears only when the owner is known; the location
/// clause only when both file and line are known.
fn format_frame(index: usize, frame: &TraceFrame) -> String {
    let mut line = format!(
        "#{} called by '{}'",
        index,
        frame.function.as_deref().unwrap_or("unknown")
    );

    if let Some(class) = &frame.class {
        line.push_str(&format!(", class '{}'", class));
    }

    if let (Some(file), Some(line_no)) = (&frame.file, frame.line) {
        line.push_str(&format!(" in file '{} (on line: {})'", file, line_no));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_counts_down() {
        let frames = vec![
            TraceFrame::new("innermost"),
            TraceFrame::new("middle"),
            TraceFrame::new("outermost"),
        ];
        let lines = format_trace(&frames);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "#3 called by 'innermost'");
        assert_eq!(lines[1], "#2 called by 'middle'");
        assert_eq!(lines[2], "#1 called by 'outermost'");
    }

    #[test]
    fn test_format_full_frame() {
        let frames = vec![TraceFrame::new("connect")
            .with_class("pool::Client")
            .with_location("/srv/pool.rs", 88)];
        assert_eq!(
            format_trace(&frames),
            vec!["#1 called by 'connect', class 'pool::Client' in file '/srv/pool.rs (on line: 88)'"]
        );
    }

    #[test]
    fn test_format_omits_missing_clauses() {
        let no_class = vec![TraceFrame::new("run").with_location("/srv/main.rs", 10)];
        assert_eq!(
            format_trace(&no_class),
            vec!["#1 called by 'run' in file '/srv/main.rs (on line: 10)'"]
        );

        let no_location = vec![TraceFrame::new("run").with_class("App")];
        assert_eq!(format_trace(&no_location), vec!["#1 called by 'run', class 'App'"]);

        let bare = vec![TraceFrame::default()];
        assert_eq!(format_trace(&bare), vec!["#1 called by 'unknown'"]);
    }

    #[test]
    fn test_format_is_idempotent() {
        let frames = vec![
            TraceFrame::new("a").with_class("X"),
            TraceFrame::new("b").with_location("/f.rs", 2),
        ];
        assert_eq!(format_trace(&frames), format_trace(&frames));
        assert!(format_trace(&[]).is_empty());
    }

    #[test]
    fn test_parse_backtrace() {
        let text = "\
   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/sys_common/backtrace.rs:66:5
   1: faultline::pipeline::trace::capture::h0123456789abcdef
             at ./src/pipeline/trace.rs:30:13
   2: myapp::db::Client::connect::hfedcba9876543210
             at ./src/db.rs:88:9
   3: myapp::main
             at ./src/main.rs:10:5
   4: core::ops::function::FnOnce::call_once
";
        let frames = parse_backtrace(text, 64);
        assert_eq!(frames.len(), 2);

        assert_eq!(frames[0].function.as_deref(), Some("connect"));
        assert_eq!(frames[0].class.as_deref(), Some("myapp::db::Client"));
        assert_eq!(frames[0].file.as_deref(), Some("./src/db.rs"));
        assert_eq!(frames[0].line, Some(88));

        assert_eq!(frames[1].function.as_deref(), Some("main"));
        assert_eq!(frames[1].class.as_deref(), Some("myapp"));
    }

    #[test]
    fn test_parse_respects_cap() {
        let text = "\
   0: a::one
   1: b::two
   2: c::three
";
        let frames = parse_backtrace(text, 2);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].function.as_deref(), Some("one"));
    }

    #[test]
    fn test_capture_smoke() {
        let frames = capture(4);
        assert!(frames.len() <= 4);
    }
}
