//! Render decision and output fragment.
//!
//! The decision is pure and separated from the exit call, so the
//! silent/ignore table is testable without terminating the test
//! process. The interceptor performs the actual write and exit.

use crate::core::config::HandlerConfig;
use crate::core::types::ErrorRecord;

/// Outcome of the render decision for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// What to write to the output channel, if anything
    pub body: Option<String>,
    /// Whether the process must exit after emitting the body
    pub terminate: bool,
}

impl RenderPlan {
    /// Plan that writes nothing and lets execution continue.
    pub fn silent_continue() -> Self {
        Self {
            body: None,
            terminate: false,
        }
    }
}

/// Evaluate the silent/ignore table for an event.
///
/// Only the (silent, type ignored) combination continues; every other
/// outcome renders a body and terminates.
pub fn decide(config: &HandlerConfig, record: &ErrorRecord, trace_lines: &[String]) -> RenderPlan {
    if !config.silent {
        return RenderPlan {
            body: Some(render_fragment(record, trace_lines)),
            terminate: true,
        };
    }

    if config.is_ignored(&record.type_name) {
        return RenderPlan::silent_continue();
    }

    RenderPlan {
        body: Some(config.silent_content.clone()),
        terminate: true,
    }
}

/// Render the structured diagnostic fragment.
///
/// The file shows as directory prefix plus bold basename; the Trace
/// section is omitted entirely when there are no frames.
pub fn render_fragment(record: &ErrorRecord, trace_lines: &[String]) -> String {
    let mut html = String::new();

    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&record.type_name)));
    html.push_str(&format!(
        "<b>{}</b> in {} (on line: {})<br />\n",
        escape_html(&record.message),
        format_location(record),
        record.line
    ));

    if !trace_lines.is_empty() {
        html.push_str("Trace:<br />\n");
        for line in trace_lines {
            html.push_str(&format!("{}<br />\n", escape_html(line)));
        }
    }

    html
}

/// Directory prefix plus bold basename.
fn format_location(record: &ErrorRecord) -> String {
    let basename = record
        .file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| record.file.display().to_string());

    match record.file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            format!(
                "{}/<b>{}</b>",
                escape_html(&parent.display().to_string()),
                escape_html(&basename)
            )
        }
        _ => format!("<b>{}</b>", escape_html(&basename)),
    }
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ErrorRecord {
        ErrorRecord::new("E_WARNING", "disk almost full", "/srv/app/worker.rs", 120)
    }

    #[test]
    fn test_decide_renders_fragment_when_not_silent() {
        let config = HandlerConfig::default();
        let plan = decide(&config, &sample_record(), &[]);

        let body = plan.body.unwrap();
        assert!(body.contains("<h1>E_WARNING</h1>"));
        assert!(body.contains("<b>disk almost full</b>"));
        assert!(body.contains("<b>worker.rs</b>"));
        assert!(body.contains("on line: 120"));
        assert!(plan.terminate);
    }

    #[test]
    fn test_decide_silent_renders_opaque_content() {
        let config = HandlerConfig::default()
            .with_silent_mode(true)
            .with_silent_content("Something went wrong.");
        let plan = decide(&config, &sample_record(), &[]);

        assert_eq!(plan.body.as_deref(), Some("Something went wrong."));
        assert!(plan.terminate);
    }

    #[test]
    fn test_decide_silent_ignored_continues() {
        let config = HandlerConfig::default()
            .with_silent_mode(true)
            .with_ignore_types(["E_WARNING"]);
        let plan = decide(&config, &sample_record(), &[]);

        assert_eq!(plan, RenderPlan::silent_continue());
    }

    #[test]
    fn test_ignore_set_is_inert_without_silent_mode() {
        let config = HandlerConfig::default().with_ignore_types(["E_WARNING"]);
        let plan = decide(&config, &sample_record(), &[]);

        assert!(plan.body.is_some());
        assert!(plan.terminate);
    }

    #[test]
    fn test_fragment_with_trace() {
        let trace = vec![
            "#2 called by 'inner'".to_string(),
            "#1 called by 'outer'".to_string(),
        ];
        let html = render_fragment(&sample_record(), &trace);

        assert!(html.contains("Trace:<br />"));
        assert!(html.contains("#2 called by &#39;inner&#39;<br />"));
        assert!(html.contains("#1 called by &#39;outer&#39;<br />"));

        let inner_pos = html.find("#2").unwrap();
        let outer_pos = html.find("#1").unwrap();
        assert!(inner_pos < outer_pos);
    }

    #[test]
    fn test_fragment_without_trace_omits_section() {
        let record = ErrorRecord::new("Exception", "bad input", "/app/run", 42);
        let html = render_fragment(&record, &[]);

        assert!(html.contains("<h1>Exception</h1>"));
        assert!(html.contains("<b>bad input</b>"));
        assert!(html.contains("on line: 42"));
        assert!(!html.contains("Trace:"));
    }

    #[test]
    fn test_fragment_escapes_message() {
        let record = ErrorRecord::new("E_NOTICE", "unexpected <tag> & \"quote\"", "/srv/a.rs", 7);
        let html = render_fragment(&record, &[]);

        assert!(html.contains("unexpected &lt;tag&gt; &amp; &quot;quote&quot;"));
        assert!(!html.contains("<tag>"));
    }
}
