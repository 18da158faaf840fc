//! Markdown renderer.
//!
//! Produces the same document as the "Copy as Markdown" button of the HTML
//! page, so a report can be pasted into an issue tracker or chat.

use super::{format_bytes, inline_argument, Renderer};
use crate::report::ErrorReport;

/// Renders reports as Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a Markdown renderer.
    pub fn new() -> Self {
        Self
    }

    fn format_summary(report: &ErrorReport) -> String {
        let mut section = String::from("## Error Summary\n");
        section.push_str(&format!("- **Message**: {}\n", report.message()));
        section.push_str(&format!("- **Type**: `{}`\n", report.type_name()));
        section.push_str(&format!("- **File**: `{}`\n", report.file()));
        section.push_str(&format!("- **Line**: {}\n", report.line()));
        if let Some(status) = report.http_status() {
            section.push_str(&format!("- **HTTP Status**: {}\n", status));
        }
        section.push_str(&format!("- **Timestamp**: {}\n\n", report.timestamp()));
        section
    }

    fn format_request(report: &ErrorReport) -> String {
        let Some(request) = report.request() else {
            return String::new();
        };

        let mut section = String::from("## Request Information\n");
        if let Some(method) = &request.method {
            section.push_str(&format!("- **Method**: {}\n", method));
        }
        if let Some(uri) = &request.uri {
            section.push_str(&format!("- **URI**: `{}`\n", uri));
        }
        if let Some(host) = &request.host {
            section.push_str(&format!("- **Host**: {}\n", host));
        }
        if let Some(user_agent) = &request.user_agent {
            section.push_str(&format!("- **User Agent**: {}\n", user_agent));
        }
        if let Some(ip) = &request.ip {
            section.push_str(&format!("- **IP**: {}\n", ip));
        }
        section.push('\n');
        section
    }

    fn format_trace(report: &ErrorReport) -> String {
        let mut section = String::from("## Stack Trace\n\n");

        for frame in report.trace() {
            section.push_str(&format!("### Frame {}\n", frame.index));
            section.push_str(&format!("**Function**: `{}`\n", frame.signature()));
            section.push_str(&format!("**Location**: `{}`\n", frame.location()));

            if let Some(args) = frame.args.as_ref().filter(|args| !args.is_empty()) {
                section.push_str("**Arguments**:\n");
                for arg in args {
                    section.push_str(&format!(
                        "- `{}`: {}\n",
                        arg.type_name(),
                        inline_argument(arg, "`")
                    ));
                }
            }

            section.push('\n');
        }

        section
    }

    fn format_system(report: &ErrorReport) -> String {
        let mut section = String::from("## System Information\n");
        section.push_str(&format!("- **Runtime**: {}\n", report.runtime_version()));
        section.push_str(&format!(
            "- **Operating System**: {}\n",
            report.operating_system()
        ));
        section.push_str(&format!(
            "- **Memory Usage**: {}\n",
            format_bytes(report.memory_usage())
        ));
        section.push_str(&format!(
            "- **Peak Memory**: {}\n",
            format_bytes(report.peak_memory())
        ));
        section
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, report: &ErrorReport) -> String {
        let mut output = String::from("# 🚨 Error Report\n\n");
        output.push_str(&Self::format_summary(report));
        output.push_str(&Self::format_request(report));
        output.push_str(&Self::format_trace(report));
        output.push_str(&Self::format_system(report));
        output
    }
}
