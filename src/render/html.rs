//! HTML renderer.
//!
//! Produces a single self-contained page: inline styles, the report sections,
//! and a "Copy as Markdown" button whose script carries the full report as an
//! escaped JSON literal and rebuilds the Markdown client-side.

use super::{format_bytes, humanize_key, inline_argument, reason_phrase, Renderer};
use crate::report::ErrorReport;

const STYLES: &str = r#"<style>
    :root {
        --bg-primary: #ffffff;
        --bg-card: #ffffff;
        --bg-section: #f8f9fa;
        --text-primary: #212529;
        --text-secondary: #6c757d;
        --border-color: #e9ecef;
        --border-light: #f1f3f4;
        --blue-primary: #4285f4;
        --blue-light: #e8f0fe;
        --shadow-light: 0 1px 3px rgba(0,0,0,0.12), 0 1px 2px rgba(0,0,0,0.24);
    }
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        background-color: var(--bg-primary);
        color: var(--text-primary);
        line-height: 1.5;
        font-size: 14px;
        padding: 40px 20px;
    }
    .container { max-width: 800px; margin: 0 auto; }
    .error-header { display: flex; align-items: flex-start; gap: 16px; margin-bottom: 24px; }
    .error-icon {
        width: 48px; height: 48px;
        background: var(--blue-light);
        border-radius: 50%;
        display: flex; align-items: center; justify-content: center;
        flex-shrink: 0; margin-top: 4px;
    }
    .error-icon svg { width: 24px; height: 24px; fill: var(--blue-primary); }
    .error-title-section { flex: 1; }
    .error-status { color: var(--text-secondary); font-size: 14px; margin-bottom: 4px; }
    .error-title { font-size: 28px; font-weight: 400; margin-bottom: 16px; line-height: 1.2; word-break: break-all; }
    .error-description { color: var(--text-secondary); font-size: 16px; margin-bottom: 32px; white-space: pre-wrap; }
    .section {
        background: var(--bg-card);
        border: 1px solid var(--border-color);
        border-radius: 8px;
        margin-bottom: 24px;
        overflow: hidden;
        box-shadow: var(--shadow-light);
    }
    .section-header { padding: 16px 24px; border-bottom: 1px solid var(--border-light); font-weight: 500; font-size: 16px; }
    .section-content { padding: 24px; }
    .details-grid { display: grid; grid-template-columns: 200px 1fr; gap: 16px 24px; align-items: start; }
    .detail-label { color: var(--text-secondary); }
    .detail-value { word-break: break-all; }
    .stack-trace-content {
        font-family: "SF Mono", Monaco, "Cascadia Code", "Roboto Mono", Consolas, "Courier New", monospace;
        font-size: 13px;
        line-height: 1.4;
        background: var(--bg-section);
        padding: 16px;
        border-radius: 4px;
        overflow-x: auto;
        white-space: pre-wrap;
    }
    .copy-button-container { text-align: right; margin-top: 32px; }
    .copy-markdown-btn {
        background: var(--blue-primary);
        color: white;
        border: none;
        padding: 10px 16px;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: 500;
        display: inline-flex; align-items: center; gap: 8px;
    }
    .copy-markdown-btn:hover { background: #3367d6; }
    .copy-feedback { margin-left: 12px; color: var(--blue-primary); opacity: 0; transition: opacity 0.3s ease; }
    .copy-feedback.show { opacity: 1; }
    @media (max-width: 768px) {
        body { padding: 20px 16px; }
        .error-header { flex-direction: column; text-align: center; }
        .error-icon { align-self: center; }
        .details-grid { grid-template-columns: 1fr; gap: 8px; }
        .section-content { padding: 16px; }
    }
"#;

const DARK_STYLES: &str = r#"    @media (prefers-color-scheme: dark) {
        :root {
            --bg-primary: #121212;
            --bg-card: #1e1e1e;
            --bg-section: #2a2a2a;
            --text-primary: #e8eaed;
            --text-secondary: #9aa0a6;
            --border-color: #3c4043;
            --border-light: #303134;
            --blue-primary: #8ab4f8;
            --blue-light: #1f2a3c;
        }
    }
"#;

const SCRIPT: &str = r####"
    function copyAsMarkdown() {
        const markdown = generateMarkdown(errorData);
        if (navigator.clipboard) {
            navigator.clipboard.writeText(markdown).then(showCopyFeedback);
        } else {
            const textarea = document.createElement("textarea");
            textarea.value = markdown;
            document.body.appendChild(textarea);
            textarea.select();
            document.execCommand("copy");
            document.body.removeChild(textarea);
            showCopyFeedback();
        }
    }

    function showCopyFeedback() {
        const feedback = document.getElementById("copyFeedback");
        feedback.classList.add("show");
        setTimeout(() => feedback.classList.remove("show"), 2000);
    }

    function inlineArgument(arg) {
        if (typeof arg.value === "string") {
            let text = Array.from(arg.value);
            let clipped = text.slice(0, 100).join("");
            if (text.length > 100) clipped += "...";
            return "`" + clipped + "`";
        }
        return JSON.stringify(arg.value);
    }

    function generateMarkdown(data) {
        let md = "# \u{1F6A8} Error Report\n\n";

        md += "## Error Summary\n";
        md += "- **Message**: " + data.message + "\n";
        md += "- **Type**: `" + data.class + "`\n";
        md += "- **File**: `" + data.file + "`\n";
        md += "- **Line**: " + data.line + "\n";
        if (data.http_status) md += "- **HTTP Status**: " + data.http_status + "\n";
        md += "- **Timestamp**: " + data.timestamp + "\n\n";

        if (data.request) {
            md += "## Request Information\n";
            if (data.request.method) md += "- **Method**: " + data.request.method + "\n";
            if (data.request.uri) md += "- **URI**: `" + data.request.uri + "`\n";
            if (data.request.host) md += "- **Host**: " + data.request.host + "\n";
            if (data.request.user_agent) md += "- **User Agent**: " + data.request.user_agent + "\n";
            if (data.request.ip) md += "- **IP**: " + data.request.ip + "\n";
            md += "\n";
        }

        md += "## Stack Trace\n\n";
        data.trace.forEach((frame) => {
            md += "### Frame " + frame.index + "\n";
            if (frame.class) {
                md += "**Function**: `" + frame.class + (frame.type || "::") + frame.function + "()`\n";
            } else {
                md += "**Function**: `" + frame.function + "()`\n";
            }
            md += "**Location**: `" + frame.file + ":" + frame.line + "`\n";
            if (frame.args && frame.args.length > 0) {
                md += "**Arguments**:\n";
                frame.args.forEach((arg) => {
                    md += "- `" + arg.type + "`: " + inlineArgument(arg) + "\n";
                });
            }
            md += "\n";
        });

        md += "## System Information\n";
        md += "- **Runtime**: " + data.runtime_version + "\n";
        md += "- **Operating System**: " + data.operating_system + "\n";
        md += "- **Memory Usage**: " + formatBytes(data.memory_usage) + "\n";
        md += "- **Peak Memory**: " + formatBytes(data.peak_memory) + "\n";
        return md;
    }

    function formatBytes(bytes) {
        const units = ["B", "KB", "MB", "GB"];
        let index = 0;
        while (bytes >= 1024 && index < units.length - 1) {
            bytes /= 1024;
            index++;
        }
        return parseFloat(bytes.toFixed(2)) + " " + units[index];
    }
"####;

const ICON_PATH: &str = "M12 2C6.48 2 2 6.48 2 12s4.48 10 10 10 10-4.48 10-10S17.52 2 12 2zm1 15h-2v-2h2v2zm0-4h-2V7h2v6z";

const COPY_ICON_PATH: &str = "M16 1H4c-1.1 0-2 .9-2 2v14h2V3h12V1zm3 4H8c-1.1 0-2 .9-2 2v14c0 1.1.9 2 2 2h11c1.1 0 2-.9 2-2V7c0-1.1-.9-2-2-2zm0 16H8V7h11v14z";

/// Renders reports as a standalone HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    auto_theme: bool,
}

impl HtmlRenderer {
    /// Create a renderer with the light theme only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the viewer's `prefers-color-scheme` setting.
    pub fn with_auto_theme(mut self, enabled: bool) -> Self {
        self.auto_theme = enabled;
        self
    }

    /// Escape text for HTML content and attribute values.
    pub fn escape_html(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// Report as a JSON literal that is safe to place inside a `<script>` block.
    pub fn script_json(report: &ErrorReport) -> String {
        serde_json::to_string(report)
            .unwrap_or_else(|_| "{}".to_string())
            .replace('<', "\\u003C")
            .replace('>', "\\u003E")
            .replace('&', "\\u0026")
            .replace('\'', "\\u0027")
    }

    fn render_head(&self) -> String {
        let mut head = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
             <title>Crashguard - Error Details</title>\n",
        );
        head.push_str(STYLES);
        if self.auto_theme {
            head.push_str(DARK_STYLES);
        }
        head.push_str("</style>\n</head>\n");
        head
    }

    fn render_error_header(report: &ErrorReport) -> String {
        let status_text = match report.http_status() {
            Some(status) => match reason_phrase(status) {
                Some(reason) => format!("{} {}", status, reason),
                None => status.to_string(),
            },
            None => "Error".to_string(),
        };

        format!(
            "<div class=\"error-header\">\
             <div class=\"error-icon\"><svg viewBox=\"0 0 24 24\"><path d=\"{}\"/></svg></div>\
             <div class=\"error-title-section\">\
             <div class=\"error-status\">{}</div>\
             <h1 class=\"error-title\">{}</h1>\
             </div></div>\n\
             <div class=\"error-description\">{}</div>\n",
            ICON_PATH,
            Self::escape_html(&status_text),
            Self::escape_html(report.type_name()),
            Self::escape_html(report.message()),
        )
    }

    fn render_grid_section(title: &str, rows: &[(String, String)]) -> String {
        let mut html = format!(
            "<div class=\"section\"><div class=\"section-header\">{}</div>\
             <div class=\"section-content\"><div class=\"details-grid\">",
            Self::escape_html(title)
        );
        for (label, value) in rows {
            html.push_str(&format!(
                "<div class=\"detail-label\">{}</div><div class=\"detail-value\">{}</div>",
                Self::escape_html(label),
                Self::escape_html(value)
            ));
        }
        html.push_str("</div></div></div>\n");
        html
    }

    fn render_details(report: &ErrorReport) -> String {
        let mut rows = vec![
            ("Exception Class".to_string(), report.type_name().to_string()),
            (
                "Location".to_string(),
                format!("{}:{}", report.file(), report.line()),
            ),
            ("Timestamp".to_string(), report.timestamp().to_string()),
        ];
        if let Some(status) = report.http_status() {
            rows.push(("HTTP Status Code".to_string(), status.to_string()));
        }
        Self::render_grid_section("Details", &rows)
    }

    fn render_request(report: &ErrorReport) -> String {
        let Some(request) = report.request() else {
            return String::new();
        };
        let rows: Vec<(String, String)> = request
            .entries()
            .into_iter()
            .map(|(key, value)| (humanize_key(key), value.to_string()))
            .collect();
        Self::render_grid_section("Request Information", &rows)
    }

    fn render_stack_trace(report: &ErrorReport) -> String {
        if report.trace().is_empty() {
            return String::new();
        }

        let mut text = String::new();
        for frame in report.trace() {
            text.push_str(&format!(
                "#{} {}({}): {}\n",
                frame.index,
                frame.file,
                frame.line,
                frame.signature()
            ));
            if let Some(args) = frame.args.as_ref().filter(|args| !args.is_empty()) {
                text.push_str("    Arguments:\n");
                for (index, arg) in args.iter().enumerate() {
                    text.push_str(&format!(
                        "      [{}] {} {}\n",
                        index,
                        arg.type_name(),
                        inline_argument(arg, "\"")
                    ));
                }
            }
        }

        format!(
            "<div class=\"section\"><div class=\"section-header\">Stack Trace</div>\
             <div class=\"section-content\"><div class=\"stack-trace-content\">{}</div></div></div>\n",
            Self::escape_html(&text)
        )
    }

    fn render_runtime_context(report: &ErrorReport) -> String {
        let rows = vec![
            ("Runtime".to_string(), report.runtime_version().to_string()),
            (
                "Operating System".to_string(),
                report.operating_system().to_string(),
            ),
            ("Memory Usage".to_string(), format_bytes(report.memory_usage())),
            ("Peak Memory".to_string(), format_bytes(report.peak_memory())),
        ];
        Self::render_grid_section("Runtime Context", &rows)
    }

    fn render_copy_button(report: &ErrorReport) -> String {
        format!(
            "<div class=\"copy-button-container\">\
             <button class=\"copy-markdown-btn\" onclick=\"copyAsMarkdown()\">\
             <svg width=\"16\" height=\"16\" viewBox=\"0 0 24 24\" fill=\"currentColor\"><path d=\"{}\"/></svg>\
             Copy as Markdown</button>\
             <span class=\"copy-feedback\" id=\"copyFeedback\">Copied to clipboard!</span>\
             </div>\n<script>\n    const errorData = {};\n{}</script>\n",
            COPY_ICON_PATH,
            Self::script_json(report),
            SCRIPT
        )
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, report: &ErrorReport) -> String {
        let mut html = self.render_head();
        html.push_str("<body>\n<div class=\"container\">\n");
        html.push_str(&Self::render_error_header(report));
        html.push_str(&Self::render_details(report));
        html.push_str(&Self::render_request(report));
        html.push_str(&Self::render_stack_trace(report));
        html.push_str(&Self::render_runtime_context(report));
        html.push_str(&Self::render_copy_button(report));
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryUsage;
    use crate::report::{Exception, RawFrame, ReportBuilder, RequestInfo};
    use crate::value::Value;

    fn builder() -> ReportBuilder {
        ReportBuilder::default()
            .with_timestamp("2024-01-01 12:00:00")
            .with_memory(MemoryUsage {
                current: 1024,
                peak: 2048,
            })
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(HtmlRenderer::escape_html("A & B"), "A &amp; B");
        assert_eq!(
            HtmlRenderer::escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_page_structure() {
        let err = Exception::new("NotFound", "User 42 not found")
            .with_status(404)
            .with_frame(RawFrame::new("find_user").at("src/users.rs", 9));
        let html = HtmlRenderer::new().render(&builder().build(&err));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"error-status\">404 Not Found</div>"));
        assert!(html.contains("<h1 class=\"error-title\">NotFound</h1>"));
        assert!(html.contains("User 42 not found"));
        assert!(html.contains("HTTP Status Code"));
        assert!(html.contains("#1 src/users.rs(9): find_user()"));
        assert!(html.contains("Runtime Context"));
        assert!(html.contains("Copy as Markdown"));
        assert!(html.contains("function generateMarkdown(data)"));
        assert!(html.contains("let md = \"# \\u{1F6A8} Error Report\\n\\n\";"));
        assert!(html.contains("md += \"## System Information\\n\";"));
        assert!(html.contains("function formatBytes(bytes)"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_status_without_reason() {
        let err = Exception::new("E", "m").with_code(299);
        let html = HtmlRenderer::new().render(&builder().build(&err));
        assert!(html.contains("<div class=\"error-status\">299</div>"));
    }

    #[test]
    fn test_plain_error_status() {
        let err = Exception::new("E", "m");
        let html = HtmlRenderer::new().render(&builder().build(&err));
        assert!(html.contains("<div class=\"error-status\">Error</div>"));
        assert!(!html.contains("HTTP Status Code"));
    }

    #[test]
    fn test_message_is_escaped() {
        let err = Exception::new("E", "<img src=x onerror=alert(1)>");
        let html = HtmlRenderer::new().render(&builder().build(&err));
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_embedded_json_cannot_close_script() {
        let err = Exception::new("E", "</script><script>alert('x')</script>");
        let report = builder().build(&err);
        let json = HtmlRenderer::script_json(&report);

        assert!(!json.contains("</script>"));
        assert!(!json.contains('\''));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["message"], "</script><script>alert('x')</script>");
    }

    #[test]
    fn test_request_section() {
        let err = Exception::new("E", "m");
        let report = builder()
            .with_request(Some(
                RequestInfo::new()
                    .with_method("GET")
                    .with_host("example.com"),
            ))
            .build(&err);
        let html = HtmlRenderer::new().render(&report);

        assert!(html.contains("Request Information"));
        assert!(html.contains("<div class=\"detail-label\">Method</div><div class=\"detail-value\">GET</div>"));
        assert!(html.contains("example.com"));
    }

    #[test]
    fn test_auto_theme_adds_dark_palette() {
        let report = builder().build(&Exception::new("E", "m"));
        assert!(HtmlRenderer::new()
            .with_auto_theme(true)
            .render(&report)
            .contains("prefers-color-scheme: dark"));
        assert!(!HtmlRenderer::new()
            .render(&report)
            .contains("prefers-color-scheme"));
    }

    #[test]
    fn test_sensitive_values_absent() {
        let err = Exception::new("E", "m").with_frame(
            RawFrame::new("connect").with_args([
                Value::map([("username", "john_doe"), ("password", "secret123")]),
                Value::from("<admin>"),
            ]),
        );
        let html = HtmlRenderer::new().render(&builder().build(&err));
        let page = html.split("<script>").next().unwrap();

        assert!(page.contains("    Arguments:\n      [0] array "));
        assert!(page.contains("john_doe"));
        assert!(page.contains("[REDACTED]"));
        assert!(page.contains("      [1] string &quot;&lt;admin&gt;&quot;\n"));
        assert!(!html.contains("secret123"));
    }

    #[test]
    fn test_operating_system_from_report() {
        let report = builder()
            .with_operating_system("Plan 9")
            .build(&Exception::new("E", "m"));
        let html = HtmlRenderer::new().render(&report);

        assert!(html.contains("<div class=\"detail-label\">Operating System</div><div class=\"detail-value\">Plan 9</div>"));
        assert!(html.contains("\"operating_system\":\"Plan 9\""));
    }
}
