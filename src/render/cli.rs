//! Terminal renderer.

use owo_colors::{OwoColorize, Style};

use super::palette::Palette;
use super::{format_bytes, humanize_key, inline_argument, Renderer};
use crate::environment::{self, Environment, OutputStream};
use crate::report::{ErrorReport, StackFrame};

/// Renders reports as plain or ANSI-colored terminal text.
#[derive(Debug, Clone)]
pub struct CliRenderer {
    palette: Palette,
    colors_enabled: bool,
    width: usize,
}

impl Default for CliRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRenderer {
    /// Create a renderer with colors disabled.
    pub fn new() -> Self {
        Self {
            palette: Palette::default(),
            colors_enabled: false,
            width: 60,
        }
    }

    /// Create a renderer with colors enabled when `env` supports them on `stream`.
    pub fn detect(env: &dyn Environment, stream: OutputStream) -> Self {
        Self::new().with_colors(environment::supports_color(env, stream))
    }

    /// Force colors on or off.
    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.colors_enabled = enabled;
        self
    }

    /// Use a custom palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Whether ANSI colors are emitted.
    pub fn colors_enabled(&self) -> bool {
        self.colors_enabled
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colors_enabled {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, output: &mut String, title: &str, style: Style) {
        output.push_str(&self.paint(title, style));
        output.push('\n');
        output.push_str(&"-".repeat(20));
        output.push('\n');
    }

    fn field(&self, output: &mut String, label: &str, value: &str) {
        output.push_str(&self.paint(&format!("{}: ", label), self.palette.label()));
        output.push_str(value);
        output.push('\n');
    }

    fn render_summary(&self, output: &mut String, report: &ErrorReport) {
        let style = self.palette.heading(self.palette.error);
        self.heading(output, "ERROR SUMMARY", style);
        self.field(output, "Message", report.message());
        self.field(output, "Type", report.type_name());
        self.field(output, "File", report.file());
        self.field(output, "Line", &report.line().to_string());
        if let Some(status) = report.http_status() {
            self.field(output, "HTTP Status", &status.to_string());
        }
        self.field(output, "Time", report.timestamp());
        output.push('\n');
    }

    fn render_request(&self, output: &mut String, report: &ErrorReport) {
        let Some(request) = report.request() else {
            return;
        };

        let style = self.palette.heading(self.palette.request);
        self.heading(output, "REQUEST INFORMATION", style);
        for (key, value) in request.entries() {
            self.field(output, &humanize_key(key), value);
        }
        output.push('\n');
    }

    fn render_frame(&self, output: &mut String, frame: &StackFrame) {
        let index_style = self.palette.heading(self.palette.frame_index);
        output.push_str(&self.paint(&format!("#{} ", frame.index), index_style));
        output.push_str(&self.paint(
            &frame.signature(),
            self.palette.plain(self.palette.signature),
        ));
        output.push_str("\n    ");
        output.push_str(&self.paint("at ", self.palette.muted()));
        output.push_str(&frame.location());
        output.push('\n');

        if let Some(args) = frame.args.as_ref().filter(|args| !args.is_empty()) {
            output.push_str(&self.paint("    Arguments:", self.palette.muted()));
            output.push('\n');
            for (index, arg) in args.iter().enumerate() {
                output.push_str(&self.paint(&format!("      [{}] ", index), self.palette.muted()));
                output.push_str(&self.paint(
                    arg.type_name(),
                    self.palette.plain(self.palette.type_tag),
                ));
                output.push(' ');
                output.push_str(&inline_argument(arg, "\""));
                output.push('\n');
            }
        }

        output.push('\n');
    }

    fn render_trace(&self, output: &mut String, report: &ErrorReport) {
        if report.trace().is_empty() {
            return;
        }

        let style = self.palette.heading(self.palette.trace);
        self.heading(output, "STACK TRACE", style);
        for frame in report.trace() {
            self.render_frame(output, frame);
        }
    }

    fn render_system(&self, output: &mut String, report: &ErrorReport) {
        let style = self.palette.heading(self.palette.system);
        self.heading(output, "SYSTEM INFORMATION", style);
        self.field(output, "Runtime", report.runtime_version());
        self.field(output, "Operating System", report.operating_system());
        self.field(output, "Memory Usage", &format_bytes(report.memory_usage()));
        self.field(output, "Peak Memory", &format_bytes(report.peak_memory()));
        output.push('\n');
    }
}

impl Renderer for CliRenderer {
    fn render(&self, report: &ErrorReport) -> String {
        let mut output = String::from("\n");

        output.push_str(&self.paint(" CRASHGUARD ERROR REPORT ", self.palette.banner()));
        output.push('\n');
        output.push_str(&"=".repeat(self.width));
        output.push_str("\n\n");

        self.render_summary(&mut output, report);
        self.render_request(&mut output, report);
        self.render_trace(&mut output, report);
        self.render_system(&mut output, report);

        output.push_str(&"=".repeat(self.width));
        output.push('\n');
        output.push_str(&self.paint(
            "Tip: set CRASHGUARD__CLI_MODE=false to get an HTML report with Markdown export",
            self.palette.muted(),
        ));
        output.push('\n');

        output
    }
}
