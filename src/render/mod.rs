//! Report renderers.
//!
//! Every renderer takes a finished [`ErrorReport`] and produces a string,
//! laying out the same sections in the same order: summary, request
//! information (when present), stack trace, system information.

mod cli;
mod html;
mod markdown;
mod palette;

pub use cli::CliRenderer;
pub use html::HtmlRenderer;
pub use markdown::MarkdownRenderer;
pub use palette::Palette;

use crate::report::ErrorReport;
use crate::value::FormattedValue;

/// Shared contract of all renderers.
pub trait Renderer {
    /// Render `report`. Rendering the same report twice yields identical output.
    fn render(&self, report: &ErrorReport) -> String;
}

/// Render `report` as Markdown, e.g. for an issue tracker or log sink.
pub fn generate_markdown(report: &ErrorReport) -> String {
    MarkdownRenderer::new().render(report)
}

/// Longest string argument shown inline before clipping.
const INLINE_ARGUMENT_CHARS: usize = 100;

/// Human-readable byte count with binary units, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut index = 0;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[index])
}

/// `user_agent` becomes `User agent`.
pub(crate) fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Inline display of an argument: clipped and quoted by `quote` for strings, JSON otherwise.
pub(crate) fn inline_argument(value: &FormattedValue, quote: &str) -> String {
    match value.as_str() {
        Some(text) => {
            let mut clipped: String = text.chars().take(INLINE_ARGUMENT_CHARS).collect();
            if text.chars().count() > INLINE_ARGUMENT_CHARS {
                clipped.push_str("...");
            }
            format!("{quote}{clipped}{quote}")
        }
        None => value.value_json().to_string(),
    }
}

/// Standard reason phrase for common HTTP status codes.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    let phrase = match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("user_agent"), "User agent");
        assert_eq!(humanize_key("ip"), "Ip");
        assert_eq!(humanize_key(""), "");
    }

    #[test]
    fn test_inline_argument() {
        let short = FormattedValue::String {
            value: "delete".to_string(),
            length: 6,
        };
        assert_eq!(inline_argument(&short, "\""), "\"delete\"");

        let long = FormattedValue::String {
            value: "x".repeat(150),
            length: 150,
        };
        let rendered = inline_argument(&long, "`");
        assert!(rendered.ends_with("...`"));
        assert_eq!(rendered.chars().count(), 100 + 3 + 2);

        assert_eq!(inline_argument(&FormattedValue::Integer(5), "\""), "5");
        assert_eq!(inline_argument(&FormattedValue::Null, "\""), "null");
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(404), Some("Not Found"));
        assert_eq!(reason_phrase(299), None);
    }
}
