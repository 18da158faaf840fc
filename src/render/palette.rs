//! 24-bit RGB palette for terminal reports.

use owo_colors::{Rgb, Style};

/// Colors used by the terminal renderer.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Banner background and error headings - red (239, 68, 68)
    pub error: Rgb,
    /// Request section heading - blue (59, 130, 246)
    pub request: Rgb,
    /// Stack trace heading - yellow (234, 179, 8)
    pub trace: Rgb,
    /// Frame indices - cyan (34, 211, 238)
    pub frame_index: Rgb,
    /// Function signatures - magenta (217, 70, 239)
    pub signature: Rgb,
    /// Argument type tags - green (34, 197, 94)
    pub type_tag: Rgb,
    /// System section heading - white (229, 231, 235)
    pub system: Rgb,
    /// Secondary text - gray (107, 114, 128)
    pub muted: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            error: Rgb(239, 68, 68),
            request: Rgb(59, 130, 246),
            trace: Rgb(234, 179, 8),
            frame_index: Rgb(34, 211, 238),
            signature: Rgb(217, 70, 239),
            type_tag: Rgb(34, 197, 94),
            system: Rgb(229, 231, 235),
            muted: Rgb(107, 114, 128),
        }
    }
}

impl Palette {
    /// Banner: bold white on red.
    pub fn banner(&self) -> Style {
        Style::new().bold().white().on_color(self.error)
    }

    /// Bold heading in `color`.
    pub fn heading(&self, color: Rgb) -> Style {
        Style::new().bold().color(color)
    }

    /// Field label.
    pub fn label(&self) -> Style {
        Style::new().bold()
    }

    /// Plain text in `color`.
    pub fn plain(&self, color: Rgb) -> Style {
        Style::new().color(color)
    }

    /// Dimmed secondary text.
    pub fn muted(&self) -> Style {
        Style::new().color(self.muted)
    }
}
