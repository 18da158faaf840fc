//! Errors that can be turned into crash reports.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

use super::frame::{frames_from_backtrace, RawFrame};
use super::severity::Severity;

/// A raised error, as seen by the report builder.
///
/// Implemented by [`Exception`], [`SeverityError`] and [`PanicError`];
/// applications can implement it for their own error types to control the
/// numeric code, status and trace that end up in the report.
pub trait Reportable {
    /// Name of the error's type, shown as the report title.
    fn type_name(&self) -> &str;

    /// Human-readable message.
    fn message(&self) -> &str;

    /// Numeric code. Codes in `100..=599` double as an HTTP status hint.
    fn code(&self) -> i64 {
        0
    }

    /// Explicit HTTP-like status, preferred over the code heuristic.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// File where the error was raised.
    fn file(&self) -> &str;

    /// Line where the error was raised.
    fn line(&self) -> u32;

    /// Call stack below the throw site, innermost first.
    fn trace(&self) -> &[RawFrame] {
        &[]
    }
}

/// General-purpose reportable error.
///
/// The origin defaults to the caller of [`Exception::new`].
///
/// ```
/// use crashguard::{Exception, RawFrame, Reportable, Value};
///
/// let err = Exception::new("NotFoundError", "User 42 does not exist")
///     .with_status(404)
///     .with_frame(RawFrame::new("find_user").with_args([Value::Integer(42)]));
///
/// assert_eq!(err.status_code(), Some(404));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
    type_name: String,
    message: String,
    code: i64,
    status: Option<u16>,
    file: String,
    line: u32,
    frames: Vec<RawFrame>,
}

impl Exception {
    /// Create an error of type `type_name`, located at the caller.
    #[track_caller]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            type_name: type_name.into(),
            message: message.into(),
            code: 0,
            status: None,
            file: location.file().to_string(),
            line: location.line(),
            frames: Vec::new(),
        }
    }

    /// Adapt a standard error, folding its `source()` chain into the message.
    #[track_caller]
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        let full_name = std::any::type_name::<E>();
        let short_name = full_name
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or(full_name);

        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(&format!("\nCaused by: {}", cause));
            source = cause.source();
        }

        Self::new(short_name, message)
    }

    /// Set the numeric code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Set an explicit HTTP-like status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Override the origin.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Append a frame to the trace.
    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Append several frames to the trace.
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = RawFrame>) -> Self {
        self.frames.extend(frames);
        self
    }

    /// Append the frames of a captured backtrace.
    pub fn with_backtrace(self, backtrace: &Backtrace) -> Self {
        self.with_frames(frames_from_backtrace(backtrace))
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl std::error::Error for Exception {}

impl Reportable for Exception {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn trace(&self) -> &[RawFrame] {
        &self.frames
    }
}

/// Synthetic error wrapping a warning, notice or fatal signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityError {
    severity: Severity,
    type_name: String,
    message: String,
    file: String,
    line: u32,
    frames: Vec<RawFrame>,
}

impl SeverityError {
    /// Wrap a signal raised at `file:line`.
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            severity,
            type_name: format!("SeverityError({})", severity),
            message: message.into(),
            file: file.into(),
            line,
            frames: Vec::new(),
        }
    }

    /// Attach the call stack leading to the signal.
    pub fn with_frames(mut self, frames: Vec<RawFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Severity of the wrapped signal.
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for SeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

impl std::error::Error for SeverityError {}

impl Reportable for SeverityError {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn trace(&self) -> &[RawFrame] {
        &self.frames
    }
}

/// An uncaught panic.
#[derive(Debug, Clone, PartialEq)]
pub struct PanicError {
    message: String,
    file: String,
    line: u32,
    frames: Vec<RawFrame>,
}

impl PanicError {
    /// Build from a panic payload and location.
    pub fn new(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> Self {
        let (file, line) = location
            .map(|l| (l.file().to_string(), l.line()))
            .unwrap_or_else(|| ("unknown".to_string(), 0));
        Self {
            message: payload_message(payload),
            file,
            line,
            frames: Vec::new(),
        }
    }

    /// Attach frames parsed from a backtrace.
    pub fn with_frames(mut self, frames: Vec<RawFrame>) -> Self {
        self.frames = frames;
        self
    }
}

impl Reportable for PanicError {
    fn type_name(&self) -> &str {
        "panic"
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn trace(&self) -> &[RawFrame] {
        &self.frames
    }
}

/// Extract the message of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
