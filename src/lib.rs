//! Crashguard - drop-in crash handler with redacted, human-readable reports
//!
//! Installing a [`Crashguard`] replaces the default panic output with a
//! structured report: error summary, request metadata, a stack trace with
//! formatted call arguments, and runtime information. Reports render as
//! colored terminal text, a self-contained HTML page, or Markdown, and
//! values under sensitive keys (passwords, tokens, ...) are redacted before
//! anything is displayed.
//!
//! # Examples
//!
//! ```no_run
//! use crashguard::CrashguardConfig;
//!
//! let guard = crashguard::init(CrashguardConfig::default().with_max_string_length(500));
//! let _shutdown = guard.shutdown_guard();
//!
//! // From here on, any panic is reported and the process exits with status 1.
//! ```
//!
//! Reports can also be built and rendered without terminating:
//!
//! ```
//! use crashguard::{generate_markdown, Exception, RawFrame, ReportBuilder, Value};
//!
//! let error = Exception::new("RuntimeError", "Database connection failed")
//!     .with_frame(RawFrame::new("connect").with_args([Value::map([("password", "hunter2")])]));
//! let markdown = generate_markdown(&ReportBuilder::default().build(&error));
//!
//! assert!(markdown.contains("[REDACTED]"));
//! assert!(!markdown.contains("hunter2"));
//! ```

pub mod config;
pub mod demo;
pub mod environment;
pub mod error;
pub mod handler;
pub mod logging;
pub mod render;
pub mod report;
pub mod value;

pub use config::CrashguardConfig;
pub use environment::{
    Environment, MemoryUsage, OutputStream, ProcessEnvironment, StaticEnvironment,
};
pub use error::{CrashguardError, Result};
pub use handler::{init, Crashguard, Dispatch, OutputFormat, ShutdownGuard};
pub use render::{
    generate_markdown, CliRenderer, HtmlRenderer, MarkdownRenderer, Palette, Renderer,
};
pub use report::{
    CallType, ErrorReport, Exception, PanicError, RawFrame, ReportBuilder, Reportable,
    RequestInfo, Severity, SeverityError, StackFrame,
};
pub use value::{
    CompositeMatcher, Describe, Entry, FormattedValue, Object, RegexMatcher, SensitiveKeyMatcher,
    SubstringMatcher, Value, ValueFormatter,
};
