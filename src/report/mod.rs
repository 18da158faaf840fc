//! Crash report data model and construction.
//!
//! A raised error (anything implementing [`Reportable`]) is turned into a
//! flat, immutable [`ErrorReport`] by the [`ReportBuilder`]: message, type,
//! origin, a contiguous trace whose frame 0 is the throw site, optional
//! request metadata, timestamp and memory counters.

mod builder;
mod exception;
mod frame;
mod severity;

pub use builder::{ErrorReport, ReportBuilder, RequestInfo};
pub use exception::{payload_message, Exception, PanicError, Reportable, SeverityError};
pub use frame::{
    capture_frames, frames_from_backtrace, parse_backtrace, trim_runtime_frames, CallType,
    RawFrame, StackFrame,
};
pub use severity::Severity;
