//! Stack frames: raw frames supplied by errors and the formatted frames
//! stored in reports, plus parsing of captured backtraces.

use std::backtrace::Backtrace;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::value::{FormattedValue, Value};

/// How a function was invoked relative to its owning type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    /// Method called on a value (`value.method()`).
    Instance,
    /// Associated function or path call (`Type::function()`).
    Static,
}

impl CallType {
    /// Separator placed between type and function name.
    pub fn marker(self) -> &'static str {
        match self {
            CallType::Instance => ".",
            CallType::Static => "::",
        }
    }
}

impl Serialize for CallType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.marker())
    }
}

/// A call-site entry as provided by an error, before formatting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    /// Source file, if known.
    pub file: Option<String>,
    /// Line number, if known.
    pub line: Option<u32>,
    /// Function name, if known.
    pub function: Option<String>,
    /// Owning type, if any.
    pub class: Option<String>,
    /// Instance or static call marker.
    pub call_type: Option<CallType>,
    /// Call arguments, if they were captured.
    pub args: Option<Vec<Value>>,
}

impl RawFrame {
    /// Create a frame for `function`.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            ..Self::default()
        }
    }

    /// Set the source location.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Set the owning type and call marker.
    pub fn in_class(mut self, class: impl Into<String>, call_type: CallType) -> Self {
        self.class = Some(class.into());
        self.call_type = Some(call_type);
        self
    }

    /// Attach call arguments.
    pub fn with_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }
}

/// A formatted frame of an [`ErrorReport`](crate::ErrorReport).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackFrame {
    /// Position in the trace; 0 is the throw site.
    pub index: usize,
    /// Source file, `unknown` when not available.
    pub file: String,
    /// Line number, 0 when not available.
    pub line: u32,
    /// Function name, `unknown` when not available.
    pub function: String,
    /// Owning type, if any.
    pub class: Option<String>,
    /// Instance or static call marker.
    #[serde(rename = "type")]
    pub call_type: Option<CallType>,
    /// Formatted arguments when argument capture is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<FormattedValue>>,
}

impl StackFrame {
    /// Call signature such as `Type::function()` or `function()`.
    pub fn signature(&self) -> String {
        match &self.class {
            Some(class) => format!(
                "{}{}{}()",
                class,
                self.call_type.unwrap_or(CallType::Static).marker(),
                self.function
            ),
            None => format!("{}()", self.function),
        }
    }

    /// `file:line` of the frame.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// Function-name prefixes of panic and unwinding machinery.
const RUNTIME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "rust_begin_unwind",
    "rust_panic",
    "__rust",
    "__libc_start",
    "_start",
    "crashguard::handler::",
    "crashguard::report::",
    "<alloc::",
    "<core::",
    "<std::",
];

fn frame_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+):\s+(.+?)\s*$").expect("frame line regex is valid")
    })
}

fn location_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s+at\s+(.+?):(\d+)(?::\d+)?\s*$").expect("location line regex is valid")
    })
}

fn hash_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"::h[0-9a-f]{16}$").expect("hash suffix regex is valid"))
}

/// Parse the text form of a [`Backtrace`] into raw frames.
///
/// Each `N: symbol` line starts a frame; the `at file:line:col` line that
/// follows it supplies the location. Inlined frames without a location keep
/// `None` for file and line.
pub fn parse_backtrace(text: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = location_line_regex().captures(line) {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    frame.file = Some(caps[1].to_string());
                    frame.line = caps[2].parse().ok();
                }
            }
            continue;
        }

        if let Some(caps) = frame_line_regex().captures(line) {
            frames.push(split_symbol(&caps[2]));
        }
    }

    frames
}

/// Symbol std and the test harness place below `main` and thread entry points.
const SHORT_BACKTRACE_MARKER: &str = "__rust_begin_short_backtrace";

/// Symbols of the C entry point and frames without debug info.
const ENTRY_SYMBOLS: &[&str] = &["main", "<unknown>"];

fn frame_symbol(frame: &RawFrame) -> Option<String> {
    match (&frame.class, &frame.function) {
        (Some(class), Some(function)) => Some(format!("{}::{}", class, function)),
        (Some(class), None) => Some(class.clone()),
        (None, Some(function)) => Some(function.clone()),
        (None, None) => None,
    }
}

/// Drop panic machinery and process startup frames from a parsed trace.
///
/// Everything from the short-backtrace marker outwards is startup code.
/// Runtime frames are then removed from both ends of what remains.
pub fn trim_runtime_frames(mut frames: Vec<RawFrame>) -> Vec<RawFrame> {
    if let Some(marker) = frames.iter().position(|f| {
        frame_symbol(f).is_some_and(|symbol| symbol.contains(SHORT_BACKTRACE_MARKER))
    }) {
        frames.truncate(marker);
    }

    let is_runtime = |frame: &RawFrame| match frame_symbol(frame) {
        Some(symbol) => {
            ENTRY_SYMBOLS.contains(&symbol.as_str())
                || RUNTIME_PREFIXES.iter().any(|p| symbol.starts_with(p))
        }
        None => true,
    };

    let start = frames.iter().position(|f| !is_runtime(f));
    let end = frames.iter().rposition(|f| !is_runtime(f));
    match (start, end) {
        (Some(start), Some(end)) => frames[start..=end].to_vec(),
        _ => Vec::new(),
    }
}

/// Capture the current call stack as raw frames, without panic machinery.
pub fn capture_frames() -> Vec<RawFrame> {
    frames_from_backtrace(&Backtrace::force_capture())
}

/// Convert a captured backtrace into raw frames, without panic machinery.
pub fn frames_from_backtrace(backtrace: &Backtrace) -> Vec<RawFrame> {
    trim_runtime_frames(parse_backtrace(&backtrace.to_string()))
}

/// Split a demangled symbol into owning type and function name.
fn split_symbol(symbol: &str) -> RawFrame {
    let symbol = hash_suffix_regex().replace(symbol, "");

    if symbol.starts_with('<') {
        if let Some(idx) = symbol.rfind(">::") {
            return RawFrame::new(&symbol[idx + 3..])
                .in_class(&symbol[..=idx], CallType::Static);
        }
    }

    if let Some(idx) = symbol.rfind("::") {
        let (owner, function) = (&symbol[..idx], &symbol[idx + 2..]);
        let owner_is_type = owner
            .rsplit("::")
            .next()
            .and_then(|segment| segment.chars().next())
            .is_some_and(char::is_uppercase);
        if owner_is_type {
            return RawFrame::new(function).in_class(owner, CallType::Static);
        }
    }

    RawFrame::new(symbol.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::panicking::begin_panic_handler::{{closure}}
             at /rustc/abc/library/std/src/panicking.rs:665:13
   2: app::service::UserService::save::h0123456789abcdef
             at ./src/service.rs:42:9
   3: <app::db::Pool as app::db::Connect>::connect
             at ./src/db.rs:7:5
   4: app::main::{{closure}}
   5: app::main
             at ./src/main.rs:12:5
   6: core::ops::function::FnOnce::call_once
             at /rustc/abc/library/core/src/ops/function.rs:250:5
";

    #[test]
    fn test_parse_backtrace() {
        let frames = parse_backtrace(SAMPLE);
        assert_eq!(frames.len(), 7);

        let save = &frames[2];
        assert_eq!(save.class.as_deref(), Some("app::service::UserService"));
        assert_eq!(save.function.as_deref(), Some("save"));
        assert_eq!(save.file.as_deref(), Some("./src/service.rs"));
        assert_eq!(save.line, Some(42));
    }

    #[test]
    fn test_parse_trait_impl_symbol() {
        let frames = parse_backtrace(SAMPLE);
        let connect = &frames[3];
        assert_eq!(
            connect.class.as_deref(),
            Some("<app::db::Pool as app::db::Connect>")
        );
        assert_eq!(connect.function.as_deref(), Some("connect"));
    }

    #[test]
    fn test_inlined_frame_has_no_location() {
        let frames = parse_backtrace(SAMPLE);
        let closure = &frames[4];
        assert_eq!(closure.function.as_deref(), Some("app::main::{{closure}}"));
        assert!(closure.class.is_none());
        assert!(closure.file.is_none());
        assert!(closure.line.is_none());
    }

    #[test]
    fn test_trim_runtime_frames() {
        let frames = trim_runtime_frames(parse_backtrace(SAMPLE));
        let names: Vec<_> = frames
            .iter()
            .map(|f| f.function.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["save", "connect", "app::main::{{closure}}", "app::main"]);
    }

    const PANIC_IN_MAIN: &str = "   0: std::backtrace_rs::backtrace::libunwind::trace
   1: std::backtrace::Backtrace::force_capture
   2: crashguard::report::frame::capture_frames
   3: crashguard::handler::Crashguard::install_global_handlers::{{closure}}
   4: std::panicking::rust_panic_with_hook
   5: std::panicking::begin_panic_handler::{{closure}}
   6: rust_begin_unwind
   7: core::panicking::panic_fmt
   8: app::run
             at ./src/main.rs:118:13
   9: app::main
             at ./src/main.rs:96:11
  10: core::ops::function::FnOnce::call_once
             at /rustc/abc/library/core/src/ops/function.rs:250:5
  11: std::sys::backtrace::__rust_begin_short_backtrace
             at /rustc/abc/library/std/src/sys/backtrace.rs:152:18
  12: std::rt::lang_start::{{closure}}
  13: core::ops::function::impls::<impl core::ops::function::FnOnce<A> for &F>::call_once
  14: std::panicking::try::do_call
  15: std::panicking::try
  16: std::panic::catch_unwind
  17: std::rt::lang_start_internal::{{closure}}
  18: std::rt::lang_start_internal
  19: std::rt::lang_start
  20: main
  21: __libc_start_call_main
  22: __libc_start_main_impl
  23: _start
  24: <unknown>
";

    #[test]
    fn test_trim_cuts_startup_frames() {
        let frames = trim_runtime_frames(parse_backtrace(PANIC_IN_MAIN));
        let names: Vec<_> = frames
            .iter()
            .map(|f| f.function.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["app::run", "app::main"]);
    }

    #[test]
    fn test_trim_without_marker_drops_entry_frames() {
        let text = "   0: app::run
   1: app::main
   2: std::rt::lang_start
   3: main
   4: <unknown>
";
        let frames = trim_runtime_frames(parse_backtrace(text));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].function.as_deref(), Some("app::main"));
    }

    #[test]
    fn test_disabled_backtrace_yields_nothing() {
        assert!(parse_backtrace("disabled backtrace").is_empty());
        assert!(trim_runtime_frames(Vec::new()).is_empty());
    }

    #[test]
    fn test_signature() {
        let frame = StackFrame {
            index: 1,
            file: "src/service.rs".to_string(),
            line: 42,
            function: "save".to_string(),
            class: Some("UserService".to_string()),
            call_type: Some(CallType::Instance),
            args: None,
        };
        assert_eq!(frame.signature(), "UserService.save()");
        assert_eq!(frame.location(), "src/service.rs:42");

        let free = StackFrame {
            class: None,
            call_type: None,
            function: "process_user_data".to_string(),
            ..frame
        };
        assert_eq!(free.signature(), "process_user_data()");
    }

    #[test]
    fn test_raw_frame_builder() {
        let frame = RawFrame::new("save_to_database")
            .at("src/db.rs", 10)
            .with_args([Value::from("x"), Value::Integer(1)]);
        assert_eq!(frame.args.as_ref().map(Vec::len), Some(2));
        assert_eq!(frame.line, Some(10));
    }
}
