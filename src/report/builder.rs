//! Assembly of [`ErrorReport`]s from raised errors.

use serde::Serialize;

use super::exception::Reportable;
use super::frame::{CallType, RawFrame, StackFrame};
use crate::environment::{self, Environment, MemoryUsage};
use crate::value::ValueFormatter;

/// Request metadata of the request being served when the error occurred.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RequestInfo {
    /// HTTP method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Host header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// User agent header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Client address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl RequestInfo {
    /// Create empty request metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the request URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the client address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Read CGI-style variables (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_HOST`,
    /// `HTTP_USER_AGENT`, `REMOTE_ADDR`). Returns `None` outside a request.
    pub fn from_env(env: &dyn Environment) -> Option<Self> {
        let info = Self {
            method: env.var("REQUEST_METHOD"),
            uri: env.var("REQUEST_URI"),
            host: env.var("HTTP_HOST"),
            user_agent: env.var("HTTP_USER_AGENT"),
            ip: env.var("REMOTE_ADDR"),
        };
        (!info.is_empty()).then_some(info)
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Set fields as `(key, value)` pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("method", &self.method),
            ("uri", &self.uri),
            ("host", &self.host),
            ("user_agent", &self.user_agent),
            ("ip", &self.ip),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

/// Everything known about one terminating error.
///
/// Built once by [`ReportBuilder`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    message: String,
    #[serde(rename = "class")]
    type_name: String,
    code: i64,
    file: String,
    line: u32,
    trace: Vec<StackFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<RequestInfo>,
    timestamp: String,
    runtime_version: String,
    operating_system: String,
    memory_usage: u64,
    peak_memory: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
}

impl ErrorReport {
    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Type name of the error.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Numeric code of the error.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// File where the error was raised.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line where the error was raised.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Stack frames, throw site first.
    pub fn trace(&self) -> &[StackFrame] {
        &self.trace
    }

    /// Request metadata, if a request was being served.
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    /// Local time the report was built, `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Runtime version string.
    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// Operating system family the process ran on.
    pub fn operating_system(&self) -> &str {
        &self.operating_system
    }

    /// Resident memory in bytes.
    pub fn memory_usage(&self) -> u64 {
        self.memory_usage
    }

    /// Peak resident memory in bytes.
    pub fn peak_memory(&self) -> u64 {
        self.peak_memory
    }

    /// HTTP-like status, if any.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds [`ErrorReport`]s.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    formatter: ValueFormatter,
    show_arguments: bool,
    request: Option<RequestInfo>,
    timestamp: Option<String>,
    memory: Option<MemoryUsage>,
    runtime_version: Option<String>,
    operating_system: Option<String>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(ValueFormatter::default())
    }
}

impl ReportBuilder {
    /// Create a builder formatting arguments with `formatter`.
    pub fn new(formatter: ValueFormatter) -> Self {
        Self {
            formatter,
            show_arguments: true,
            request: None,
            timestamp: None,
            memory: None,
            runtime_version: None,
            operating_system: None,
        }
    }

    /// Include or omit call arguments.
    pub fn show_arguments(mut self, enabled: bool) -> Self {
        self.show_arguments = enabled;
        self
    }

    /// Attach request metadata. Empty metadata is dropped.
    pub fn with_request(mut self, request: Option<RequestInfo>) -> Self {
        self.request = request.filter(|r| !r.is_empty());
        self
    }

    /// Use a fixed timestamp instead of the current time.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Use fixed memory counters instead of sampling the process.
    pub fn with_memory(mut self, memory: MemoryUsage) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Use a fixed runtime version string.
    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = Some(version.into());
        self
    }

    /// Use a fixed operating system name.
    pub fn with_operating_system(mut self, os: impl Into<String>) -> Self {
        self.operating_system = Some(os.into());
        self
    }

    /// Build the report for `error`.
    pub fn build(&self, error: &dyn Reportable) -> ErrorReport {
        let memory = self.memory.unwrap_or_else(MemoryUsage::sample);

        ErrorReport {
            message: error.message().to_string(),
            type_name: error.type_name().to_string(),
            code: error.code(),
            file: error.file().to_string(),
            line: error.line(),
            trace: self.build_trace(error),
            request: self.request.clone(),
            timestamp: self.timestamp.clone().unwrap_or_else(|| {
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
            }),
            runtime_version: self
                .runtime_version
                .clone()
                .unwrap_or_else(environment::runtime_version),
            operating_system: self
                .operating_system
                .clone()
                .unwrap_or_else(|| environment::operating_system().to_string()),
            memory_usage: memory.current,
            peak_memory: memory.peak,
            http_status: status_hint(error),
        }
    }

    /// Throw site as frame 0, followed by the error's own trace.
    fn build_trace(&self, error: &dyn Reportable) -> Vec<StackFrame> {
        let throw_site = RawFrame::new("throw")
            .at(error.file(), error.line())
            .in_class(error.type_name(), CallType::Static);

        std::iter::once(&throw_site)
            .chain(error.trace().iter())
            .enumerate()
            .map(|(index, frame)| self.build_frame(index, frame))
            .collect()
    }

    fn build_frame(&self, index: usize, frame: &RawFrame) -> StackFrame {
        let args = if self.show_arguments {
            frame
                .args
                .as_ref()
                .map(|args| self.formatter.format_arguments(args))
        } else {
            None
        };

        StackFrame {
            index,
            file: frame.file.clone().unwrap_or_else(|| "unknown".to_string()),
            line: frame.line.unwrap_or(0),
            function: frame
                .function
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            class: frame.class.clone(),
            call_type: frame.call_type,
            args,
        }
    }
}

/// Explicit status if the error has one, else its code when it looks like an HTTP status.
fn status_hint(error: &dyn Reportable) -> Option<u16> {
    error.status_code().or_else(|| {
        let code = error.code();
        if (100..=599).contains(&code) {
            u16::try_from(code).ok()
        } else {
            None
        }
    })
}
