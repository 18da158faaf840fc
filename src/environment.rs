//! Ambient process context: environment variables, console attachment and
//! memory counters.
//!
//! Access goes through the [`Environment`] trait so renderer selection and
//! color detection can be exercised without touching the real process.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Standard stream a report can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output, for HTML pages served back to the client.
    Stdout,
    /// Standard error, for terminal reports.
    Stderr,
}

/// Source of environment variables and terminal state.
pub trait Environment: Send + Sync + Debug {
    /// Value of an environment variable, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Whether `stream` is attached to an interactive terminal.
    fn is_terminal(&self, stream: OutputStream) -> bool;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_terminal(&self, stream: OutputStream) -> bool {
        match stream {
            OutputStream::Stdout => console::Term::stdout().is_term(),
            OutputStream::Stderr => console::Term::stderr().is_term(),
        }
    }
}

/// Fixed environment, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
    stdout_terminal: bool,
    stderr_terminal: bool,
}

impl StaticEnvironment {
    /// Create an empty, non-terminal environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set whether a terminal is attached to both stdout and stderr.
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.stdout_terminal = terminal;
        self.stderr_terminal = terminal;
        self
    }

    /// Set whether a terminal is attached to `stream` only.
    pub fn with_stream_terminal(mut self, stream: OutputStream, terminal: bool) -> Self {
        match stream {
            OutputStream::Stdout => self.stdout_terminal = terminal,
            OutputStream::Stderr => self.stderr_terminal = terminal,
        }
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn is_terminal(&self, stream: OutputStream) -> bool {
        match stream {
            OutputStream::Stdout => self.stdout_terminal,
            OutputStream::Stderr => self.stderr_terminal,
        }
    }
}

/// Whether terminal rendering should be used.
///
/// True when a console is attached to stderr, or when no request is being
/// served (no `HTTP_HOST`).
pub fn detect_cli_mode(env: &dyn Environment) -> bool {
    env.is_terminal(OutputStream::Stderr) || env.var("HTTP_HOST").is_none()
}

/// Whether ANSI colors can be written to `stream`.
///
/// Requires `stream` to be a terminal, a `TERM` other than `dumb`, and no `NO_COLOR`.
pub fn supports_color(env: &dyn Environment, stream: OutputStream) -> bool {
    if !env.is_terminal(stream) {
        return false;
    }

    match env.var("TERM") {
        None => return false,
        Some(term) if term == "dumb" => return false,
        Some(_) => {}
    }

    env.var("NO_COLOR").is_none()
}

/// Version string of the reporting runtime.
pub fn runtime_version() -> String {
    format!(
        "crashguard {} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Name of the operating system family.
pub fn operating_system() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" | "openbsd" | "netbsd" | "dragonfly" => "BSD",
        other => other,
    }
}

/// Highest resident set size seen by [`MemoryUsage::sample`].
static PEAK_SAMPLE: AtomicU64 = AtomicU64::new(0);

/// Resident memory of the current process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryUsage {
    /// Current resident set size.
    pub current: u64,
    /// Peak resident set size.
    pub peak: u64,
}

impl MemoryUsage {
    /// Read the process memory counters. Unavailable counters read as 0.
    pub fn sample() -> Self {
        let current = current_rss().unwrap_or(0);
        let sampled_peak = PEAK_SAMPLE.fetch_max(current, Ordering::Relaxed).max(current);
        let peak = peak_rss().unwrap_or(0).max(sampled_peak);
        Self { current, peak }
    }
}

fn current_rss() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    system.process(pid).map(|process| process.memory())
}

#[cfg(target_os = "linux")]
fn peak_rss() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_status_kib(&status, "VmHWM")
}

#[cfg(not(target_os = "linux"))]
fn peak_rss() -> Option<u64> {
    None
}

/// Read a `Field:   1234 kB` line of a proc status file, in bytes.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_kib(status: &str, field: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix(field)?.strip_prefix(':')?;
        let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
        Some(kib * 1024)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_terminal() -> StaticEnvironment {
        StaticEnvironment::new()
            .with_terminal(true)
            .with_var("TERM", "xterm-256color")
    }

    #[test]
    fn test_supports_color() {
        assert!(supports_color(&color_terminal(), OutputStream::Stderr));
    }

    #[test]
    fn test_no_color_disables() {
        let env = color_terminal().with_var("NO_COLOR", "1");
        assert!(!supports_color(&env, OutputStream::Stderr));
    }

    #[test]
    fn test_dumb_terminal_disables() {
        let env = color_terminal().with_var("TERM", "dumb");
        assert!(!supports_color(&env, OutputStream::Stderr));
    }

    #[test]
    fn test_missing_term_disables() {
        let env = StaticEnvironment::new().with_terminal(true);
        assert!(!supports_color(&env, OutputStream::Stderr));
    }

    #[test]
    fn test_not_a_terminal_disables() {
        let env = color_terminal().with_terminal(false);
        assert!(!supports_color(&env, OutputStream::Stderr));
    }

    #[test]
    fn test_color_follows_target_stream() {
        let env = color_terminal().with_stream_terminal(OutputStream::Stdout, false);

        assert!(supports_color(&env, OutputStream::Stderr));
        assert!(!supports_color(&env, OutputStream::Stdout));
    }

    #[test]
    fn test_cli_mode_detection() {
        assert!(detect_cli_mode(&StaticEnvironment::new()));
        assert!(detect_cli_mode(
            &StaticEnvironment::new()
                .with_terminal(true)
                .with_var("HTTP_HOST", "example.com")
        ));
        assert!(!detect_cli_mode(
            &StaticEnvironment::new().with_var("HTTP_HOST", "example.com")
        ));
        assert!(!detect_cli_mode(
            &StaticEnvironment::new()
                .with_stream_terminal(OutputStream::Stdout, true)
                .with_var("HTTP_HOST", "example.com")
        ));
    }

    #[test]
    fn test_parse_status_kib() {
        let status = "Name:\tcrashguard\nVmHWM:\t   2048 kB\nVmRSS:\t   1024 kB\n";
        assert_eq!(parse_status_kib(status, "VmHWM"), Some(2048 * 1024));
        assert_eq!(parse_status_kib(status, "VmRSS"), Some(1024 * 1024));
        assert_eq!(parse_status_kib(status, "VmSwap"), None);
    }

    #[test]
    fn test_memory_peak_not_below_current() {
        let usage = MemoryUsage::sample();
        assert!(usage.peak >= usage.current);
    }

    #[test]
    fn test_runtime_version() {
        assert!(runtime_version().starts_with("crashguard "));
    }
}
