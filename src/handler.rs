//! Process-wide crash interception.
//!
//! A [`Crashguard`] owns the configuration and collaborators used to turn a
//! terminating error into a rendered report. Installing it replaces the panic
//! hook; any uncaught panic (or a promoted recoverable signal) is rendered
//! once, written to the appropriate stream, and the process exits with
//! status 1.
//!
//! # Examples
//!
//! ```no_run
//! use crashguard::{CrashguardConfig, Severity};
//!
//! let guard = crashguard::init(CrashguardConfig::default());
//! let _shutdown = guard.shutdown_guard();
//!
//! // Warnings are reported unless the threshold says otherwise.
//! guard.on_recoverable_error(Severity::Warning, "disk almost full", file!(), line!());
//! ```

use std::io::{self, Write};
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::CrashguardConfig;
use crate::environment::{self, Environment, OutputStream, ProcessEnvironment};
use crate::error::Result;
use crate::render::{self, CliRenderer, HtmlRenderer, Renderer};
use crate::report::{
    capture_frames, ErrorReport, PanicError, Reportable, ReportBuilder, RequestInfo, Severity,
    SeverityError,
};
use crate::value::{SensitiveKeyMatcher, SubstringMatcher, ValueFormatter};

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Set while a handler owns the panic hook.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Set once a terminating error is being reported.
static HANDLING: AtomicBool = AtomicBool::new(false);

/// Hook that was active before installation.
static PREVIOUS_HOOK: Mutex<Option<PanicHook>> = Mutex::new(None);

/// Exit status used after a report has been written.
pub const EXIT_STATUS: i32 = 1;

/// Renderer chosen for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Terminal text, colored when supported.
    Cli,
    /// Self-contained HTML page.
    Html,
}

/// A rendered report and where it goes.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// The report the output was rendered from.
    pub report: ErrorReport,
    /// Rendered output.
    pub output: String,
    /// Target stream.
    pub stream: OutputStream,
    /// Renderer that produced `output`.
    pub format: OutputFormat,
}

impl Dispatch {
    /// Write the output to its stream and flush.
    pub fn write(&self) -> Result<()> {
        match self.stream {
            OutputStream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(self.output.as_bytes())?;
                out.flush()?;
            }
            OutputStream::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(self.output.as_bytes())?;
                err.flush()?;
            }
        }
        Ok(())
    }
}

/// Crash handler context.
#[derive(Debug)]
pub struct Crashguard {
    config: RwLock<CrashguardConfig>,
    matcher: Option<Arc<dyn SensitiveKeyMatcher>>,
    env: Arc<dyn Environment>,
    request: RwLock<Option<RequestInfo>>,
    last_error: Mutex<Option<SeverityError>>,
}

impl Crashguard {
    /// Create a handler for the real process environment.
    pub fn new(config: CrashguardConfig) -> Self {
        Self {
            config: RwLock::new(config),
            matcher: None,
            env: Arc::new(ProcessEnvironment),
            request: RwLock::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Use a custom sensitive key matcher instead of the built-in substring list.
    pub fn with_matcher(mut self, matcher: Arc<dyn SensitiveKeyMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Read environment variables and terminal state from `env`.
    pub fn with_environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> CrashguardConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration. Applies to reports built afterwards.
    pub fn set_config(&self, config: CrashguardConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        tracing::debug!("Crashguard configuration updated");
    }

    /// Set the request being served. `None` falls back to CGI-style variables.
    pub fn set_request(&self, request: Option<RequestInfo>) {
        *self.request.write().unwrap_or_else(PoisonError::into_inner) = request;
    }

    /// Whether some handler currently owns the panic hook.
    pub fn is_registered(&self) -> bool {
        REGISTERED.load(Ordering::SeqCst)
    }

    /// Install the panic hook. Calling again while registered has no effect.
    pub fn install_global_handlers(self: &Arc<Self>) {
        if REGISTERED.swap(true, Ordering::SeqCst) {
            tracing::debug!("Crashguard handlers already installed");
            return;
        }

        let previous = panic::take_hook();
        *PREVIOUS_HOOK.lock().unwrap_or_else(PoisonError::into_inner) = Some(previous);

        let handler = Arc::clone(self);
        panic::set_hook(Box::new(move |info| {
            let error = PanicError::new(info.payload(), info.location())
                .with_frames(capture_frames());
            handler.on_uncaught_exception(&error);
        }));

        tracing::debug!("Crashguard handlers installed");
    }

    /// Restore the panic hook active before installation. No-op when not registered.
    pub fn uninstall_global_handlers(&self) {
        if !REGISTERED.swap(false, Ordering::SeqCst) {
            return;
        }

        let previous = PREVIOUS_HOOK
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match previous {
            Some(hook) => panic::set_hook(hook),
            None => drop(panic::take_hook()),
        }

        tracing::debug!("Crashguard handlers uninstalled");
    }

    /// Whether a recoverable signal of `severity` passes the report threshold.
    pub fn should_report(&self, severity: Severity) -> bool {
        severity >= self.config().report_threshold
    }

    /// Handle a warning, notice or similar signal.
    ///
    /// Returns `false` when the severity is below the configured threshold.
    /// Otherwise the signal is reported as a terminating error and this call
    /// does not return.
    pub fn on_recoverable_error(
        &self,
        severity: Severity,
        message: &str,
        file: &str,
        line: u32,
    ) -> bool {
        if !self.should_report(severity) {
            tracing::debug!(%severity, signal = message, "Recoverable signal below report threshold");
            return false;
        }

        let error = SeverityError::new(severity, message, file, line).with_frames(capture_frames());
        self.on_uncaught_exception(&error)
    }

    /// Record a signal for inspection at shutdown. Replaces any earlier record.
    pub fn record_error(&self, severity: Severity, message: &str, file: &str, line: u32) {
        let error = SeverityError::new(severity, message, file, line);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// The signal stored by [`record_error`](Self::record_error), if any.
    pub fn last_error(&self) -> Option<SeverityError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// End-of-process check.
    ///
    /// If the last recorded signal is a fatal, parse, core or compile error it
    /// is reported and the process exits. Otherwise nothing happens.
    pub fn on_shutdown(&self) {
        let last = self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match last {
            Some(error) if error.severity().is_fatal() => self.on_uncaught_exception(&error),
            Some(error) => {
                tracing::debug!(severity = %error.severity(), "Non-fatal signal left at shutdown");
            }
            None => {}
        }
    }

    /// Guard that runs [`on_shutdown`](Self::on_shutdown) when dropped.
    pub fn shutdown_guard(self: &Arc<Self>) -> ShutdownGuard {
        ShutdownGuard {
            handler: Arc::clone(self),
        }
    }

    /// Report `error` and terminate the process with status 1.
    pub fn on_uncaught_exception(&self, error: &dyn Reportable) -> ! {
        if HANDLING.swap(true, Ordering::SeqCst) {
            std::process::exit(EXIT_STATUS);
        }

        let dispatch = self.dispatch(error);
        if let Err(e) = dispatch.write() {
            tracing::error!(error = %e, "Failed to write crash report");
        }
        std::process::exit(EXIT_STATUS)
    }

    /// Build the report for `error` with the current configuration.
    pub fn build_report(&self, error: &dyn Reportable) -> ErrorReport {
        let config = self.config();
        let formatter = ValueFormatter::from_config(&config, self.matcher(&config));

        ReportBuilder::new(formatter)
            .show_arguments(config.show_arguments)
            .with_request(self.request())
            .build(error)
    }

    /// Build and render the report for `error` without writing it.
    pub fn dispatch(&self, error: &dyn Reportable) -> Dispatch {
        let report = self.build_report(error);
        let config = self.config();
        let cli_mode = config
            .cli_mode
            .unwrap_or_else(|| environment::detect_cli_mode(self.env.as_ref()));

        let (output, stream, format) = if cli_mode {
            let output =
                CliRenderer::detect(self.env.as_ref(), OutputStream::Stderr).render(&report);
            (output, OutputStream::Stderr, OutputFormat::Cli)
        } else {
            let output = HtmlRenderer::new()
                .with_auto_theme(config.auto_detect_theme)
                .render(&report);
            (output, OutputStream::Stdout, OutputFormat::Html)
        };

        tracing::info!(
            error_type = report.type_name(),
            format = ?format,
            "Dispatching crash report"
        );

        Dispatch {
            report,
            output,
            stream,
            format,
        }
    }

    /// Render an already-built report as Markdown.
    pub fn generate_markdown(&self, report: &ErrorReport) -> String {
        render::generate_markdown(report)
    }

    fn matcher(&self, config: &CrashguardConfig) -> Arc<dyn SensitiveKeyMatcher> {
        match &self.matcher {
            Some(matcher) => Arc::clone(matcher),
            None => Arc::new(SubstringMatcher::with_extra(&config.extra_sensitive_keys)),
        }
    }

    fn request(&self) -> Option<RequestInfo> {
        let explicit = self
            .request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        explicit.or_else(|| RequestInfo::from_env(self.env.as_ref()))
    }
}

/// Runs [`Crashguard::on_shutdown`] when dropped.
#[derive(Debug)]
#[must_use = "the shutdown check runs when the guard is dropped"]
pub struct ShutdownGuard {
    handler: Arc<Crashguard>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.handler.on_shutdown();
    }
}

/// Build a handler from `config` and install it.
pub fn init(config: CrashguardConfig) -> Arc<Crashguard> {
    let handler = Arc::new(Crashguard::new(config));
    handler.install_global_handlers();
    handler
}
