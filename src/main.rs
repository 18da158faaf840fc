use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crashguard::demo::Scenario;
use crashguard::logging::{init_logging, LoggingConfig};
use crashguard::{
    generate_markdown, CliRenderer, Crashguard, CrashguardConfig, HtmlRenderer, OutputStream,
    ProcessEnvironment, Renderer, Severity,
};

/// Output format for demo reports
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum DemoFormat {
    /// Terminal report
    #[default]
    Cli,
    /// Standalone HTML page
    Html,
    /// Markdown document
    Markdown,
    /// Raw report as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "crashguard")]
#[command(version)]
#[command(about = "Render redacted crash reports for terminals, HTML pages and Markdown")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the report of a sample failure without crashing
    Demo {
        /// Sample failure to render
        #[arg(value_enum)]
        scenario: Scenario,

        /// Output format
        #[arg(long, short, default_value = "cli", value_enum)]
        format: DemoFormat,

        /// Disable colors (also respects NO_COLOR environment variable)
        #[arg(long)]
        no_color: bool,
    },
    /// Install the crash handler and panic
    Panic {
        /// Panic message
        #[arg(long, short, default_value = "Something went terribly wrong")]
        message: String,
    },
    /// Raise a recoverable signal of the given severity
    Signal {
        /// Severity of the signal (deprecated, notice, warning, error, fatal, ...)
        severity: Severity,

        /// Signal message
        #[arg(long, short, default_value = "Undefined index: user_id")]
        message: String,
    },
    /// Record a signal and run the shutdown check
    Shutdown {
        /// Severity of the recorded signal
        severity: Severity,

        /// Signal message
        #[arg(long, short, default_value = "Allowed memory size exhausted")]
        message: String,
    },
}

fn load_config(path: Option<&Path>) -> crashguard::Result<CrashguardConfig> {
    match path {
        Some(path) => CrashguardConfig::load(path),
        None => CrashguardConfig::from_env(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Demo {
            scenario,
            format,
            no_color,
        } => run_demo(config, scenario, format, no_color),
        Commands::Panic { message } => {
            let guard = crashguard::init(config);
            let _shutdown = guard.shutdown_guard();
            tracing::info!("Crash handler installed, panicking");
            panic!("{}", message);
        }
        Commands::Signal { severity, message } => {
            let guard = crashguard::init(config);
            if !guard.on_recoverable_error(severity, &message, file!(), line!()) {
                println!(
                    "Signal '{}' below the report threshold ({}), declined",
                    severity,
                    guard.config().report_threshold
                );
            }
            guard.uninstall_global_handlers();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Shutdown { severity, message } => {
            let guard = crashguard::init(config);
            {
                let _shutdown = guard.shutdown_guard();
                guard.record_error(severity, &message, file!(), line!());
            }
            println!("Shutdown check passed: '{}' is not fatal", severity);
            guard.uninstall_global_handlers();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_demo(
    config: CrashguardConfig,
    scenario: Scenario,
    format: DemoFormat,
    no_color: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let auto_theme = config.auto_detect_theme;
    let guard = Crashguard::new(config);
    let report = guard.build_report(&scenario.error());

    let output = match format {
        DemoFormat::Cli => {
            let renderer = CliRenderer::detect(&ProcessEnvironment, OutputStream::Stdout);
            let use_color = renderer.colors_enabled() && !no_color;
            renderer.with_colors(use_color).render(&report)
        }
        DemoFormat::Html => HtmlRenderer::new()
            .with_auto_theme(auto_theme)
            .render(&report),
        DemoFormat::Markdown => generate_markdown(&report),
        DemoFormat::Json => report.to_json()? + "\n",
    };

    print!("{}", output);
    Ok(ExitCode::SUCCESS)
}
