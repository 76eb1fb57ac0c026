//! Faultline: unified error interception and reporting.
//!
//! This is the main entry point for the demonstration CLI.

use faultline::cli::{Cli, Commands, ConfigAction};
use faultline::core::config::HandlerConfig;
use faultline::core::error::{Error, Result};
use faultline::core::types::Severity;
use faultline::handler::FaultHandler;
use faultline::pipeline::dispatch::{JsonLinesSink, LogSink};
use faultline::utils::logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(log_config)?;

    log::info!("Faultline v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration and apply run overrides
    let mut config = HandlerConfig::load_or_default();
    if cli.silent {
        config.silent = true;
    }
    if !cli.ignore.is_empty() {
        config.ignore_types = cli.ignore.iter().cloned().collect();
    }
    log::debug!("Configuration loaded");

    // Handle commands
    let sink_path = cli.sink_path();
    match cli.command {
        Some(Commands::Trigger { severity, message }) => {
            run_trigger(config, sink_path, &severity, message)
        }
        Some(Commands::Panic { message }) => run_panic(config, sink_path, message),
        Some(Commands::Fatal { message }) => run_fatal(config, sink_path, message),
        Some(Commands::Config { action }) => run_config(action, &config),
        Some(Commands::Info) => run_info(&config),
        None => {
            // No command specified, show help
            println!("Faultline - Unified Error Interception and Reporting");
            println!();
            println!("Use --help for usage information");
            println!();
            println!("Quick start:");
            println!("  faultline trigger -s E_WARNING -m 'low disk'  Raise a recoverable signal");
            println!("  faultline panic -m 'boom'                     Capture an unhandled panic");
            println!("  faultline fatal -m 'heap exhausted'           Report a fatal at process exit");
            println!("  faultline config show                         Show the active configuration");
            Ok(())
        }
    }
}

/// Build an installed handler over the JSON-lines sink.
fn build_handler(config: HandlerConfig, sink_path: PathBuf) -> Result<FaultHandler> {
    let sink = LogSink::Structured(Box::new(JsonLinesSink::open(sink_path)?));

    let mut handler = FaultHandler::new(config, sink);
    handler.install()?;
    Ok(handler)
}

/// Raise a recoverable signal.
fn run_trigger(
    config: HandlerConfig,
    sink_path: PathBuf,
    severity_arg: &str,
    message: String,
) -> Result<()> {
    let handler = build_handler(config, sink_path)?;

    let delivered = match Severity::from_name(severity_arg) {
        Some(severity) => handler.raise(severity, message),
        None => {
            let code: u32 = severity_arg.parse().map_err(|_| {
                Error::config_invalid(
                    "severity",
                    format!("Unknown severity name or code: {}", severity_arg),
                )
            })?;
            handler.raise_code(code, message)
        }
    };

    if delivered {
        log::info!("Signal delivered; execution continued");
    } else {
        log::info!("Signal masked by the report mask; nothing reported");
    }
    Ok(())
}

/// Panic so the exception hook captures it.
fn run_panic(config: HandlerConfig, sink_path: PathBuf, message: String) -> Result<()> {
    let _handler = build_handler(config, sink_path)?;

    log::info!("Raising an unhandled panic");
    panic!("{}", message)
}

/// Record a fatal condition and return; the exit inspection reports it.
fn run_fatal(config: HandlerConfig, sink_path: PathBuf, message: String) -> Result<()> {
    let handler = build_handler(config, sink_path)?;

    handler.record_fatal(message);
    log::info!("Fatal condition recorded; the exit inspection will report it");
    Ok(())
}

/// Handle configuration commands.
fn run_config(action: ConfigAction, config: &HandlerConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Reset { yes: _ } => {
            log::info!("Resetting configuration to defaults...");
            let default_config = HandlerConfig::default();
            default_config.save(&HandlerConfig::default_config_path())?;
            println!("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            println!("{}", HandlerConfig::default_config_path().display());
        }
    }
    Ok(())
}

/// Show handler information.
fn run_info(config: &HandlerConfig) -> Result<()> {
    println!("Faultline - Unified Error Interception and Reporting");
    println!();
    println!("Version:          {}", env!("CARGO_PKG_VERSION"));
    println!("Config Path:      {}", HandlerConfig::default_config_path().display());
    println!("Data Directory:   {}", HandlerConfig::data_dir().display());
    println!("Default Sink:     {}", HandlerConfig::default_sink_path().display());
    println!();
    println!("Handler Settings:");
    println!("  Default Level:  {}", config.default_level);
    println!("  Overrides:      {}", config.level_overrides.len());
    println!("  Silent Mode:    {}", config.silent);
    println!("  Ignored Types:  {}", config.ignore_types.len());
    println!("  Report Mask:    {}", config.report_mask.bits());
    println!("  Trace Frames:   {}", config.max_trace_frames);
    Ok(())
}
