//! Checkup CLI

use anyhow::{Context, Result};
use checkup_config::load_and_merge;
use checkup_health::{builtin, HealthChecker, HealthReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_UNHEALTHY: u8 = 1;
const EXIT_INVALID: u8 = 2;

#[derive(Parser)]
#[command(name = "checkup")]
#[command(about = "Run declarative health checks", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "CHECKUP_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the checks and print the JSON report
    Run {
        /// Instruction files (YAML, JSON or TOML); later files override earlier ones
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pretty-print the report
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate instruction files without running any check
    Validate {
        /// Instruction files (YAML, JSON or TOML)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the built-in check references
    List,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Run { files, pretty } => {
            let checker = match build_checker(&files) {
                Ok(checker) => checker,
                Err(e) => {
                    tracing::error!("Cannot build health checker: {:#}", e);
                    return Ok(ExitCode::from(EXIT_INVALID));
                }
            };

            let report = checker.run().await;
            print_report(&report, pretty)?;

            if report.is_healthy() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_UNHEALTHY))
            }
        }

        Commands::Validate { files } => match build_checker(&files) {
            Ok(checker) => {
                println!("✓ {} health checks are valid", checker.len());
                for name in checker.names() {
                    println!("  {name}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("✗ Validation failed: {:#}", e);
                Ok(ExitCode::from(EXIT_INVALID))
            }
        },

        Commands::List => {
            for reference in builtin::registry().references()? {
                println!("{reference}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Version => {
            println!("checkup");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_checker(files: &[PathBuf]) -> Result<HealthChecker> {
    let instructions = load_and_merge(files).context("failed to load instructions")?;
    let checker = HealthChecker::from_instructions(&instructions, builtin::registry())?;
    tracing::info!(checks = checker.len(), "Instructions loaded");
    Ok(checker)
}

fn print_report(report: &HealthReport, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{output}");
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    };

    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into());

    // Logs go to stderr; stdout carries only the report.
    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true),
            )
            .with(env_filter)
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init()?,
    }

    Ok(())
}
