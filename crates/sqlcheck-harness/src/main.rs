//! `sqlcheck` - drive the SQL analysis loop over a headless editor surface.
//!
//! # Usage
//!
//! ```bash
//! # conformance check, exit status 1 when non-conformant or on failure
//! sqlcheck check query.sql
//! sqlcheck check --json query.sql
//!
//! # is the file already formatted?
//! sqlcheck is-formatted query.sql
//!
//! # replay editor events (see `script.rs` for the format)
//! sqlcheck replay query.sql events.txt
//! ```
//!
//! The configuration is a JSON file given with `--config` or `SQLCHECK_CONFIG`. Logs go to
//! stderr; `RUST_LOG` overrides the `-v` level.

mod host;
mod script;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use host::{Host, severity_name};
use sqlcheck_core::{AnalysisConfig, NotificationState};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sqlcheck", version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE", env = "SQLCHECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Number of lines the headless viewport shows
    #[arg(long, value_name = "LINES", default_value_t = 40, global = true)]
    viewport: usize,

    /// Increase logging verbosity (repeat for more detail)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Format, colorize and conformance-check a file
    Check {
        file: PathBuf,
        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether a file is already formatted
    IsFormatted { file: PathBuf },
    /// Replay an event script against a file, printing the notification after each step
    Replay { file: PathBuf, script: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("sqlcheck: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let mut host = Host::new(config, cli.viewport)?;

    match cli.command {
        Command::Check { file, json } => check(&mut host, &file, json),
        Command::IsFormatted { file } => is_formatted(&mut host, &file),
        Command::Replay { file, script } => replay(&mut host, &file, &script),
    }
}

fn check(host: &mut Host, file: &Path, json: bool) -> Result<ExitCode> {
    host.open(file)?;
    host.analysis().on_check();
    let notification = host.analysis().notification();
    info!(file = %file.display(), idle = notification.is_idle(), "checked");

    if json {
        println!("{}", serde_json::to_string_pretty(&notification_json(host, &notification))?);
    } else {
        print_check(host, &notification);
    }

    Ok(match notification {
        NotificationState::Diagnostics(entries) if entries.is_empty() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn print_check(host: &Host, notification: &NotificationState) {
    for diag in notification.entries() {
        let (line, col) = host
            .analysis()
            .with_surface(|s| s.position_of_char(diag.range.start));
        let file = diag.file.as_deref().unwrap_or("<buffer>");
        let code = diag.code.as_deref().unwrap_or("-");
        println!(
            "{file}:{}:{}: {}[{code}]: {}",
            line + 1,
            col + 1,
            severity_name(diag.severity),
            diag.message
        );
    }
    match notification.overlay() {
        Some(overlay) => println!("{}", overlay.text),
        None => println!("not checked"),
    }
}

fn notification_json(host: &Host, notification: &NotificationState) -> serde_json::Value {
    let diagnostics: Vec<serde_json::Value> = notification
        .entries()
        .iter()
        .map(|diag| {
            let (line, col) = host
                .analysis()
                .with_surface(|s| s.position_of_char(diag.range.start));
            serde_json::json!({
                "file": diag.file,
                "start": diag.range.start,
                "end": diag.range.end,
                "line": line + 1,
                "column": col + 1,
                "severity": severity_name(diag.severity),
                "code": diag.code,
                "message": diag.message,
            })
        })
        .collect();

    serde_json::json!({
        "status": notification.overlay().map(|o| o.text),
        "error": notification.error().map(ToString::to_string),
        "diagnostics": diagnostics,
    })
}

fn is_formatted(host: &mut Host, file: &Path) -> Result<ExitCode> {
    host.open(file)?;
    host.analysis().on_is_formatted();
    print!("{}", host.render_notification());

    let formatted = host
        .analysis()
        .with_notification(|n| n.message() == Some("Formatted"));
    Ok(if formatted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn replay(host: &mut Host, file: &Path, script_path: &Path) -> Result<ExitCode> {
    let source = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let commands = script::parse_script(&source)
        .with_context(|| format!("invalid script {}", script_path.display()))?;

    host.open(file)?;
    for (step, command) in commands.iter().enumerate() {
        host.apply(command)
            .with_context(|| format!("step {} ({})", step + 1, command.name()))?;
        println!("[{}] {}", step + 1, command.name());
        if matches!(command, script::ScriptCommand::Show) {
            print!("{}", host.render_buffer());
            println!();
        }
        print!("{}", host.render_notification());
    }
    Ok(ExitCode::SUCCESS)
}
