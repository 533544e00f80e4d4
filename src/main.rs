use anyhow::{Context, Result};
use borg_manager::config::{load_config, ConfigFormat};
use borg_manager::managers::backup::BackupManager;
use borg_manager::managers::logging::{init_logging, LogGuard, LoggingConfig};
use borg_manager::managers::notification::NotificationManager;
use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "borg-manager")]
#[command(about = "Run borg, rclone and custom shell actions described by configuration files", long_about = None)]
#[command(version)]
struct Cli {
    /// Action to run instead of the configured defaults, as
    /// prefix:command[:params] (repeatable, whitespace separates several)
    #[arg(short = 'a', long = "action", value_name = "ACTION")]
    actions: Vec<String>,

    /// Directory for daily rotated log files
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Configuration files (.toml or .json), run in order
    #[arg(value_name = "CONFIG", required = true)]
    configs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if let Some(ref dir) = cli.log_dir {
        logging = logging.with_log_directory(dir);
    }
    let log = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let actions = split_actions(&cli.actions);

    for path in unique_paths(cli.configs) {
        match run_unit(&path, &actions, &log) {
            Ok(true) => {}
            Ok(false) => return ExitCode::FAILURE,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Run one configuration unit, returning whether it succeeded
fn run_unit(path: &Path, actions: &[String], log: &LogGuard) -> Result<bool> {
    if ConfigFormat::from_path(path).is_none() {
        warn!(
            "Skipping '{}': configuration files must end in .toml or .json",
            path.display()
        );
        return Ok(true);
    }

    let config = load_config(path)
        .with_context(|| format!("Failed to load configuration '{}'", path.display()))?;
    log.set_console_level(config.console_level());
    info!("Configuration loaded: {}", path.display());

    // Only scheduled runs report by email
    let notifier = match config.email {
        Some(ref email) if actions.is_empty() && email.enabled => {
            Some(NotificationManager::new(email.clone()))
        }
        _ => None,
    };
    if let Some(ref notifier) = notifier {
        let partial = notifier.clone();
        log.mail_buffer().flush_when_full(move |report| {
            partial.send_report(&report);
        });
        log.mail_buffer().start(config.email_level());
    }

    let manager = BackupManager::new(config, actions.to_vec());
    let success = manager.run();

    if let Some(notifier) = notifier {
        let report = log.mail_buffer().finish();
        notifier.send_report(&report);
    }

    Ok(success)
}

/// Split each `-a` value on whitespace
fn split_actions(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split_whitespace())
        .map(String::from)
        .collect()
}

/// Drop repeated paths, keeping first-seen order
fn unique_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}
