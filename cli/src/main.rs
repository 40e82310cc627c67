//! CLI entrypoint for leancup
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod demo;
mod script;
mod wiring;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use commands::{Cli, Command};
use leancup_infrastructure::{ConfigLoader, FileConfig};
use std::fs::OpenOptions;
use std::path::Path;
use tokio::io::BufReader;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log filter from `-v`, then `RUST_LOG`, then the configured level
fn log_filter(verbose: u8, configured: Option<&str>) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn"))),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    }
}

/// Initialize logging; the returned guard must live until exit
fn init_logging(cli: &Cli, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let filter = log_filter(cli.verbose, config.logging.level.as_deref());
    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    if cli.no_config {
        println!("Configuration files disabled (--no-config)");
    } else {
        ConfigLoader::print_config_sources(cli.config.as_deref());
    }
    println!();
    println!("Effective configuration:");
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn run_script(services: &wiring::Services, script: Option<&Path>) -> Result<()> {
    let stdout = tokio::io::stdout();
    let handled = match script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            script::serve(&services.coordinator, BufReader::new(file), stdout).await?
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            script::serve(&services.coordinator, stdin, stdout).await?
        }
    };
    info!(handled, "Script finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = init_logging(&cli, &config)?;

    info!("Starting leancup");

    match &cli.command {
        Command::Config => show_config(&cli, &config),
        Command::Run { script } => {
            let services = wiring::build(&config);
            run_script(&services, script.as_deref()).await
        }
        Command::Demo { participants, seed } => {
            let services = wiring::build(&config);
            demo::run(&services, *participants, *seed).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_follows_verbosity() {
        assert_eq!(log_filter(1, Some("error")).to_string(), "info");
        assert_eq!(log_filter(2, None).to_string(), "debug");
        assert_eq!(log_filter(5, None).to_string(), "trace");
    }

    #[test]
    fn test_effective_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&FileConfig::default()).unwrap();
        assert!(rendered.contains("[coordinator]"));
        assert!(rendered.contains("discussion_box_secs = 540"));
    }
}
