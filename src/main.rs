use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;

mod agent;
mod analyzer;
mod cli;
mod commands;
mod config;
mod error;
mod module;
mod reminder;
mod render;
mod session;

use cli::{Cli, Commands, OutputFormat};
use config::{Config, LogLevel};

fn setup_logging(log_level: LogLevel) -> Result<()> {
    let log_dir = Config::data_dir().join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taskmate.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let from_env = std::env::var("RUST_LOG").is_ok();
    let mut builder = env_logger::Builder::new();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.to_level_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if from_env { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        None | Some(Commands::Chat) => commands::chat::run(&config, quiet),
        Some(Commands::Ask { command, format }) => {
            commands::ask::run(&command, OutputFormat::resolve(format), &config, quiet)
        }
        Some(Commands::Reminders { action }) => commands::reminders::run(action, &config),
        Some(Commands::Modules { format }) => commands::modules::run(OutputFormat::resolve(format)),
        Some(Commands::Config { action }) => commands::config::run(action, &config),
        Some(Commands::Bench {
            commands: inputs,
            file,
            format,
        }) => commands::bench::run(inputs, file, OutputFormat::resolve(format), &config, quiet),
        Some(Commands::Completions { shell }) => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // .env may supply the API key
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration before logging so Config::load stays silent
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level).context("Failed to setup logging")?;

    info!("Starting taskmate with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
