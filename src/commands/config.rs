use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "taskmate configuration".bold());
            println!();

            println!("log_level: {}", config.log_level.as_filter());
            println!();

            println!("{}:", "llm".cyan());
            println!("  base_url: {}", config.llm.base_url);
            println!("  model: {}", config.llm.model);
            println!("  temperature: {}", config.llm.temperature);
            println!("  api_key_env: {}", config.llm.api_key_env);
            println!("  timeout_secs: {}", display_timeout(config.llm.timeout_secs));
            println!("  structured_intents: {}", config.llm.structured_intents);
            println!();

            println!("{}:", "reminders".cyan());
            println!("  persist: {}", config.reminders.persist);
            println!("  store: {}", config.reminder_store_path().display());
        }
    }

    Ok(())
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    let value = match key {
        "log_level" | "log-level" => config.log_level.as_filter().to_string(),
        "llm.base_url" => config.llm.base_url.clone(),
        "llm.model" => config.llm.model.clone(),
        "llm.temperature" => config.llm.temperature.to_string(),
        "llm.api_key_env" => config.llm.api_key_env.clone(),
        "llm.timeout_secs" => display_timeout(config.llm.timeout_secs),
        "llm.structured_intents" => config.llm.structured_intents.to_string(),
        "reminders.persist" => config.reminders.persist.to_string(),
        "reminders.store" => config.reminder_store_path().display().to_string(),
        _ => return None,
    };
    Some(value)
}

fn display_timeout(timeout: Option<u64>) -> String {
    timeout.map_or_else(|| "none".to_string(), |secs| secs.to_string())
}
