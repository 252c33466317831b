//! Pending reminder management

use chrono::Local;
use colored::*;
use eyre::Result;
use std::sync::Arc;

use crate::cli::{OutputFormat, ReminderAction};
use crate::config::Config;
use crate::reminder::TIME_FORMAT;
use crate::reminder::store::ReminderStore;
use crate::session::offline_scheduler;

pub fn run(action: ReminderAction, config: &Config) -> Result<()> {
    match action {
        ReminderAction::List { format } => list(OutputFormat::resolve(format), config),
        ReminderAction::Cancel { id } => cancel(&id, config),
    }
}

fn store(config: &Config) -> ReminderStore {
    if !config.reminders.persist {
        eprintln!(
            "{} Reminder persistence is disabled; only reminders from earlier runs are shown",
            "⚠".yellow()
        );
    }
    ReminderStore::new(config.reminder_store_path())
}

fn list(format: OutputFormat, config: &Config) -> Result<()> {
    let reminders = store(config).load()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reminders)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&reminders)?),
        OutputFormat::Text => {
            println!("{}", "Pending reminders:".bold());
            println!();

            if reminders.is_empty() {
                println!("  {}", "(none)".dimmed());
                return Ok(());
            }

            let now = Local::now();
            for reminder in &reminders {
                let due = reminder.time.format(TIME_FORMAT).to_string();
                let due = if reminder.time <= now { due.red() } else { due.normal() };
                println!("  {} {} {}", reminder.id.short().cyan(), due, reminder.task.bold());
            }
        }
    }

    Ok(())
}

fn cancel(prefix: &str, config: &Config) -> Result<()> {
    let store = Arc::new(store(config));
    let id = store.resolve(prefix)?;

    // a running chat session skips reminders that have left the store
    let (_runtime, scheduler) = offline_scheduler(Some(store))?;
    if scheduler.cancel(&id)? {
        println!("{} Cancelled reminder {}", "✓".green(), id.short().cyan());
    } else {
        eyre::bail!("Reminder {} is no longer pending", id.short());
    }

    Ok(())
}
