//! One-shot command processing

use colored::*;
use eyre::Result;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::render;
use crate::session::Session;

pub fn run(words: &[String], format: OutputFormat, config: &Config, quiet: bool) -> Result<()> {
    let command = words.join(" ");
    if command.trim().is_empty() {
        eyre::bail!("No command given");
    }

    let session = Session::start(config, false)?;

    if format == OutputFormat::Text && !quiet {
        eprintln!("{}", "Analyzing command...".yellow());
    }
    let envelope = session.agent.process(command.trim());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&envelope)?),
        OutputFormat::Text => {
            render::display_response(&envelope);

            if session.scheduler.pending_count() > 0 {
                let note = if session.persistent {
                    "Reminder saved; the next `taskmate chat` session picks it up (overdue ones fire at once)."
                } else {
                    "Reminder persistence is disabled; this reminder ends with this process."
                };
                println!("{}", note.dimmed());
            }
        }
    }

    Ok(())
}
