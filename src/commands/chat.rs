//! Interactive assistant loop

use colored::*;
use eyre::{Context, Result};
use rustyline::error::ReadlineError;

use crate::config::Config;
use crate::render;
use crate::session::Session;

const PROMPT: &str = "Command> ";

pub fn run(config: &Config, quiet: bool) -> Result<()> {
    let session = Session::start(config, true)?;

    println!("{}", "Welcome to taskmate!".bold().blue());
    if !quiet {
        println!("{}", format!("API key loaded: {}", session.masked_key).green());
    }
    if session.restored > 0 {
        println!(
            "{} Restored {} pending reminder(s)",
            "→".blue(),
            session.restored.to_string().cyan()
        );
    }
    println!("Type your commands in natural language. Type 'exit' to quit.\n");

    let mut rl = rustyline::DefaultEditor::new().context("Failed to initialize line editor")?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                if !quiet {
                    println!("{}", "Analyzing command...".yellow());
                }
                let envelope = session.agent.process(input);
                render::display_response(&envelope);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} Error reading input: {}", "✗".red(), e);
                break;
            }
        }
    }

    println!("\n{}", "Goodbye!".bold().blue());

    let pending = session.scheduler.pending_count();
    if pending > 0 && session.persistent {
        println!(
            "{}",
            format!("{} pending reminder(s) saved; they will fire next time taskmate runs.", pending).dimmed()
        );
    }

    Ok(())
}
