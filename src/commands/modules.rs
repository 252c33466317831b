//! List the task modules the assistant can dispatch to

use colored::*;
use eyre::Result;
use serde::Serialize;

use crate::analyzer::ECHO_INTENT;
use crate::cli::OutputFormat;
use crate::module::ModuleRegistry;
use crate::session::offline_scheduler;

#[derive(Serialize)]
struct ModuleInfo {
    intent: String,
    name: String,
    description: String,
    parameters: Vec<ParameterInfo>,
}

#[derive(Serialize)]
struct ParameterInfo {
    name: String,
    description: String,
}

pub fn run(format: OutputFormat) -> Result<()> {
    // the registry needs a scheduler; nothing is ever scheduled here
    let (_runtime, scheduler) = offline_scheduler(None)?;
    let registry = ModuleRegistry::builtin(scheduler);

    let modules: Vec<ModuleInfo> = registry
        .list()
        .into_iter()
        .map(|m| ModuleInfo {
            intent: m.intent().to_string(),
            name: m.name().to_string(),
            description: m.description().to_string(),
            parameters: m
                .required_parameters()
                .into_iter()
                .map(|(name, description)| ParameterInfo {
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&modules)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&modules)?),
        OutputFormat::Text => {
            println!("{}", "Registered modules:".bold());
            println!();

            for module in &modules {
                println!("  {} {}", module.intent.cyan(), module.description.dimmed());
                for param in &module.parameters {
                    println!("    {} {}", param.name.green(), param.description);
                }
            }

            println!();
            println!(
                "  {} {}",
                ECHO_INTENT.cyan(),
                "Fallback: shows the model's reply as-is".dimmed()
            );
        }
    }

    Ok(())
}
