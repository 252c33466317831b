//! The dispatcher
//!
//! Owns the module registry and the analyzer. Every command goes through
//! [`Agent::process`], which always returns an [`Envelope`]; analysis and
//! dispatch failures are caught here and nowhere else.

use eyre::{Context, Result};
use std::fmt;
use std::sync::Arc;

use crate::analyzer::{AnalyzedCommand, CommandAnalyzer, ECHO_INTENT, OpenAiClient};
use crate::config::Config;
use crate::error::StartupError;
use crate::module::{Envelope, ModuleRegistry};
use crate::reminder::scheduler::ReminderScheduler;

/// API credential resolved at startup
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Read the key from `var`. Empty values count as missing.
    pub fn from_env(var: &str) -> std::result::Result<Self, StartupError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self {
                api_key: key.trim().to_string(),
            }),
            _ => Err(StartupError::MissingApiKey { var: var.to_string() }),
        }
    }

    #[cfg(test)]
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `sk-abc...wxyz` style preview safe to print
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 10 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("api_key", &self.masked()).finish()
    }
}

pub struct Agent {
    registry: ModuleRegistry,
    analyzer: CommandAnalyzer,
}

impl Agent {
    pub fn new(registry: ModuleRegistry, analyzer: CommandAnalyzer) -> Self {
        Self { registry, analyzer }
    }

    /// Production wiring: builtin modules and the OpenAI-compatible client
    pub fn from_config(config: &Config, credentials: &Credentials, scheduler: Arc<ReminderScheduler>) -> Self {
        let registry = ModuleRegistry::builtin(scheduler);
        let client = OpenAiClient::new(&config.llm, credentials.api_key());
        log::info!(
            "Agent ready: model {} at {}, {} modules, key {}",
            config.llm.model,
            client.endpoint(),
            registry.len(),
            credentials.masked()
        );

        let analyzer = CommandAnalyzer::new(Box::new(client), &config.llm).with_catalog(&registry);
        Self::new(registry, analyzer)
    }

    /// Analyze a command and run it. Never fails; errors become envelopes.
    pub fn process(&self, command: &str) -> Envelope {
        log::info!("Processing command: {}", command);
        match self.try_process(command) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::error!("Command failed: {:?}", e);
                Envelope::error(format!("Error: {:#}\n{:?}", e, e))
            }
        }
    }

    fn try_process(&self, command: &str) -> Result<Envelope> {
        let analyzed = self.analyzer.analyze(command).context("Error processing command")?;
        log::debug!("Analyzed intent '{}' with {} parameters", analyzed.intent, analyzed.parameters.len());
        Ok(self.execute_task(&analyzed))
    }

    /// Route an analyzed command to its module, or echo, or report no match
    pub fn execute_task(&self, analyzed: &AnalyzedCommand) -> Envelope {
        if let Some(module) = self.registry.get(&analyzed.intent) {
            return module.execute(&analyzed.parameters);
        }

        if analyzed.intent == ECHO_INTENT {
            return match analyzed.parameters.get("message") {
                Some(message) => Envelope::success(message.clone()),
                None => Envelope::error("Echo intent is missing its message"),
            };
        }

        Envelope::error(format!("No module found for intent: {}", analyzed.intent))
    }
}
