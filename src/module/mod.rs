//! Task modules
//!
//! A module handles one intent. Every module declares the parameters it
//! needs, validates them, executes, and reports through an [`Envelope`].
//! Modules are registered statically at startup; there is no discovery.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

pub mod envelope;
pub mod reminder;

pub use envelope::{Envelope, Status};

use crate::reminder::scheduler::ReminderScheduler;
use reminder::ReminderModule;

/// Parameters extracted from a command
pub type Parameters = HashMap<String, String>;

/// Contract every task handler implements
pub trait TaskModule: Send + Sync {
    /// Module name, used to tag envelopes
    fn name(&self) -> &str;

    /// Intent this module answers to
    fn intent(&self) -> &str {
        self.name()
    }

    /// What the module does
    fn description(&self) -> &str;

    /// Required parameter names and their descriptions
    fn required_parameters(&self) -> IndexMap<&'static str, &'static str>;

    /// Perform the task. Must validate its own parameters.
    fn execute(&self, params: &Parameters) -> Envelope;

    /// True iff every required parameter is present
    fn validate_parameters(&self, params: &Parameters) -> bool {
        self.required_parameters().keys().all(|key| params.contains_key(*key))
    }

    fn format_success(&self, data: serde_json::Value) -> Envelope {
        Envelope::success_data(data).with_module(self.name())
    }

    fn format_error(&self, message: &str) -> Envelope {
        Envelope::error(message).with_module(self.name())
    }
}

/// Intent to module mapping
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Box<dyn TaskModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module that ships with taskmate
    pub fn builtin(scheduler: Arc<ReminderScheduler>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReminderModule::new(scheduler)));
        registry
    }

    /// Register a module under its intent. Last registration wins.
    pub fn register(&mut self, module: Box<dyn TaskModule>) {
        let intent = module.intent().to_string();
        if let Some(previous) = self.modules.insert(intent.clone(), module) {
            log::warn!(
                "Intent '{}' was handled by '{}'; replaced by a newer registration",
                intent,
                previous.name()
            );
        }
    }

    pub fn get(&self, intent: &str) -> Option<&dyn TaskModule> {
        self.modules.get(intent).map(|m| m.as_ref())
    }

    /// Registered modules sorted by intent
    pub fn list(&self) -> Vec<&dyn TaskModule> {
        let mut modules: Vec<&dyn TaskModule> = self.modules.values().map(|m| m.as_ref()).collect();
        modules.sort_by(|a, b| a.intent().cmp(b.intent()));
        modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}
