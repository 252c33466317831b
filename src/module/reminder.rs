//! Reminder module
//!
//! Parses a free-form time, rejects anything not strictly in the future,
//! records the reminder, and hands it to the scheduler.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde_json::json;
use std::sync::{Arc, Mutex};

use super::{Envelope, Parameters, TaskModule};
use crate::error::ValidationError;
use crate::reminder::scheduler::ReminderScheduler;
use crate::reminder::timeparse::parse_time;
use crate::reminder::Reminder;

pub struct ReminderModule {
    reminders: Mutex<Vec<Reminder>>,
    scheduler: Arc<ReminderScheduler>,
}

impl ReminderModule {
    pub fn new(scheduler: Arc<ReminderScheduler>) -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
            scheduler,
        }
    }

    /// Every reminder set through this module, in the order they were set
    #[cfg(test)]
    pub fn reminders(&self) -> Vec<Reminder> {
        self.reminders.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_reminder(&self, task: &str, time: &str, now: DateTime<Local>) -> eyre::Result<Reminder> {
        let when = parse_time(time, now)?;
        if when <= now {
            return Err(ValidationError::PastTime.into());
        }

        let reminder = Reminder {
            created_at: now,
            ..Reminder::new(task, when)
        };
        self.scheduler.schedule(&reminder)?;
        self.reminders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reminder.clone());

        Ok(reminder)
    }
}

impl TaskModule for ReminderModule {
    fn name(&self) -> &str {
        "reminder"
    }

    fn description(&self) -> &str {
        "Sets and manages reminders for various tasks and events"
    }

    fn required_parameters(&self) -> IndexMap<&'static str, &'static str> {
        IndexMap::from([
            ("task", "The task or event to be reminded about"),
            ("time", "When the reminder should trigger (datetime or natural language)"),
        ])
    }

    fn execute(&self, params: &Parameters) -> Envelope {
        if !self.validate_parameters(params) {
            return self.format_error(&ValidationError::MissingParameters.to_string());
        }

        let task = &params["task"];
        let time = &params["time"];

        match self.set_reminder(task, time, Local::now()) {
            Ok(reminder) => self.format_success(json!({
                "message": format!("Reminder set for {}", reminder.formatted_time()),
                "task": reminder.task,
                "id": reminder.id.short(),
            })),
            Err(e) => match e.downcast_ref::<ValidationError>() {
                Some(ValidationError::PastTime) => self.format_error(&e.to_string()),
                _ => {
                    log::warn!("Failed to set reminder '{}' at '{}': {:#}", task, time, e);
                    self.format_error(&format!("Failed to set reminder: {}", e))
                }
            },
        }
    }
}
