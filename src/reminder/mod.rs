//! Reminders: records, time parsing, scheduling, storage, and notification

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod notify;
pub mod scheduler;
pub mod store;
pub mod timeparse;

/// Display format for reminder times
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generated reminder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, enough to address a reminder from the CLI
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((cut, _)) => &self.0[..cut],
            None => &self.0,
        }
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reminder set by the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub task: String,
    pub time: DateTime<Local>,
    pub created_at: DateTime<Local>,
}

impl Reminder {
    pub fn new(task: &str, time: DateTime<Local>) -> Self {
        Self {
            id: ReminderId::new(),
            task: task.to_string(),
            time,
            created_at: Local::now(),
        }
    }

    pub fn formatted_time(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}
