//! Notification sink
//!
//! The scheduler sends a [`Notification`] over a channel when a reminder
//! fires; the console sink prints it.

use chrono::{DateTime, Local};
use colored::*;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::{Reminder, ReminderId, TIME_FORMAT};

/// A reminder that came due
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: ReminderId,
    pub task: String,
    pub due: DateTime<Local>,
    /// Fired after a restart, past its due time
    pub overdue: bool,
}

impl Notification {
    pub fn from_reminder(reminder: &Reminder, overdue: bool) -> Self {
        Self {
            id: reminder.id.clone(),
            task: reminder.task.clone(),
            due: reminder.time,
            overdue,
        }
    }

    pub fn format_display(&self) -> String {
        let mut line = format!("{} {}", "REMINDER:".bold().magenta(), self.task.bold());
        if self.overdue {
            line.push_str(&format!(" {}", format!("(was due {})", self.due.format(TIME_FORMAT)).dimmed()));
        }
        line
    }
}

/// Print notifications to the console until every sender is dropped
pub fn spawn_console_sink(handle: &Handle, mut rx: UnboundedReceiver<Notification>) -> JoinHandle<()> {
    handle.spawn(async move {
        while let Some(notification) = rx.recv().await {
            log::info!("Reminder {} fired: {}", notification.id, notification.task);
            println!("\n{}", notification.format_display());
        }
        log::debug!("Notification channel closed");
    })
}
