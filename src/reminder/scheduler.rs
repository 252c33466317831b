//! Reminder scheduler
//!
//! Each reminder gets a detached timer task on the tokio runtime, tracked by
//! id so it can be cancelled. When a timer fires, its entry is dropped from
//! the pending map and a [`Notification`] goes to the sink channel.

use chrono::Local;
use eyre::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use super::notify::Notification;
use super::store::ReminderStore;
use super::{Reminder, ReminderId};

/// Longest single sleep; timers re-check the wall clock after each one
const MAX_SLEEP: Duration = Duration::from_secs(60 * 60);

type PendingMap = Arc<Mutex<HashMap<ReminderId, AbortHandle>>>;

pub struct ReminderScheduler {
    handle: Handle,
    pending: PendingMap,
    store: Option<Arc<ReminderStore>>,
    notify: UnboundedSender<Notification>,
}

impl ReminderScheduler {
    pub fn new(handle: Handle, store: Option<Arc<ReminderStore>>, notify: UnboundedSender<Notification>) -> Self {
        Self {
            handle,
            pending: Arc::new(Mutex::new(HashMap::new())),
            store,
            notify,
        }
    }

    /// Persist the reminder (if a store is configured) and start its timer
    pub fn schedule(&self, reminder: &Reminder) -> Result<()> {
        if let Some(store) = &self.store {
            store.add(reminder)?;
        }
        self.spawn_timer(reminder.clone(), false);
        log::info!("Scheduled reminder {} for {}", reminder.id, reminder.formatted_time());
        Ok(())
    }

    /// Reschedule everything in the store. Overdue reminders fire at once.
    pub fn restore(&self) -> Result<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let now = Local::now();
        let reminders = store.load()?;
        let count = reminders.len();
        for reminder in reminders {
            let overdue = reminder.time <= now;
            self.spawn_timer(reminder, overdue);
        }

        if count > 0 {
            log::info!("Restored {} pending reminders from {}", count, store.path().display());
        }
        Ok(count)
    }

    /// Stop a pending timer and drop the reminder from the store.
    /// Returns false if the id was unknown to both.
    pub fn cancel(&self, id: &ReminderId) -> Result<bool> {
        let aborted = match self.lock_pending().remove(id) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        };

        let removed = match &self.store {
            Some(store) => store.remove(id)?,
            None => false,
        };

        if aborted || removed {
            log::info!("Cancelled reminder {}", id);
        }
        Ok(aborted || removed)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: &ReminderId) -> bool {
        self.lock_pending().contains_key(id)
    }

    fn spawn_timer(&self, reminder: Reminder, overdue: bool) {
        let pending = Arc::clone(&self.pending);
        let store = self.store.clone();
        let notify = self.notify.clone();
        let id = reminder.id.clone();

        // held across spawn so the task cannot finish before it is registered
        let mut guard = self.lock_pending();
        let task = self.handle.spawn(async move {
            loop {
                let remaining = (reminder.time - Local::now()).to_std().unwrap_or_default();
                if remaining.is_zero() {
                    break;
                }
                tokio::time::sleep(remaining.min(MAX_SLEEP)).await;
            }
            fire(reminder, overdue, &pending, store.as_deref(), &notify);
        });
        guard.insert(id, task.abort_handle());
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<ReminderId, AbortHandle>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn fire(
    reminder: Reminder,
    overdue: bool,
    pending: &PendingMap,
    store: Option<&ReminderStore>,
    notify: &UnboundedSender<Notification>,
) {
    pending.lock().unwrap_or_else(|e| e.into_inner()).remove(&reminder.id);

    if let Some(store) = store {
        match store.remove(&reminder.id) {
            Ok(true) => {}
            Ok(false) => {
                log::info!("Reminder {} was cancelled before it fired", reminder.id);
                return;
            }
            Err(e) => log::warn!("Failed to drop fired reminder {} from store: {}", reminder.id, e),
        }
    }

    if notify.send(Notification::from_reminder(&reminder, overdue)).is_err() {
        log::warn!("Notification sink closed; reminder {} not shown", reminder.id);
    }
}
