//! Startup wiring shared by the commands that talk to the model
//!
//! Resolves the credential, starts the background runtime that hosts
//! reminder timers and the notification sink, and builds the agent.

use eyre::{Context, Result};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

use crate::agent::{Agent, Credentials};
use crate::config::Config;
use crate::error::StartupError;
use crate::reminder::notify::spawn_console_sink;
use crate::reminder::scheduler::ReminderScheduler;
use crate::reminder::store::ReminderStore;

/// A scheduler for commands that never wait on a timer.
/// The runtime must outlive the scheduler.
pub fn offline_scheduler(store: Option<Arc<ReminderStore>>) -> Result<(Runtime, Arc<ReminderScheduler>)> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StartupError::from)?;
    let (notify_tx, _) = mpsc::unbounded_channel();
    let scheduler = Arc::new(ReminderScheduler::new(runtime.handle().clone(), store, notify_tx));
    Ok((runtime, scheduler))
}

pub struct Session {
    pub agent: Agent,
    pub scheduler: Arc<ReminderScheduler>,
    pub masked_key: String,
    /// Reminders rescheduled from the store at startup
    pub restored: usize,
    pub persistent: bool,
    // dropped last; stops every timer with it
    _runtime: Runtime,
}

impl Session {
    /// Start a session. `restore` reschedules reminders left in the store;
    /// only long-running sessions should ask for that.
    pub fn start(config: &Config, restore: bool) -> Result<Self> {
        let credentials = Credentials::from_env(&config.llm.api_key_env)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("taskmate-timers")
            .enable_all()
            .build()
            .map_err(StartupError::from)?;

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        spawn_console_sink(runtime.handle(), notify_rx);

        let persistent = config.reminders.persist;
        let store = persistent.then(|| Arc::new(ReminderStore::new(config.reminder_store_path())));
        let scheduler = Arc::new(ReminderScheduler::new(runtime.handle().clone(), store, notify_tx));

        let restored = if restore {
            match scheduler.restore().context("Failed to restore reminders") {
                Ok(count) => count,
                Err(e) => {
                    log::warn!("{:#}", e);
                    0
                }
            }
        } else {
            0
        };

        let agent = Agent::from_config(config, &credentials, Arc::clone(&scheduler));

        Ok(Self {
            agent,
            scheduler,
            masked_key: credentials.masked(),
            restored,
            persistent,
            _runtime: runtime,
        })
    }
}
