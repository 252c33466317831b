pub mod ask;
pub mod bench;
pub mod chat;
pub mod completions;
pub mod config;
pub mod modules;
pub mod reminders;
