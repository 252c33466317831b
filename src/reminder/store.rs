//! Durable reminder storage
//!
//! Pending reminders live in a single JSON file shared by every taskmate
//! process. Each read-modify-write holds an exclusive lock on a sibling
//! `.lock` file, and writes replace the store with a rename so readers
//! never see a partial file.

use eyre::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{Reminder, ReminderId};

/// JSON file of pending reminders
pub struct ReminderStore {
    path: PathBuf,
}

impl ReminderStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All pending reminders, ordered by fire time
    pub fn load(&self) -> Result<Vec<Reminder>> {
        let _lock = self.lock()?;
        let mut reminders = self.read()?;
        reminders.sort_by_key(|r| r.time);
        Ok(reminders)
    }

    pub fn add(&self, reminder: &Reminder) -> Result<()> {
        let _lock = self.lock()?;
        let mut reminders = self.read()?;
        reminders.push(reminder.clone());
        self.write(&reminders)
    }

    /// Remove a reminder. Returns false if it was not stored.
    pub fn remove(&self, id: &ReminderId) -> Result<bool> {
        let _lock = self.lock()?;
        let mut reminders = self.read()?;
        let before = reminders.len();
        reminders.retain(|r| &r.id != id);
        if reminders.len() == before {
            return Ok(false);
        }
        self.write(&reminders)?;
        Ok(true)
    }

    /// Resolve a full id or a unique prefix of one
    pub fn resolve(&self, prefix: &str) -> Result<ReminderId> {
        let matches: Vec<ReminderId> = self
            .load()?
            .into_iter()
            .filter(|r| r.id.as_str().starts_with(prefix))
            .map(|r| r.id)
            .collect();

        match matches.as_slice() {
            [] => eyre::bail!("No pending reminder matches '{}'", prefix),
            [id] => Ok(id.clone()),
            _ => eyre::bail!("'{}' matches {} reminders; use more characters", prefix, matches.len()),
        }
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Exclusive across processes and across handles in this one; released on drop
    fn lock(&self) -> Result<File> {
        fs::create_dir_all(self.dir()).context("Failed to create reminder store directory")?;

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;
        file.lock()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
        Ok(file)
    }

    fn read(&self) -> Result<Vec<Reminder>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read reminder store {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse reminder store {}", self.path.display()))
    }

    fn write(&self, reminders: &[Reminder]) -> Result<()> {
        let json = serde_json::to_string_pretty(reminders).context("Failed to serialize reminders")?;

        let mut temp = NamedTempFile::new_in(self.dir()).context("Failed to create temporary reminder store")?;
        temp.write_all(json.as_bytes())
            .context("Failed to write temporary reminder store")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write reminder store {}", self.path.display()))?;

        log::debug!("Wrote {} reminders to {}", reminders.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};
    use tempfile::tempdir;

    fn reminder(task: &str, minutes: i64) -> Reminder {
        Reminder::new(task, Local::now() + Duration::minutes(minutes))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let store = ReminderStore::new(temp.path().join("reminders.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_and_load_sorted() {
        let temp = tempdir().unwrap();
        let store = ReminderStore::new(temp.path().join("nested").join("reminders.json"));

        store.add(&reminder("later", 30)).unwrap();
        store.add(&reminder("sooner", 5)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].task, "sooner");
        assert_eq!(loaded[1].task, "later");
    }

    #[test]
    fn test_remove() {
        let temp = tempdir().unwrap();
        let store = ReminderStore::new(temp.path().join("reminders.json"));
        let first = reminder("first", 5);
        store.add(&first).unwrap();
        store.add(&reminder("second", 10)).unwrap();

        assert!(store.remove(&first.id).unwrap());
        assert!(!store.remove(&first.id).unwrap());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].task, "second");
    }

    #[test]
    fn test_resolve_prefix() {
        let temp = tempdir().unwrap();
        let store = ReminderStore::new(temp.path().join("reminders.json"));
        let r = reminder("stretch", 5);
        store.add(&r).unwrap();

        assert_eq!(store.resolve(r.id.short()).unwrap(), r.id);
        assert!(store.resolve("not-an-id").is_err());
    }

    #[test]
    fn test_two_handles_on_one_file_do_not_lose_writes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reminders.json");

        let writers: Vec<_> = (0..2)
            .map(|n| {
                let store = ReminderStore::new(path.clone());
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.add(&reminder(&format!("writer {} #{}", n, i), 5)).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let store = ReminderStore::new(path);
        assert_eq!(store.load().unwrap().len(), 100);
    }

    #[test]
    fn test_removal_is_seen_by_other_handle() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reminders.json");
        let session = ReminderStore::new(path.clone());
        let cli = ReminderStore::new(path);

        let r = reminder("stand up", 5);
        session.add(&r).unwrap();
        assert!(cli.remove(&r.id).unwrap());
        assert!(!session.remove(&r.id).unwrap());
        assert!(session.load().unwrap().is_empty());
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = tempdir().unwrap();
        let store = ReminderStore::new(temp.path().join("reminders.json"));
        store.add(&reminder("tidy", 5)).unwrap();

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["reminders.json", "reminders.json.lock"]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reminders.json");
        fs::write(&path, "{not json").unwrap();

        let store = ReminderStore::new(path);
        assert!(store.load().is_err());
    }
}
