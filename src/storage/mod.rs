pub mod json_backend;

use crate::{errors::StorageError, recurring::ReminderBook};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Abstraction over persistence backends capable of storing reminder books
/// and their backup snapshots.
pub trait StorageBackend: Send + Sync {
    fn save(&self, book: &ReminderBook, name: &str) -> Result<()>;
    /// Loads and re-validates a stored book.
    fn load(&self, name: &str) -> Result<ReminderBook>;
    fn exists(&self, name: &str) -> bool;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, book: &ReminderBook, name: &str, note: Option<&str>) -> Result<String>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<ReminderBook>;

    /// Loads `name`, or starts an empty book when none is stored yet.
    fn load_or_create(&self, name: &str) -> Result<ReminderBook> {
        if self.exists(name) {
            self.load(name)
        } else {
            tracing::info!(book = name, "starting new reminder book");
            Ok(ReminderBook::new(name))
        }
    }
}

pub use json_backend::JsonStorage;
