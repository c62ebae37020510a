use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Configuration errors raised when a reminder or rule is created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("Invalid increment: {0} (must be at least 1)")]
    InvalidIncrement(u32),
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("Reminder description must not be empty")]
    EmptyDescription,
    #[error("Reminder not found: {0}")]
    NotFound(Uuid),
    #[error("Duplicate reminder id: {0}")]
    Duplicate(Uuid),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

/// Failures reported by the ledger when materializing a transaction template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Unknown account: {0}")]
    UnknownAccount(Uuid),
    #[error("Invalid transaction template: {0}")]
    InvalidTemplate(String),
    #[error("Ledger rejected transaction: {0}")]
    Rejected(String),
}

/// Persistence failures for reminder books and configuration.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid stored reminder: {0}")]
    Invalid(#[from] ReminderError),
    #[error("Backup not found: {0}")]
    BackupNotFound(String),
    #[error("Invalid backup name: {0}")]
    InvalidBackupName(String),
}

/// Why an approved pending reminder could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Reminder {0} no longer exists")]
    MissingReminder(Uuid),
    #[error("Occurrence already fired (cursor at {last})")]
    AlreadyFired { last: NaiveDate },
    #[error("Skipped after an earlier failure for the same reminder")]
    Skipped,
}
