//! Recurrence rules, occurrence iteration, reminders and their resolution.

pub mod book;
pub mod calendar;
pub mod iterator;
pub mod monitor;
pub mod pending;
pub mod reminder;
pub mod rule;

pub use book::ReminderBook;
pub use iterator::{IterState, Occurrences};
pub use monitor::{PassGuard, ReminderMonitor};
pub use pending::{
    apply_approved, compute_backlog, compute_pending, ApplyFailure, ApplyReport, FiredReminder,
    PendingReminder,
};
pub use reminder::{CursorState, Reminder};
pub use rule::{RecurrenceKind, RecurrenceRule};
