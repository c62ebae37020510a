//! The ledger seam: reminders hand approved transaction templates to a
//! [`TransactionSink`], which owns the bookkeeping rules.

pub mod journal;
pub mod transaction;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::LedgerError;

pub use journal::Journal;
pub use transaction::{Transaction, TransactionTemplate};

/// Accepts transaction templates and records them as dated transactions.
pub trait TransactionSink {
    /// Records `template` dated `date`, returning the new transaction id.
    fn materialize(
        &mut self,
        template: &TransactionTemplate,
        date: NaiveDate,
        reminder_id: Uuid,
    ) -> Result<Uuid, LedgerError>;
}
