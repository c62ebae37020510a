#![doc(test(attr(deny(warnings))))]

//! Reminder Core schedules recurring reminders, works out which occurrences
//! are due, and records the approved ones as ledger transactions.
//!
//! ```
//! use chrono::NaiveDate;
//! use reminder_core::recurring::{RecurrenceRule, Reminder};
//!
//! let start = NaiveDate::from_ymd_opt(2015, 7, 4).unwrap();
//! let mut rent = Reminder::new("Rent", RecurrenceRule::monthly_by_date(1), start).unwrap();
//! assert_eq!(rent.advance_cursor(), Some(start));
//! assert_eq!(rent.next_due_date(), NaiveDate::from_ymd_opt(2015, 8, 4));
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod recurring;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Reminder Core tracing initialized.");
    });
}
