//! Polling driver that periodically resolves and applies due reminders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveDate;

use super::book::ReminderBook;
use super::pending::{apply_approved, compute_pending, ApplyReport, PendingReminder};
use crate::config::Config;
use crate::ledger::TransactionSink;

/// Holds the monitor's in-flight flag; released on drop.
#[must_use = "the pass ends when the guard is dropped"]
pub struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Timer state for reminder checks. At most one pass runs at a time; a tick
/// that arrives while a pass is in flight is dropped.
#[derive(Debug)]
pub struct ReminderMonitor {
    running: AtomicBool,
    first_tick: AtomicBool,
    startup_delay: Duration,
    snooze: Option<Duration>,
    auto_approve: bool,
}

impl ReminderMonitor {
    pub fn new(startup_delay: Duration, snooze: Option<Duration>) -> Self {
        Self {
            running: AtomicBool::new(false),
            first_tick: AtomicBool::new(true),
            startup_delay,
            snooze,
            auto_approve: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut monitor = Self::new(config.startup_delay(), config.snooze());
        monitor.auto_approve = config.auto_approve_auto_create;
        monitor
    }

    pub fn snooze(&self) -> Option<Duration> {
        self.snooze
    }

    /// `None` stops polling after the current wait.
    pub fn set_snooze(&mut self, snooze: Option<Duration>) {
        tracing::debug!(?snooze, "reminder snooze changed");
        self.snooze = snooze;
    }

    /// Delay before the next pass: the startup delay once, then the snooze
    /// period. `None` means polling is off.
    pub fn next_delay(&self) -> Option<Duration> {
        self.snooze?;
        if self.first_tick.swap(false, Ordering::AcqRel) {
            Some(self.startup_delay)
        } else {
            self.snooze
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the in-flight flag, or `None` when another pass holds it.
    pub fn begin_pass(&self) -> Option<PassGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard {
                flag: &self.running,
            })
    }

    /// One resolution pass: compute what is due on `as_of`, let `review`
    /// approve, decline or re-date entries, then apply the approved ones.
    ///
    /// Returns `None` when a pass is already running or nothing is due.
    pub fn run_pass<S, F>(
        &self,
        book: &mut ReminderBook,
        as_of: NaiveDate,
        sink: &mut S,
        review: F,
    ) -> Option<ApplyReport>
    where
        S: TransactionSink + ?Sized,
        F: FnOnce(&mut [PendingReminder]),
    {
        let Some(_guard) = self.begin_pass() else {
            tracing::debug!("reminder pass already in flight; tick skipped");
            return None;
        };

        let mut pending = compute_pending(book.reminders(), as_of);
        if pending.is_empty() {
            tracing::debug!(%as_of, "no reminders due");
            return None;
        }
        if !self.auto_approve {
            pending.iter_mut().for_each(PendingReminder::decline);
        }
        tracing::info!(count = pending.len(), %as_of, "reminders due for review");
        review(&mut pending);

        let report = apply_approved(book, &pending, sink);
        if !report.is_clean() {
            tracing::warn!(failures = report.failures.len(), "some reminders could not be applied");
        }
        Some(report)
    }
}

impl Default for ReminderMonitor {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Journal;
    use crate::recurring::{RecurrenceRule, Reminder};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book_with(reminder: Reminder) -> ReminderBook {
        let mut book = ReminderBook::new("Home");
        book.add(reminder).unwrap();
        book
    }

    #[test]
    fn startup_delay_then_snooze() {
        let monitor = ReminderMonitor::new(Duration::from_secs(120), Some(Duration::from_secs(900)));
        assert_eq!(monitor.next_delay(), Some(Duration::from_secs(120)));
        assert_eq!(monitor.next_delay(), Some(Duration::from_secs(900)));
        assert_eq!(monitor.next_delay(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn clearing_snooze_stops_polling() {
        let mut monitor = ReminderMonitor::default();
        monitor.set_snooze(None);
        assert_eq!(monitor.next_delay(), None);
    }

    #[test]
    fn only_one_pass_at_a_time() {
        let monitor = ReminderMonitor::default();
        let guard = monitor.begin_pass().expect("first pass");
        assert!(monitor.is_running());
        assert!(monitor.begin_pass().is_none());
        drop(guard);
        assert!(!monitor.is_running());
        assert!(monitor.begin_pass().is_some());
    }

    #[test]
    fn pass_is_held_during_review() {
        let monitor = ReminderMonitor::default();
        let mut book = book_with(
            Reminder::new("Rent", RecurrenceRule::monthly_by_date(1), date(2015, 7, 4)).unwrap(),
        );
        let mut journal = Journal::new();
        let report = monitor
            .run_pass(&mut book, date(2015, 7, 4), &mut journal, |pending| {
                assert!(monitor.is_running());
                pending[0].approve();
            })
            .expect("one reminder due");
        assert_eq!(report.fired.len(), 1);
        assert!(!monitor.is_running());
        assert_eq!(
            book.reminders()[0].next_due_date(),
            Some(date(2015, 8, 4))
        );
    }

    #[test]
    fn nothing_due_returns_none() {
        let monitor = ReminderMonitor::default();
        let mut book = book_with(
            Reminder::new("Rent", RecurrenceRule::monthly_by_date(1), date(2015, 7, 4)).unwrap(),
        );
        let result = monitor.run_pass(&mut book, date(2015, 7, 1), &mut Journal::new(), |_| {
            panic!("review must not be called")
        });
        assert!(result.is_none());
    }

    #[test]
    fn auto_approval_can_be_switched_off() {
        let config = Config {
            auto_approve_auto_create: false,
            ..Config::default()
        };
        let monitor = ReminderMonitor::from_config(&config);
        let mut reminder = Reminder::new("Sub", RecurrenceRule::daily(1), date(2015, 7, 4)).unwrap();
        reminder.set_auto_create(true);
        let mut book = book_with(reminder);
        let report = monitor
            .run_pass(&mut book, date(2015, 7, 4), &mut Journal::new(), |_| {})
            .unwrap();
        assert_eq!(report.declined, 1);
        assert_eq!(book.reminders()[0].last_date(), None);
    }
}
