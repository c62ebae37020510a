//! Resolution of due reminders and application of the reviewer's decisions.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{book::ReminderBook, reminder::Reminder};
use crate::errors::ApplyError;
use crate::ledger::TransactionSink;

/// Upper bound on catch-up occurrences listed for a single reminder.
const MAX_BACKLOG_PER_REMINDER: usize = 1024;

/// A due occurrence awaiting the reviewer's decision. Lives only for the
/// duration of one notification round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminder {
    pub reminder_id: Uuid,
    pub description: String,
    /// The occurrence the cursor advances to once approved.
    pub due_date: NaiveDate,
    /// Date given to the materialized transaction; editable by the reviewer.
    pub commit_date: NaiveDate,
    pub approved: bool,
    pub auto_create: bool,
}

impl PendingReminder {
    fn new(reminder: &Reminder, due_date: NaiveDate) -> Self {
        Self {
            reminder_id: reminder.id(),
            description: reminder.description().to_string(),
            due_date,
            commit_date: due_date,
            approved: reminder.is_auto_create(),
            auto_create: reminder.is_auto_create(),
        }
    }

    pub fn approve(&mut self) {
        self.approved = true;
    }

    pub fn decline(&mut self) {
        self.approved = false;
    }

    pub fn set_commit_date(&mut self, date: NaiveDate) {
        self.commit_date = date;
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.due_date < as_of
    }
}

fn is_notifiable(reminder: &Reminder, due: NaiveDate, as_of: NaiveDate) -> bool {
    reminder.notify_date(due) <= as_of
}

fn sort_pending(pending: &mut [PendingReminder]) {
    pending.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.description.cmp(&b.description))
            .then_with(|| a.reminder_id.cmp(&b.reminder_id))
    });
}

/// One entry per enabled reminder whose next due date, less its advance
/// notice, falls on or before `as_of`.
pub fn compute_pending<'a, I>(reminders: I, as_of: NaiveDate) -> Vec<PendingReminder>
where
    I: IntoIterator<Item = &'a Reminder>,
{
    let mut pending = Vec::new();
    for reminder in reminders.into_iter().filter(|r| r.is_enabled()) {
        let Some(due) = reminder.next_due_date() else {
            continue;
        };
        if is_notifiable(reminder, due, as_of) {
            tracing::debug!(id = %reminder.id(), %due, %as_of, "reminder pending");
            pending.push(PendingReminder::new(reminder, due));
        }
    }
    sort_pending(&mut pending);
    pending
}

/// Every notifiable occurrence per enabled reminder, oldest first. Used to
/// catch up after the application was closed for several periods.
pub fn compute_backlog<'a, I>(reminders: I, as_of: NaiveDate) -> Vec<PendingReminder>
where
    I: IntoIterator<Item = &'a Reminder>,
{
    let mut pending = Vec::new();
    for reminder in reminders.into_iter().filter(|r| r.is_enabled()) {
        let before = pending.len();
        pending.extend(
            reminder
                .iter()
                .take_while(|due| is_notifiable(reminder, *due, as_of))
                .take(MAX_BACKLOG_PER_REMINDER + 1)
                .map(|due| PendingReminder::new(reminder, due)),
        );
        if pending.len() - before > MAX_BACKLOG_PER_REMINDER {
            pending.truncate(before + MAX_BACKLOG_PER_REMINDER);
            tracing::warn!(id = %reminder.id(), "backlog truncated");
        }
    }
    sort_pending(&mut pending);
    pending
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub reminder_id: Uuid,
    pub due_date: NaiveDate,
    pub transaction_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub reminder_id: Uuid,
    pub due_date: NaiveDate,
    pub error: ApplyError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub fired: Vec<FiredReminder>,
    pub failures: Vec<ApplyFailure>,
    pub declined: usize,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn transactions_created(&self) -> usize {
        self.fired
            .iter()
            .filter(|fired| fired.transaction_id.is_some())
            .count()
    }
}

/// Applies every approved entry: materializes the reminder's transaction
/// template (if any) dated `commit_date`, then advances the cursor to
/// `due_date`.
///
/// The cursor only moves after the ledger accepted the transaction. A failed
/// entry stays due, and later entries of the same reminder in this batch are
/// skipped so the cursor never passes an occurrence that was not recorded.
/// Entries on or before the reminder's cursor are rejected, so applying a
/// stale list never records a transaction twice or moves the cursor back.
pub fn apply_approved<S>(
    book: &mut ReminderBook,
    pending: &[PendingReminder],
    sink: &mut S,
) -> ApplyReport
where
    S: TransactionSink + ?Sized,
{
    let mut report = ApplyReport::default();
    let mut approved: Vec<&PendingReminder> = pending.iter().filter(|p| p.approved).collect();
    report.declined = pending.len() - approved.len();
    approved.sort_by_key(|entry| entry.due_date);

    let mut failed: HashSet<Uuid> = HashSet::new();
    for entry in approved {
        let id = entry.reminder_id;
        if failed.contains(&id) {
            report.failures.push(ApplyFailure {
                reminder_id: id,
                due_date: entry.due_date,
                error: ApplyError::Skipped,
            });
            continue;
        }
        let Some(reminder) = book.get_mut(id) else {
            tracing::warn!(%id, "approved reminder no longer exists");
            report.failures.push(ApplyFailure {
                reminder_id: id,
                due_date: entry.due_date,
                error: ApplyError::MissingReminder(id),
            });
            continue;
        };

        if let Some(last) = reminder.last_date() {
            if entry.due_date <= last {
                tracing::warn!(%id, due = %entry.due_date, %last, "occurrence already fired");
                report.failures.push(ApplyFailure {
                    reminder_id: id,
                    due_date: entry.due_date,
                    error: ApplyError::AlreadyFired { last },
                });
                continue;
            }
        }

        let transaction_id = match reminder.transaction() {
            Some(template) => match sink.materialize(template, entry.commit_date, id) {
                Ok(txn_id) => Some(txn_id),
                Err(err) => {
                    tracing::warn!(%id, due = %entry.due_date, error = %err, "transaction not created; reminder stays due");
                    failed.insert(id);
                    report.failures.push(ApplyFailure {
                        reminder_id: id,
                        due_date: entry.due_date,
                        error: err.into(),
                    });
                    continue;
                }
            },
            None => None,
        };

        reminder.mark_fired(entry.due_date);
        tracing::info!(%id, due = %entry.due_date, description = reminder.description(), "reminder fired");
        report.fired.push(FiredReminder {
            reminder_id: id,
            due_date: entry.due_date,
            transaction_id,
        });
    }

    if !report.fired.is_empty() {
        book.touch();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;
    use crate::ledger::{Journal, TransactionTemplate};
    use crate::recurring::RecurrenceRule;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct FailingSink;

    impl TransactionSink for FailingSink {
        fn materialize(
            &mut self,
            _template: &TransactionTemplate,
            _date: NaiveDate,
            _reminder_id: Uuid,
        ) -> Result<Uuid, LedgerError> {
            Err(LedgerError::Rejected("ledger closed".into()))
        }
    }

    #[test]
    fn due_today_and_overdue_are_pending() {
        let as_of = date(2015, 7, 10);
        let due_today = Reminder::new("Today", RecurrenceRule::daily(1), as_of).unwrap();
        let overdue = Reminder::new("Late", RecurrenceRule::weekly(1), date(2015, 7, 4)).unwrap();
        let future = Reminder::new("Later", RecurrenceRule::weekly(1), date(2015, 7, 11)).unwrap();
        let pending = compute_pending([&due_today, &overdue, &future], as_of);
        let names: Vec<_> = pending.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(names, vec!["Late", "Today"]);
        assert!(pending[0].is_overdue(as_of));
    }

    #[test]
    fn days_advance_widens_the_window() {
        let mut reminder =
            Reminder::new("Insurance", RecurrenceRule::yearly(1), date(2015, 7, 15)).unwrap();
        assert!(compute_pending([&reminder], date(2015, 7, 10)).is_empty());
        reminder.set_days_advance(5);
        let pending = compute_pending([&reminder], date(2015, 7, 10));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].due_date, date(2015, 7, 15));
    }

    #[test]
    fn oversized_days_advance_still_notifies() {
        let mut reminder =
            Reminder::new("Insurance", RecurrenceRule::yearly(1), date(2015, 7, 15)).unwrap();
        reminder.set_days_advance(100_000_000);
        let pending = compute_pending([&reminder], date(2015, 7, 1));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].due_date, date(2015, 7, 15));
    }

    #[test]
    fn disabled_and_exhausted_reminders_are_skipped() {
        let as_of = date(2016, 1, 1);
        let mut disabled = Reminder::new("Off", RecurrenceRule::daily(1), date(2015, 7, 4)).unwrap();
        disabled.set_enabled(false);
        let mut finished = Reminder::new(
            "Done",
            RecurrenceRule::daily(1).until(date(2015, 7, 5)),
            date(2015, 7, 4),
        )
        .unwrap();
        finished.mark_fired(date(2015, 7, 5));
        assert!(compute_pending([&disabled, &finished], as_of).is_empty());
    }

    #[test]
    fn auto_create_preapproves() {
        let mut reminder = Reminder::new("Auto", RecurrenceRule::daily(1), date(2015, 7, 4)).unwrap();
        reminder.set_auto_create(true);
        let pending = compute_pending([&reminder], date(2015, 7, 4));
        assert!(pending[0].approved);
        assert!(pending[0].auto_create);
    }

    #[test]
    fn backlog_lists_every_missed_occurrence() {
        let reminder = Reminder::new("Walk", RecurrenceRule::daily(2), date(2015, 7, 1)).unwrap();
        let backlog = compute_backlog([&reminder], date(2015, 7, 6));
        let dates: Vec<_> = backlog.iter().map(|p| p.due_date).collect();
        assert_eq!(dates, vec![date(2015, 7, 1), date(2015, 7, 3), date(2015, 7, 5)]);
    }

    #[test]
    fn apply_creates_transaction_then_advances_cursor() {
        let mut book = ReminderBook::new("Home");
        let template = TransactionTemplate::new(Uuid::new_v4(), Uuid::new_v4(), 900.0);
        let reminder = Reminder::new("Rent", RecurrenceRule::monthly_by_date(1), date(2015, 7, 4))
            .unwrap()
            .with_transaction(template);
        let id = book.add(reminder).unwrap();

        let mut pending = compute_pending(book.reminders(), date(2015, 7, 4));
        pending[0].approve();
        pending[0].set_commit_date(date(2015, 7, 6));

        let mut journal = Journal::new();
        let report = apply_approved(&mut book, &pending, &mut journal);
        assert!(report.is_clean());
        assert_eq!(report.transactions_created(), 1);

        let txn = &journal.transactions[0];
        assert_eq!(txn.date, date(2015, 7, 6));
        assert_eq!(txn.reminder_id, Some(id));
        let stored = book.get(id).unwrap();
        assert_eq!(stored.last_date(), Some(date(2015, 7, 4)));
        assert_eq!(stored.next_due_date(), Some(date(2015, 8, 4)));
    }

    #[test]
    fn declined_entries_leave_cursor_alone() {
        let mut book = ReminderBook::new("Home");
        let id = book
            .add(Reminder::new("Gym", RecurrenceRule::weekly(1), date(2015, 7, 4)).unwrap())
            .unwrap();
        let pending = compute_pending(book.reminders(), date(2015, 7, 4));
        let report = apply_approved(&mut book, &pending, &mut Journal::new());
        assert_eq!(report.declined, 1);
        assert!(report.fired.is_empty());
        assert_eq!(book.get(id).unwrap().last_date(), None);
    }

    #[test]
    fn failed_materialization_keeps_reminder_due() {
        let mut book = ReminderBook::new("Home");
        let template = TransactionTemplate::new(Uuid::new_v4(), Uuid::new_v4(), 10.0);
        let mut reminder =
            Reminder::new("Sub", RecurrenceRule::daily(1), date(2015, 7, 1)).unwrap();
        reminder.set_transaction(Some(template));
        reminder.set_auto_create(true);
        let id = book.add(reminder).unwrap();

        let backlog = compute_backlog(book.reminders(), date(2015, 7, 3));
        assert_eq!(backlog.len(), 3);
        let report = apply_approved(&mut book, &backlog, &mut FailingSink);

        assert!(report.fired.is_empty());
        assert_eq!(report.failures.len(), 3);
        assert!(matches!(report.failures[0].error, ApplyError::Ledger(_)));
        assert_eq!(report.failures[1].error, ApplyError::Skipped);
        assert_eq!(book.get(id).unwrap().next_due_date(), Some(date(2015, 7, 1)));
    }

    #[test]
    fn removed_reminder_is_reported() {
        let mut book = ReminderBook::new("Home");
        let id = book
            .add(Reminder::new("Temp", RecurrenceRule::once(), date(2015, 7, 4)).unwrap())
            .unwrap();
        let mut pending = compute_pending(book.reminders(), date(2015, 7, 4));
        pending[0].approve();
        book.remove(id).unwrap();
        let report = apply_approved(&mut book, &pending, &mut Journal::new());
        assert_eq!(report.failures[0].error, ApplyError::MissingReminder(id));
    }

    #[test]
    fn applying_the_same_list_twice_records_once() {
        let mut book = ReminderBook::new("Home");
        let template = TransactionTemplate::new(Uuid::new_v4(), Uuid::new_v4(), 5.0);
        let mut reminder = Reminder::new("Sub", RecurrenceRule::daily(1), date(2015, 7, 1))
            .unwrap()
            .with_transaction(template);
        reminder.set_auto_create(true);
        let id = book.add(reminder).unwrap();

        let stale = compute_pending(book.reminders(), date(2015, 7, 1));
        let backlog = compute_backlog(book.reminders(), date(2015, 7, 3));
        let mut journal = Journal::new();
        assert_eq!(apply_approved(&mut book, &backlog, &mut journal).fired.len(), 3);

        let again = apply_approved(&mut book, &backlog, &mut journal);
        assert!(again.fired.is_empty());
        assert_eq!(again.failures.len(), 3);
        let report = apply_approved(&mut book, &stale, &mut journal);
        assert!(report.fired.is_empty());
        assert_eq!(
            report.failures[0].error,
            ApplyError::AlreadyFired {
                last: date(2015, 7, 3)
            }
        );

        assert_eq!(journal.transactions.len(), 3);
        assert_eq!(book.get(id).unwrap().last_date(), Some(date(2015, 7, 3)));
        assert_eq!(book.get(id).unwrap().next_due_date(), Some(date(2015, 7, 4)));
    }

    #[test]
    fn backlog_is_capped_per_reminder() {
        let exact = Reminder::new("Exact", RecurrenceRule::daily(1), date(2015, 1, 1)).unwrap();
        let as_of = date(2015, 1, 1) + chrono::Duration::days(MAX_BACKLOG_PER_REMINDER as i64 - 1);
        assert_eq!(compute_backlog([&exact], as_of).len(), MAX_BACKLOG_PER_REMINDER);

        let later = as_of + chrono::Duration::days(10);
        let capped = compute_backlog([&exact], later);
        assert_eq!(capped.len(), MAX_BACKLOG_PER_REMINDER);
        assert_eq!(capped.last().map(|p| p.due_date), Some(as_of));
    }

    #[test]
    fn applying_backlog_walks_cursor_to_latest() {
        let mut book = ReminderBook::new("Home");
        let mut reminder = Reminder::new("Log", RecurrenceRule::daily(1), date(2015, 7, 1)).unwrap();
        reminder.set_auto_create(true);
        let id = book.add(reminder).unwrap();
        let backlog = compute_backlog(book.reminders(), date(2015, 7, 3));
        let report = apply_approved(&mut book, &backlog, &mut Journal::new());
        assert_eq!(report.fired.len(), 3);
        assert_eq!(book.get(id).unwrap().last_date(), Some(date(2015, 7, 3)));
        assert!(compute_pending(book.reminders(), date(2015, 7, 3)).is_empty());
    }
}
