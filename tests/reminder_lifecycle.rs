mod common;

use common::{date, reminder, ymd};
use reminder_core::errors::{ApplyError, ReminderError};
use reminder_core::ledger::{Journal, TransactionTemplate};
use reminder_core::recurring::{
    apply_approved, compute_backlog, compute_pending, CursorState, RecurrenceRule, ReminderBook,
};
use uuid::Uuid;

#[test]
fn firing_each_due_date_walks_the_full_series() {
    let start = date(2015, 7, 4);
    let rule = RecurrenceRule::monthly_by_weekday(1);
    let expected: Vec<_> = reminder("Club", rule.clone(), start)
        .occurrences_from_start()
        .take(6)
        .collect();

    let mut club = reminder("Club", rule, start);
    let mut fired = Vec::new();
    for _ in 0..6 {
        let due = club.next_due_date().expect("series is unbounded");
        club.mark_fired(due);
        fired.push(due);
    }
    assert_eq!(fired, expected);
    assert_eq!(club.state(), CursorState::Fired(expected[5]));
}

#[test]
fn end_date_exhausts_reminder() {
    let mut trial = reminder(
        "Trial",
        RecurrenceRule::weekly(3).until(date(2015, 8, 14)),
        date(2015, 7, 4),
    );
    assert_eq!(trial.advance_cursor(), Some(date(2015, 7, 4)));
    assert_eq!(trial.advance_cursor(), Some(date(2015, 7, 25)));
    assert_eq!(trial.advance_cursor(), None);
    assert_eq!(trial.last_date(), Some(date(2015, 7, 25)));
}

#[test]
fn invalid_edits_are_rejected_without_side_effects() {
    let mut rent = reminder("Rent", RecurrenceRule::monthly_by_date(1), date(2015, 7, 4));
    assert_eq!(rent.set_increment(0), Err(ReminderError::InvalidIncrement(0)));
    assert!(matches!(
        rent.set_end_date(Some(date(2015, 7, 3))),
        Err(ReminderError::EndBeforeStart { .. })
    ));
    assert_eq!(rent.rule(), &RecurrenceRule::monthly_by_date(1));
}

#[test]
fn end_to_end_resolution_with_journal() {
    let checking = Uuid::new_v4();
    let landlord = Uuid::new_v4();
    let mut journal = Journal::with_accounts([checking, landlord]);
    let mut book = ReminderBook::new("Household");

    let rent = reminder("Rent", RecurrenceRule::monthly_by_date(1), date(2015, 7, 1))
        .with_transaction(TransactionTemplate::new(checking, landlord, 950.0).with_memo("July"));
    let rent_id = book.add(rent).unwrap();
    let mut gym = reminder("Gym", RecurrenceRule::weekly(1), date(2015, 7, 3));
    gym.set_auto_create(true);
    let gym_id = book.add(gym).unwrap();
    let later = reminder("Taxes", RecurrenceRule::yearly(1), date(2016, 4, 15));
    book.add(later).unwrap();

    let mut pending = compute_pending(book.reminders(), date(2015, 7, 4));
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].reminder_id, rent_id);
    assert!(!pending[0].approved);
    assert!(pending[1].approved);

    pending[0].approve();
    let report = apply_approved(&mut book, &pending, &mut journal);
    assert!(report.is_clean());
    assert_eq!(report.fired.len(), 2);
    assert_eq!(journal.for_reminder(rent_id).len(), 1);

    assert_eq!(book.get(rent_id).unwrap().next_due_date(), Some(date(2015, 8, 1)));
    assert_eq!(book.get(gym_id).unwrap().next_due_date(), Some(date(2015, 7, 10)));
    assert!(compute_pending(book.reminders(), date(2015, 7, 4)).is_empty());
}

#[test]
fn unknown_account_leaves_reminder_due() {
    let mut journal = Journal::with_accounts([Uuid::new_v4()]);
    let mut book = ReminderBook::new("Household");
    let mut stray = reminder("Stray", RecurrenceRule::daily(1), date(2015, 7, 1))
        .with_transaction(TransactionTemplate::new(Uuid::new_v4(), Uuid::new_v4(), 1.0));
    stray.set_auto_create(true);
    let id = book.add(stray).unwrap();

    let backlog = compute_backlog(book.reminders(), date(2015, 7, 2));
    let report = apply_approved(&mut book, &backlog, &mut journal);
    assert!(report.fired.is_empty());
    assert!(matches!(report.failures[0].error, ApplyError::Ledger(_)));
    assert_eq!(report.failures[1].error, ApplyError::Skipped);
    assert_eq!(book.get(id).unwrap().state(), CursorState::NeverFired);
}

#[test]
fn backlog_catches_up_in_order() {
    let mut book = ReminderBook::new("Household");
    let mut water = reminder("Water", RecurrenceRule::monthly_by_date(1), date(2015, 1, 31));
    water.set_auto_create(true);
    let id = book.add(water).unwrap();

    let backlog = compute_backlog(book.reminders(), date(2015, 4, 30));
    let dates: Vec<_> = backlog.iter().map(|p| p.due_date).collect();
    assert_eq!(
        dates,
        ymd(&[(2015, 1, 31), (2015, 2, 28), (2015, 3, 31), (2015, 4, 30)])
    );
    apply_approved(&mut book, &backlog, &mut Journal::new());
    assert_eq!(book.get(id).unwrap().next_due_date(), Some(date(2015, 5, 31)));
}
