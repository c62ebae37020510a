use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{iterator::Occurrences, rule::RecurrenceRule};
use crate::errors::ReminderError;
use crate::ledger::TransactionTemplate;

/// Where a reminder's last-fired cursor stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    NeverFired,
    Fired(NaiveDate),
}

/// A scheduled recurring event with its last-fired cursor. Identity is the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    id: Uuid,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction: Option<TransactionTemplate>,
    rule: RecurrenceRule,
    start_date: NaiveDate,
    #[serde(default)]
    last_date: Option<NaiveDate>,
    #[serde(default = "Reminder::default_enabled")]
    enabled: bool,
    #[serde(default)]
    auto_create: bool,
    #[serde(default)]
    days_advance: u32,
}

impl Reminder {
    pub fn new(
        description: impl Into<String>,
        rule: RecurrenceRule,
        start_date: NaiveDate,
    ) -> Result<Self, ReminderError> {
        let reminder = Self {
            id: Uuid::new_v4(),
            description: description.into(),
            notes: None,
            account: None,
            transaction: None,
            rule,
            start_date,
            last_date: None,
            enabled: true,
            auto_create: false,
            days_advance: 0,
        };
        reminder.validate()?;
        Ok(reminder)
    }

    fn default_enabled() -> bool {
        true
    }

    /// Checks the invariants a stored or edited reminder must hold.
    pub fn validate(&self) -> Result<(), ReminderError> {
        if self.description.trim().is_empty() {
            return Err(ReminderError::EmptyDescription);
        }
        self.rule.validate(self.start_date)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), ReminderError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ReminderError::EmptyDescription);
        }
        self.description = description;
        Ok(())
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub fn account(&self) -> Option<Uuid> {
        self.account
    }

    pub fn set_account(&mut self, account: Option<Uuid>) {
        self.account = account;
    }

    pub fn transaction(&self) -> Option<&TransactionTemplate> {
        self.transaction.as_ref()
    }

    pub fn set_transaction(&mut self, transaction: Option<TransactionTemplate>) {
        self.transaction = transaction;
    }

    pub fn with_transaction(mut self, transaction: TransactionTemplate) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    /// Replaces the rule; the reminder is left untouched when it is invalid.
    pub fn set_rule(&mut self, rule: RecurrenceRule) -> Result<(), ReminderError> {
        rule.validate(self.start_date)?;
        self.rule = rule;
        Ok(())
    }

    pub fn set_increment(&mut self, increment: u32) -> Result<(), ReminderError> {
        let rule = RecurrenceRule {
            increment,
            ..self.rule.clone()
        };
        self.set_rule(rule)
    }

    pub fn set_end_date(&mut self, end_date: Option<NaiveDate>) -> Result<(), ReminderError> {
        let rule = RecurrenceRule {
            end_date,
            ..self.rule.clone()
        };
        self.set_rule(rule)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Moves the anchor date. The cursor is kept: it still marks the date up
    /// to which occurrences were confirmed.
    pub fn set_start_date(&mut self, start_date: NaiveDate) -> Result<(), ReminderError> {
        self.rule.validate(start_date)?;
        self.start_date = start_date;
        Ok(())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    pub fn state(&self) -> CursorState {
        match self.last_date {
            Some(date) => CursorState::Fired(date),
            None => CursorState::NeverFired,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_auto_create(&self) -> bool {
        self.auto_create
    }

    pub fn set_auto_create(&mut self, auto_create: bool) {
        self.auto_create = auto_create;
    }

    pub fn days_advance(&self) -> u32 {
        self.days_advance
    }

    pub fn set_days_advance(&mut self, days: u32) {
        self.days_advance = days;
    }

    /// Occurrences still to come: everything after the cursor, or the whole
    /// series from the start date when the reminder never fired.
    pub fn iter(&self) -> Occurrences {
        match self.last_date {
            Some(last) => Occurrences::after(self.rule.clone(), self.start_date, last),
            None => Occurrences::new(self.rule.clone(), self.start_date),
        }
    }

    /// The full series from the start date, ignoring the cursor.
    pub fn occurrences_from_start(&self) -> Occurrences {
        Occurrences::new(self.rule.clone(), self.start_date)
    }

    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.iter().next()
    }

    /// The date on which a notification for `due` should first appear. An
    /// advance reaching past the calendar's start saturates to its minimum.
    pub fn notify_date(&self, due: NaiveDate) -> NaiveDate {
        due.checked_sub_signed(Duration::days(self.days_advance as i64))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Records `occurrence` as fired. The caller passes the date returned by
    /// [`Reminder::next_due_date`]; no monotonicity check happens here.
    pub fn mark_fired(&mut self, occurrence: NaiveDate) {
        self.last_date = Some(occurrence);
    }

    /// Fires the current next-due occurrence, returning it.
    pub fn advance_cursor(&mut self) -> Option<NaiveDate> {
        let next = self.next_due_date()?;
        self.mark_fired(next);
        Some(next)
    }

    /// Copy with a fresh id, for saving an edited reminder as a new one.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

impl PartialEq for Reminder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Reminder {}

impl PartialOrd for Reminder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reminder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.description
            .cmp(&other.description)
            .then_with(|| self.rule.kind.cmp(&other.rule.kind))
            .then_with(|| self.id.cmp(&other.id))
    }
}
