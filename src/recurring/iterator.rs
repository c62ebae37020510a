use std::iter::FusedIterator;

use chrono::NaiveDate;

use super::rule::RecurrenceRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    Producing { index: u64 },
    Exhausted,
}

/// Forward-only cursor over the occurrence dates of a rule.
///
/// Every date is derived from the original start date, so an iterator resumed
/// with [`Occurrences::after`] yields exactly what a continuously advanced one
/// would. Once the end date is passed the iterator stays exhausted.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    start: NaiveDate,
    state: IterState,
}

impl Occurrences {
    /// Starts at (and includes) `start`.
    pub fn new(rule: RecurrenceRule, start: NaiveDate) -> Self {
        Self {
            rule,
            start,
            state: IterState::Producing { index: 0 },
        }
    }

    /// Resumes at the first occurrence strictly after `cursor`.
    pub fn after(rule: RecurrenceRule, start: NaiveDate, cursor: NaiveDate) -> Self {
        let index = rule.first_index_after(start, cursor);
        Self {
            rule,
            start,
            state: IterState::Producing { index },
        }
    }

    pub fn state(&self) -> IterState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == IterState::Exhausted
    }

    /// The date the next call to `next` would return, without consuming it.
    pub fn peek(&self) -> Option<NaiveDate> {
        match self.state {
            IterState::Producing { index } => self.rule.occurrence(self.start, index),
            IterState::Exhausted => None,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let IterState::Producing { index } = self.state else {
            return None;
        };
        match self.rule.occurrence(self.start, index) {
            Some(date) => {
                self.state = IterState::Producing { index: index + 1 };
                Some(date)
            }
            None => {
                tracing::trace!(start = %self.start, index, "recurrence exhausted");
                self.state = IterState::Exhausted;
                None
            }
        }
    }
}

impl FusedIterator for Occurrences {}
