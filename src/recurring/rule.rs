use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar;
use crate::errors::ReminderError;

/// The recurrence pattern of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecurrenceKind {
    /// Fires once on the start date.
    Once,
    Daily,
    Weekly,
    /// Same day of month, clamped to the last day of shorter months.
    MonthlyByDate,
    /// Same ordinal weekday of the month, e.g. the 2nd Tuesday.
    MonthlyByWeekday,
    Yearly,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Once => "once",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::MonthlyByDate => "monthly",
            RecurrenceKind::MonthlyByWeekday => "monthly-weekday",
            RecurrenceKind::Yearly => "yearly",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = ReminderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "once" | "none" | "one-time" => Ok(RecurrenceKind::Once),
            "daily" | "day" => Ok(RecurrenceKind::Daily),
            "weekly" | "week" => Ok(RecurrenceKind::Weekly),
            "monthly" | "monthly-date" | "month" => Ok(RecurrenceKind::MonthlyByDate),
            "monthly-weekday" | "monthly-day" => Ok(RecurrenceKind::MonthlyByWeekday),
            "yearly" | "annual" | "year" => Ok(RecurrenceKind::Yearly),
            other => Err(ReminderError::InvalidReference(format!(
                "unknown recurrence kind `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    pub increment: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn new(kind: RecurrenceKind, increment: u32) -> Self {
        Self {
            kind,
            increment,
            end_date: None,
        }
    }

    pub fn once() -> Self {
        Self::new(RecurrenceKind::Once, 1)
    }

    pub fn daily(increment: u32) -> Self {
        Self::new(RecurrenceKind::Daily, increment)
    }

    pub fn weekly(increment: u32) -> Self {
        Self::new(RecurrenceKind::Weekly, increment)
    }

    pub fn monthly_by_date(increment: u32) -> Self {
        Self::new(RecurrenceKind::MonthlyByDate, increment)
    }

    pub fn monthly_by_weekday(increment: u32) -> Self {
        Self::new(RecurrenceKind::MonthlyByWeekday, increment)
    }

    pub fn yearly(increment: u32) -> Self {
        Self::new(RecurrenceKind::Yearly, increment)
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Rejects rules that cannot produce a well-formed sequence from `start`.
    pub fn validate(&self, start: NaiveDate) -> Result<(), ReminderError> {
        if self.increment == 0 {
            return Err(ReminderError::InvalidIncrement(self.increment));
        }
        if let Some(end) = self.end_date {
            if end < start {
                return Err(ReminderError::EndBeforeStart { start, end });
            }
        }
        Ok(())
    }

    /// Moves `start` forward by `steps` periods of this rule's kind, ignoring
    /// the increment and the end date. `None` once past the calendar range.
    pub fn advance(&self, start: NaiveDate, steps: i64) -> Option<NaiveDate> {
        match self.kind {
            RecurrenceKind::Once => Some(start),
            RecurrenceKind::Daily => start.checked_add_signed(Duration::try_days(steps)?),
            RecurrenceKind::Weekly => start.checked_add_signed(Duration::try_weeks(steps)?),
            RecurrenceKind::MonthlyByDate => calendar::shift_month(start, steps, start.day()),
            RecurrenceKind::MonthlyByWeekday => calendar::shift_month_by_weekday(start, steps),
            RecurrenceKind::Yearly => calendar::shift_year(start, steps),
        }
    }

    /// The `index`-th occurrence (0 is `start` itself), ignoring the end date.
    fn unbounded(&self, start: NaiveDate, index: u64) -> Option<NaiveDate> {
        if self.kind == RecurrenceKind::Once {
            return (index == 0).then_some(start);
        }
        let steps = index.checked_mul(self.increment as u64)?;
        self.advance(start, i64::try_from(steps).ok()?)
    }

    /// The `index`-th occurrence, or `None` when it falls after the end date.
    pub fn occurrence(&self, start: NaiveDate, index: u64) -> Option<NaiveDate> {
        let date = self.unbounded(start, index)?;
        match self.end_date {
            Some(end) if date > end => None,
            _ => Some(date),
        }
    }

    /// Index of the first occurrence strictly after `cursor`.
    pub fn first_index_after(&self, start: NaiveDate, cursor: NaiveDate) -> u64 {
        if cursor < start {
            return 0;
        }
        let step = self.increment.max(1) as i64;
        let periods = match self.kind {
            RecurrenceKind::Once => return 1,
            RecurrenceKind::Daily => (cursor - start).num_days(),
            RecurrenceKind::Weekly => (cursor - start).num_days() / 7,
            RecurrenceKind::MonthlyByDate | RecurrenceKind::MonthlyByWeekday => {
                calendar::months_between(start, cursor)
            }
            RecurrenceKind::Yearly => (cursor.year() - start.year()) as i64,
        };
        let mut index = (periods.max(0) / step) as u64;
        while let Some(date) = self.unbounded(start, index) {
            if date > cursor {
                break;
            }
            index += 1;
        }
        while index > 0 {
            match self.unbounded(start, index - 1) {
                Some(date) if date > cursor => index -= 1,
                _ => break,
            }
        }
        index
    }

    /// Short frequency label such as "Monthly" or "Every 3 Weeks".
    pub fn label(&self) -> String {
        let (single, unit) = match self.kind {
            RecurrenceKind::Once => return "Once".into(),
            RecurrenceKind::Daily => ("Daily", "Day"),
            RecurrenceKind::Weekly => ("Weekly", "Week"),
            RecurrenceKind::MonthlyByDate | RecurrenceKind::MonthlyByWeekday => {
                ("Monthly", "Month")
            }
            RecurrenceKind::Yearly => ("Yearly", "Year"),
        };
        match self.increment {
            1 => single.into(),
            n => format!("Every {} {}s", n, unit),
        }
    }

    /// Frequency label including the anchor, e.g. "Monthly on the 1st Saturday".
    pub fn describe(&self, start: NaiveDate) -> String {
        let label = self.label();
        let detail = match self.kind {
            RecurrenceKind::Once => format!(" on {start}"),
            RecurrenceKind::Daily => String::new(),
            RecurrenceKind::Weekly => format!(" on {}", weekday_name(start)),
            RecurrenceKind::MonthlyByDate => format!(" on day {}", start.day()),
            RecurrenceKind::MonthlyByWeekday => format!(
                " on the {} {}",
                ordinal_suffix(calendar::weekday_ordinal(start)),
                weekday_name(start)
            ),
            RecurrenceKind::Yearly => format!(" on {}", start.format("%b %-d")),
        };
        let until = self
            .end_date
            .map(|end| format!(" until {end}"))
            .unwrap_or_default();
        format!("{label}{detail}{until}")
    }
}

fn ordinal_suffix(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}
