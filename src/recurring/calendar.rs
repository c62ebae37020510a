//! Locale-independent calendar arithmetic used by the recurrence rules.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

pub fn is_last_day_of_year(date: NaiveDate) -> bool {
    date.ordinal() == days_in_year(date.year())
}

/// Splits `date` plus `months` into a (year, month) pair.
fn month_offset(date: NaiveDate, months: i64) -> Option<(i32, u32)> {
    let index = (date.year() as i64 * 12 + date.month0() as i64).checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    Some((year, index.rem_euclid(12) as u32 + 1))
}

/// Moves `date` by `months`, keeping `anchor_day` when the target month is long
/// enough and clamping to the month's last day otherwise.
pub fn shift_month(date: NaiveDate, months: i64, anchor_day: u32) -> Option<NaiveDate> {
    let (year, month) = month_offset(date, months)?;
    let day = anchor_day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Ordinal position of the weekday within its month, counted from the 1st:
/// days 1-7 are the 1st occurrence, 8-14 the 2nd, and so on.
pub fn weekday_ordinal(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Returns the `ordinal`-th `weekday` of the month. A 5th ordinal in a month
/// with only four such weekdays resolves to the last one.
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: u32,
) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let lead = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    let first_match = first.checked_add_signed(Duration::days(lead))?;
    let mut ordinal = ordinal.max(1) as i64;
    while ordinal > 1 {
        if let Some(candidate) = first_match.checked_add_signed(Duration::weeks(ordinal - 1)) {
            if candidate.month() == month {
                return Some(candidate);
            }
        }
        ordinal -= 1;
    }
    Some(first_match)
}

/// Same ordinal weekday as `date`, `months` later.
pub fn shift_month_by_weekday(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let (year, month) = month_offset(date, months)?;
    nth_weekday_of_month(year, month, date.weekday(), weekday_ordinal(date))
}

/// Moves `date` by `years`. The last day of a year maps onto the last day of
/// the target year; any other date keeps its day-of-year.
pub fn shift_year(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    let year = i32::try_from((date.year() as i64).checked_add(years)?).ok()?;
    let length = days_in_year(year);
    let ordinal = if is_last_day_of_year(date) {
        length
    } else {
        date.ordinal().min(length)
    };
    NaiveDate::from_yo_opt(year, ordinal)
}

/// Whole months between the two dates' calendar months.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 * 12 + to.month0() as i64) - (from.year() as i64 * 12 + from.month0() as i64)
}
