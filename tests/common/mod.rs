#![allow(dead_code)]

use chrono::NaiveDate;
use reminder_core::recurring::{RecurrenceRule, Reminder};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid literal date")
}

pub fn ymd(list: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
    list.iter().map(|&(y, m, d)| date(y, m, d)).collect()
}

pub fn reminder(description: &str, rule: RecurrenceRule, start: NaiveDate) -> Reminder {
    Reminder::new(description, rule, start).expect("valid reminder")
}
