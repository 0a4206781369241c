#![allow(dead_code)]

use chrono::NaiveDate;
use fintrack_core::{CalendarPeriod, Frequency, Transaction};
use rust_decimal::Decimal;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn period(year: i32, month: u32) -> CalendarPeriod {
    CalendarPeriod::new(year, month).expect("valid test period")
}

/// A monthly expense series anchored on `anchor`.
pub fn monthly_expense(id: &str, anchor: NaiveDate, amount: Decimal) -> Transaction {
    Transaction::expense(id, anchor, amount)
        .with_description(id)
        .recurring(Frequency::Monthly)
}

/// A yearly expense series anchored on `anchor`.
pub fn yearly_expense(id: &str, anchor: NaiveDate, amount: Decimal) -> Transaction {
    Transaction::expense(id, anchor, amount)
        .with_description(id)
        .recurring(Frequency::Yearly)
}
