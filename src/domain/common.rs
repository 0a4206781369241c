//! Calendar primitives shared by the occurrence and installment engines.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Parses the date portion of a stored date string.
///
/// Accepts plain `YYYY-MM-DD` as well as ISO date-times, whose first ten characters carry the
/// calendar date. Anything else yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Formats a date the way stored records and exclusion lists spell it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Number of days in the given month, or `None` for an out-of-range month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some((first_next - Duration::days(1)).day())
}

/// One calendar month, the slot unit every occurrence is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarPeriod {
    pub year: i32,
    pub month: u32,
}

impl CalendarPeriod {
    /// Builds a period, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidInput(format!(
                "month must be within 1..=12, got {}",
                month
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(EngineError::InvalidInput(format!(
                "year {} is out of range",
                year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month index counted from year zero; handy for differences.
    fn ordinal(self) -> i64 {
        self.year as i64 * 12 + self.month as i64 - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: (ordinal.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn add_months(self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    pub fn next_month(self) -> Self {
        self.add_months(1)
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(self, earlier: CalendarPeriod) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        CalendarPeriod::of(date) == self
    }

    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(28)
    }

    /// The date on `day` within this period, clamped to the month's last day.
    pub fn date_clamped(self, day: u32) -> Option<NaiveDate> {
        let day = day.clamp(1, self.days());
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for CalendarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_iso_datetime_strings() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 15);
        assert_eq!(parse_date("2024-05-15"), expected);
        assert_eq!(parse_date("2024-05-15T12:30:00.000Z"), expected);
        assert_eq!(parse_date(" 2024-05-15 "), expected);
        assert_eq!(parse_date("15/05/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn period_arithmetic_rolls_years() {
        let period = CalendarPeriod::new(2024, 11).unwrap();
        assert_eq!(period.add_months(3), CalendarPeriod::new(2025, 2).unwrap());
        assert_eq!(period.add_months(-11), CalendarPeriod::new(2023, 12).unwrap());
        assert_eq!(
            CalendarPeriod::new(2025, 2).unwrap().months_since(period),
            3
        );
        assert_eq!(period.to_string(), "2024-11");
    }

    #[test]
    fn clamps_day_to_month_length() {
        let feb = CalendarPeriod::new(2023, 2).unwrap();
        assert_eq!(feb.date_clamped(31), NaiveDate::from_ymd_opt(2023, 2, 28));
        let leap_feb = CalendarPeriod::new(2024, 2).unwrap();
        assert_eq!(leap_feb.date_clamped(30), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(CalendarPeriod::new(2024, 0).is_err());
        assert!(CalendarPeriod::new(2024, 13).is_err());
    }
}
