use chrono::NaiveDate;
use serde::Serialize;

use super::grouper::InstallmentGroup;
use crate::domain::CalendarPeriod;
use crate::errors::{EngineError, Result};

/// New due date for one parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateReassignment {
    pub id: String,
    pub date: NaiveDate,
}

/// Re-projects every parcel of `group` onto a schedule starting at `start_month`/`start_year`.
///
/// Parcel `k` lands `k - 1` months after the start, on `due_day` clamped to that month's
/// length. `k` is the parcel's installment index, or its 1-based position when the index is
/// missing. Nothing is renumbered and nothing is written; persisting the mapping is up to the
/// caller.
pub fn recalculate_installment_dates(
    group: &InstallmentGroup,
    due_day: u32,
    start_month: u32,
    start_year: i32,
) -> Result<Vec<DateReassignment>> {
    if !(1..=31).contains(&due_day) {
        return Err(EngineError::InvalidInput(format!(
            "due day must be within 1..=31, got {}",
            due_day
        )));
    }
    let start = CalendarPeriod::new(start_year, start_month)?;

    let mut reassignments = Vec::with_capacity(group.parcels.len());
    for (position, parcel) in group.parcels.iter().enumerate() {
        let index = parcel
            .current_installment
            .filter(|index| *index >= 1)
            .unwrap_or(position as u32 + 1);
        let period = start.add_months(i64::from(index) - 1);
        let date = period.date_clamped(due_day).ok_or_else(|| {
            EngineError::InvalidInput(format!("parcel {} falls outside the calendar", parcel.id))
        })?;
        reassignments.push(DateReassignment {
            id: parcel.id.clone(),
            date,
        });
    }

    tracing::debug!(
        group = %group.key,
        parcels = reassignments.len(),
        %start,
        due_day,
        "recalculated installment dates"
    );
    Ok(reassignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transaction;
    use crate::installments::grouper::group_installments;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn crosses_year_boundary() {
        let records: Vec<_> = (1..=4)
            .map(|k| {
                Transaction::expense(format!("p{k}"), date(2023, 1, 1), dec!(25))
                    .installment(k, 4)
                    .in_installment_group("g")
            })
            .collect();
        let group = &group_installments(&records)[0];
        let dates: Vec<_> = recalculate_installment_dates(group, 10, 11, 2024)
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 11, 10),
                date(2024, 12, 10),
                date(2025, 1, 10),
                date(2025, 2, 10)
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let records = vec![Transaction::expense("p", date(2024, 1, 1), dec!(1))
            .installment(1, 2)
            .in_installment_group("g")];
        let group = &group_installments(&records)[0];
        assert!(recalculate_installment_dates(group, 0, 1, 2024).is_err());
        assert!(recalculate_installment_dates(group, 32, 1, 2024).is_err());
        assert!(recalculate_installment_dates(group, 15, 13, 2024).is_err());
    }
}
