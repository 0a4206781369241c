//! Single-step edits of one occurrence of a series.
//!
//! Editing an occurrence touches two records: a new exception record and the template's
//! exclusion list. Both are produced together here so the store can persist them as one write.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::materializer::RecurringSeries;
use crate::domain::{CalendarPeriod, Transaction, TransactionType};
use crate::errors::{EngineError, Result};

/// Field overrides for a single occurrence. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccurrencePatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
    pub is_paid: Option<bool>,
}

impl OccurrencePatch {
    fn apply(self, record: &mut Transaction) {
        if let Some(date) = self.date {
            record.set_date(date);
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(kind) = self.kind {
            record.kind = kind;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(paid) = self.is_paid {
            record.is_paid = Some(paid);
        }
    }
}

/// Records to persist together after editing one occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceResolution {
    /// New materialized exception for the slot.
    pub exception: Transaction,
    /// Template with the slot's unedited date added to its exclusions.
    pub template: Transaction,
}

/// Builds the records that resolve edits of single occurrences.
pub struct OccurrenceEditor;

impl OccurrenceEditor {
    /// Materializes the occurrence of `period` with `patch` applied.
    ///
    /// The exception starts from the slot's current state: the latest exception if one exists,
    /// otherwise the projection of the template. It gets a fresh id and `now` as its creation
    /// time, so it wins over every earlier exception for the same slot.
    pub fn edit(
        template: &Transaction,
        records: &[Transaction],
        period: CalendarPeriod,
        patch: OccurrencePatch,
        now: DateTime<Utc>,
    ) -> Result<OccurrenceResolution> {
        let series = Self::bind(template, records)?;
        let naive = Self::slot_date(&series, period)?;
        if let Some(date) = patch.date {
            if !period.contains(date) {
                return Err(EngineError::InvalidInput(format!(
                    "edited date {} leaves occurrence period {}",
                    date, period
                )));
            }
        }

        let mut exception = match series.exception_for(period) {
            Some(existing) => existing.clone(),
            None => series.virtual_record(period, naive),
        };
        exception.id = Transaction::generate_id();
        exception.is_recurring = false;
        exception.frequency = None;
        exception.excluded_dates.clear();
        exception.recurring_group_id = Some(template.id.clone());
        exception.created_at = Some(now);
        patch.apply(&mut exception);

        let mut updated = template.clone();
        updated.add_excluded_date(naive);

        tracing::debug!(
            series = %template.id,
            %period,
            exception = %exception.id,
            "materialized occurrence edit"
        );
        Ok(OccurrenceResolution {
            exception,
            template: updated,
        })
    }

    /// Marks one occurrence paid or unpaid by materializing it.
    pub fn set_paid(
        template: &Transaction,
        records: &[Transaction],
        period: CalendarPeriod,
        paid: bool,
        now: DateTime<Utc>,
    ) -> Result<OccurrenceResolution> {
        let patch = OccurrencePatch {
            is_paid: Some(paid),
            ..OccurrencePatch::default()
        };
        Self::edit(template, records, period, patch, now)
    }

    /// Returns the template with the occurrence of `period` skipped.
    pub fn skip(template: &Transaction, period: CalendarPeriod) -> Result<Transaction> {
        let series = Self::bind(template, &[])?;
        let naive = Self::slot_date(&series, period)?;
        let mut updated = template.clone();
        if !updated.add_excluded_date(naive) {
            tracing::debug!(series = %template.id, %period, "occurrence already skipped");
        }
        Ok(updated)
    }

    fn bind<'a>(
        template: &'a Transaction,
        records: &'a [Transaction],
    ) -> Result<RecurringSeries<'a>> {
        if !template.is_series_template() {
            return Err(EngineError::NotRecurring(template.id.clone()));
        }
        RecurringSeries::from_snapshot(template, records).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "series `{}` has malformed date `{}`",
                template.id, template.date
            ))
        })
    }

    fn slot_date(series: &RecurringSeries<'_>, period: CalendarPeriod) -> Result<NaiveDate> {
        if !series.is_eligible(period) {
            return Err(EngineError::InvalidReference(format!(
                "{} is not a generated occurrence of series `{}`",
                period,
                series.template().id
            )));
        }
        series.naive_date(period).ok_or_else(|| {
            EngineError::InvalidInput(format!("no calendar date for period {}", period))
        })
    }
}
