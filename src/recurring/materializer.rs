use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::{CalendarPeriod, Frequency, Transaction};
use crate::errors::Result;

/// One calendar instance of a recurring series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub period: CalendarPeriod,
    pub series_id: String,
    /// The record to display: a virtual projection of the template, the template itself, or
    /// the materialized exception that replaced the slot.
    pub transaction: Transaction,
    pub is_virtual: bool,
    pub is_modified: bool,
    pub occurrence_number: u32,
}

/// Outcome of resolving one calendar slot of a series.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotResolution {
    /// Not a slot of this series (before the anchor, the anchor itself, or off-cycle).
    Ineligible,
    /// Deliberately skipped through the template's exclusion list.
    Excluded,
    Resolved(Occurrence),
}

/// A series template together with the exceptions the snapshot holds for it.
#[derive(Debug, Clone)]
pub struct RecurringSeries<'a> {
    template: &'a Transaction,
    anchor: NaiveDate,
    frequency: Frequency,
    exceptions: Vec<&'a Transaction>,
}

impl<'a> RecurringSeries<'a> {
    /// Binds `template` to its exceptions in `records`.
    ///
    /// Returns `None` when the record is not a series template or its own date cannot be
    /// parsed; exceptions with unparseable dates are dropped.
    pub fn from_snapshot(template: &'a Transaction, records: &'a [Transaction]) -> Option<Self> {
        if !template.is_series_template() {
            return None;
        }
        let Some(anchor) = template.parsed_date() else {
            tracing::warn!(id = %template.id, date = %template.date, "skipping series with malformed date");
            return None;
        };
        let exceptions = records
            .iter()
            .filter(|record| record.is_exception_of(&template.id))
            .filter(|record| {
                let ok = record.parsed_date().is_some();
                if !ok {
                    tracing::warn!(id = %record.id, date = %record.date, "ignoring exception with malformed date");
                }
                ok
            })
            .collect();
        Some(Self {
            template,
            anchor,
            frequency: template.frequency_or_default(),
            exceptions,
        })
    }

    pub fn template(&self) -> &'a Transaction {
        self.template
    }

    pub fn anchor_period(&self) -> CalendarPeriod {
        CalendarPeriod::of(self.anchor)
    }

    pub fn exceptions(&self) -> &[&'a Transaction] {
        &self.exceptions
    }

    /// Whether `period` is a generated slot of this series. The anchor's own period is not: the
    /// template record represents it directly.
    pub fn is_eligible(&self, period: CalendarPeriod) -> bool {
        let anchor = self.anchor_period();
        if period <= anchor {
            return false;
        }
        match self.frequency {
            Frequency::Monthly => true,
            Frequency::Yearly => period.month == anchor.month && period.year > anchor.year,
        }
    }

    /// The unedited date of the slot: the anchor's day clamped to the period's length.
    pub fn naive_date(&self, period: CalendarPeriod) -> Option<NaiveDate> {
        period.date_clamped(self.anchor.day())
    }

    /// 1-based position of `period` in the series, counting the template's own period as 1.
    pub fn occurrence_number(&self, period: CalendarPeriod) -> u32 {
        let months = period.months_since(self.anchor_period()).max(0);
        let steps = match self.frequency {
            Frequency::Monthly => months,
            Frequency::Yearly => months / 12,
        };
        u32::try_from(steps + 1).unwrap_or(u32::MAX)
    }

    /// Stable identifier of the virtual occurrence in `period`.
    pub fn synthetic_id(&self, period: CalendarPeriod) -> String {
        format!("{}_recurring_{}", self.template.id, period)
    }

    /// All exceptions whose own date falls in `period`.
    pub fn exceptions_in(&self, period: CalendarPeriod) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.exceptions.iter().copied().filter(move |record| {
            record
                .parsed_date()
                .map_or(false, |date| period.contains(date))
        })
    }

    /// The winning exception for `period`: latest `created_at`, later snapshot position on ties.
    pub fn exception_for(&self, period: CalendarPeriod) -> Option<&'a Transaction> {
        let candidates: Vec<_> = self.exceptions_in(period).enumerate().collect();
        if candidates.len() > 1 {
            tracing::debug!(
                series = %self.template.id,
                %period,
                count = candidates.len(),
                "multiple exceptions for one slot, keeping the latest"
            );
        }
        candidates
            .into_iter()
            .max_by_key(|(position, record)| (record.created_at, *position))
            .map(|(_, record)| record)
    }

    pub(crate) fn resolve_slot(&self, period: CalendarPeriod) -> SlotResolution {
        if !self.is_eligible(period) {
            return SlotResolution::Ineligible;
        }
        let Some(naive) = self.naive_date(period) else {
            return SlotResolution::Ineligible;
        };
        let occurrence_number = self.occurrence_number(period);

        if let Some(exception) = self.exception_for(period) {
            return SlotResolution::Resolved(Occurrence {
                date: exception.parsed_date().unwrap_or(naive),
                period,
                series_id: self.template.id.clone(),
                transaction: exception.clone(),
                is_virtual: false,
                is_modified: true,
                occurrence_number,
            });
        }
        if self.template.is_excluded(naive) {
            return SlotResolution::Excluded;
        }

        SlotResolution::Resolved(Occurrence {
            date: naive,
            period,
            series_id: self.template.id.clone(),
            transaction: self.virtual_record(period, naive),
            is_virtual: true,
            is_modified: false,
            occurrence_number,
        })
    }

    /// Resolves the occurrence for `period`, if the series has one there.
    pub fn occurrence_in(&self, period: CalendarPeriod) -> Option<Occurrence> {
        match self.resolve_slot(period) {
            SlotResolution::Resolved(occurrence) => Some(occurrence),
            SlotResolution::Ineligible | SlotResolution::Excluded => None,
        }
    }

    /// The template itself viewed as the occurrence of its own period.
    pub fn anchor_occurrence(&self) -> Occurrence {
        Occurrence {
            date: self.anchor,
            period: self.anchor_period(),
            series_id: self.template.id.clone(),
            transaction: self.template.clone(),
            is_virtual: false,
            is_modified: false,
            occurrence_number: 1,
        }
    }

    pub(crate) fn virtual_record(&self, period: CalendarPeriod, date: NaiveDate) -> Transaction {
        let mut record = self.template.clone();
        record.id = self.synthetic_id(period);
        record.set_date(date);
        record.is_recurring = false;
        record.excluded_dates.clear();
        record.recurring_group_id = Some(self.template.id.clone());
        record.related_transaction_id = None;
        record.is_paid = Some(false);
        record.created_at = None;
        record
    }
}

/// Resolves the occurrence of `series` in `month`/`year` against the exceptions in `records`.
///
/// Returns `Ok(None)` when the record is not a usable template, the period is not a slot of the
/// series, or the slot was excluded. Only an out-of-range month is an error.
pub fn occurrences_in_period(
    series: &Transaction,
    records: &[Transaction],
    month: u32,
    year: i32,
) -> Result<Option<Occurrence>> {
    let period = CalendarPeriod::new(year, month)?;
    Ok(RecurringSeries::from_snapshot(series, records).and_then(|s| s.occurrence_in(period)))
}

/// One row of a month listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEntry {
    pub transaction: Transaction,
    pub date: NaiveDate,
    pub series_id: Option<String>,
    pub is_virtual: bool,
    pub is_modified: bool,
}

impl From<Occurrence> for MonthEntry {
    fn from(occurrence: Occurrence) -> Self {
        Self {
            transaction: occurrence.transaction,
            date: occurrence.date,
            series_id: Some(occurrence.series_id),
            is_virtual: occurrence.is_virtual,
            is_modified: occurrence.is_modified,
        }
    }
}

/// Everything to show for `period`: stored records dated in it plus one occurrence per series.
///
/// Exception records that a series already resolved for the month are listed once, through the
/// series, and never again as plain records.
pub fn month_view(records: &[Transaction], period: CalendarPeriod) -> Vec<MonthEntry> {
    let mut entries = Vec::new();
    let mut covered: HashSet<&str> = HashSet::new();

    for template in records.iter().filter(|record| record.is_series_template()) {
        let Some(series) = RecurringSeries::from_snapshot(template, records) else {
            continue;
        };
        if series.anchor_period() == period {
            entries.push(MonthEntry::from(series.anchor_occurrence()));
            continue;
        }
        if series.is_eligible(period) {
            covered.extend(series.exceptions_in(period).map(|record| record.id.as_str()));
        }
        if let Some(occurrence) = series.occurrence_in(period) {
            entries.push(MonthEntry::from(occurrence));
        }
    }

    for record in records.iter().filter(|record| !record.is_series_template()) {
        if covered.contains(record.id.as_str()) {
            continue;
        }
        let Some(date) = record.parsed_date() else {
            tracing::warn!(id = %record.id, date = %record.date, "skipping record with malformed date");
            continue;
        };
        if !period.contains(date) {
            continue;
        }
        entries.push(MonthEntry {
            transaction: record.clone(),
            date,
            series_id: record.recurring_group_id.clone(),
            is_virtual: false,
            is_modified: record.recurring_group_id.is_some(),
        });
    }

    entries.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.transaction.id.cmp(&b.transaction.id))
    });
    tracing::debug!(%period, count = entries.len(), "built month view");
    entries
}
