use std::collections::{BTreeSet, HashSet};
use std::vec;

use chrono::NaiveDate;

use super::materializer::{Occurrence, RecurringSeries, SlotResolution};
use crate::domain::{CalendarPeriod, Transaction};

/// Upper bound on series slots examined while looking for future occurrences.
///
/// Counted per slot of the series' own cadence, so monthly and yearly series get the same reach.
/// Only a series whose every future slot is excluded ever hits it.
const MAX_TIMELINE_SLOTS: usize = 2400;

/// Lazy walk over a series: past exceptions first, then up to `horizon` future occurrences.
///
/// Every slot is emitted at most once. A period counts as resolved as soon as either an
/// exception or a generated occurrence has been yielded for it.
#[derive(Debug, Clone)]
pub struct OccurrenceTimeline<'a> {
    series: RecurringSeries<'a>,
    past: vec::IntoIter<Occurrence>,
    anchor: Option<Occurrence>,
    cursor: CalendarPeriod,
    resolved: HashSet<CalendarPeriod>,
    remaining: usize,
    emitted: u32,
    slots: usize,
}

impl<'a> OccurrenceTimeline<'a> {
    pub fn new(series: RecurringSeries<'a>, today: NaiveDate, horizon: usize) -> Self {
        let today_period = CalendarPeriod::of(today);
        let anchor_period = series.anchor_period();

        let slots: BTreeSet<CalendarPeriod> = series
            .exceptions()
            .iter()
            .filter_map(|exception| exception.parsed_date())
            .map(CalendarPeriod::of)
            .filter(|period| *period < today_period && series.is_eligible(*period))
            .collect();
        let past: Vec<Occurrence> = slots
            .iter()
            .filter_map(|period| match series.resolve_slot(*period) {
                SlotResolution::Resolved(occurrence) if occurrence.is_modified => Some(occurrence),
                _ => None,
            })
            .collect();
        let resolved = past.iter().map(|occurrence| occurrence.period).collect();

        let anchor = (anchor_period >= today_period && horizon > 0)
            .then(|| series.anchor_occurrence());
        let cursor = today_period.max(anchor_period.next_month());

        Self {
            series,
            past: past.into_iter(),
            anchor,
            cursor,
            resolved,
            remaining: horizon,
            emitted: 0,
            slots: 0,
        }
    }

    fn number(&mut self, mut occurrence: Occurrence) -> Occurrence {
        self.emitted += 1;
        occurrence.occurrence_number = self.emitted;
        occurrence
    }
}

impl Iterator for OccurrenceTimeline<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        if let Some(occurrence) = self.past.next() {
            return Some(self.number(occurrence));
        }
        if let Some(occurrence) = self.anchor.take() {
            self.remaining = self.remaining.saturating_sub(1);
            self.resolved.insert(occurrence.period);
            return Some(self.number(occurrence));
        }
        while self.remaining > 0 && self.slots < MAX_TIMELINE_SLOTS {
            let period = self.cursor;
            self.cursor = period.next_month();
            if !self.series.is_eligible(period) {
                continue;
            }
            self.slots += 1;
            if self.resolved.contains(&period) {
                continue;
            }
            if let SlotResolution::Resolved(occurrence) = self.series.resolve_slot(period) {
                self.resolved.insert(period);
                self.remaining -= 1;
                return Some(self.number(occurrence));
            }
        }
        None
    }
}

/// Past exceptions of `series` plus its next `horizon_count` occurrences from `today` on.
///
/// Recomputed from scratch on every call; a record that is not a usable template yields an
/// empty timeline. The forward walk gives up after 2400 slots of the series' cadence, which only
/// shortens the result when nearly every future slot is excluded.
pub fn occurrence_timeline(
    series: &Transaction,
    all_records: &[Transaction],
    horizon_count: usize,
    today: NaiveDate,
) -> Vec<Occurrence> {
    match RecurringSeries::from_snapshot(series, all_records) {
        Some(bound) => OccurrenceTimeline::new(bound, today, horizon_count).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frequency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn yields_requested_number_of_future_occurrences() {
        let template = Transaction::expense("rent", date(2024, 1, 31), dec!(1000))
            .recurring(Frequency::Monthly);
        let records = vec![template.clone()];
        let timeline = occurrence_timeline(&template, &records, 3, date(2024, 2, 10));
        let dates: Vec<_> = timeline.iter().map(|o| o.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
        let numbers: Vec<_> = timeline.iter().map(|o| o.occurrence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn future_template_is_its_own_first_occurrence() {
        let template = Transaction::expense("tv", date(2024, 6, 5), dec!(15))
            .recurring(Frequency::Monthly);
        let records = vec![template.clone()];
        let timeline = occurrence_timeline(&template, &records, 2, date(2024, 3, 1));
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].transaction.id, "tv");
        assert!(!timeline[0].is_virtual);
        assert_eq!(timeline[1].date, date(2024, 7, 5));
    }

    #[test]
    fn iterator_is_restartable_by_cloning() {
        let template = Transaction::expense("s", date(2024, 1, 1), dec!(1))
            .recurring(Frequency::Monthly);
        let records = vec![template.clone()];
        let series = RecurringSeries::from_snapshot(&template, &records).unwrap();
        let timeline = OccurrenceTimeline::new(series, date(2024, 5, 1), 4);
        let first: Vec<_> = timeline.clone().map(|o| o.transaction.id).collect();
        let second: Vec<_> = timeline.map(|o| o.transaction.id).collect();
        assert_eq!(first, second);
    }
}
