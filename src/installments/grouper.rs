use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Transaction, TransactionType};

/// All parcels of one multi-payment purchase, with its aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallmentGroup {
    pub key: String,
    pub description: String,
    pub kind: TransactionType,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub total_installments: u32,
    /// Ordered by installment index, then date.
    pub parcels: Vec<Transaction>,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub paid_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl InstallmentGroup {
    pub fn remaining_amount(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    pub fn remaining_count(&self) -> usize {
        self.parcels.len() - self.paid_count
    }

    /// First parcel, in installment order, explicitly marked unpaid.
    pub fn next_unpaid(&self) -> Option<&Transaction> {
        self.parcels.iter().find(|parcel| !parcel.counts_as_paid())
    }

    pub fn is_settled(&self) -> bool {
        self.paid_count == self.parcels.len()
    }

    fn from_parcels(key: String, mut parcels: Vec<Transaction>) -> Self {
        parcels.sort_by(|a, b| {
            let index_a = a.current_installment.unwrap_or(u32::MAX);
            let index_b = b.current_installment.unwrap_or(u32::MAX);
            index_a
                .cmp(&index_b)
                .then_with(|| compare_dates(a.parsed_date(), b.parsed_date()))
        });

        let first = &parcels[0];
        let kind = first.kind;
        let category = first.category.clone();
        let payment_method = first.payment_method.clone();
        let total_installments = parcels
            .iter()
            .filter_map(|parcel| parcel.installments)
            .max()
            .unwrap_or(parcels.len() as u32);

        let total_amount: Decimal = parcels.iter().map(|parcel| parcel.amount).sum();
        let paid: Vec<_> = parcels.iter().filter(|p| p.counts_as_paid()).collect();
        let paid_amount: Decimal = paid.iter().map(|parcel| parcel.amount).sum();
        let paid_count = paid.len();
        let dates: Vec<_> = parcels.iter().filter_map(|p| p.parsed_date()).collect();

        Self {
            description: canonical_description(&parcels),
            key,
            kind,
            category,
            payment_method,
            total_installments,
            total_amount,
            paid_amount,
            paid_count,
            start_date: dates.iter().min().copied(),
            end_date: dates.iter().max().copied(),
            parcels,
        }
    }
}

/// Primary purchase groups plus the reimbursement parcels of shared purchases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstallmentOverview {
    pub groups: Vec<InstallmentGroup>,
    /// Reimbursement sides of shared installment purchases, grouped on their own.
    pub shared: Vec<InstallmentGroup>,
}

/// Groups the parcels in `records` into purchases, leaving reimbursement parcels out.
pub fn group_installments(records: &[Transaction]) -> Vec<InstallmentGroup> {
    group_installments_with_shared(records).groups
}

/// Groups parcels into purchases and reimbursement parcels into a separate shared view.
///
/// A parcel is a reimbursement when a shared expense links to it through
/// `relatedTransactionId`; counting it with the purchase would double its total.
pub fn group_installments_with_shared(records: &[Transaction]) -> InstallmentOverview {
    let reimbursements: HashSet<&str> = records
        .iter()
        .filter(|record| record.is_shared && record.kind == TransactionType::Expense)
        .filter_map(|record| record.related_transaction_id.as_deref())
        .collect();

    let mut primary = Buckets::default();
    let mut shared = Buckets::default();
    for record in records.iter().filter(|r| r.is_installment_parcel()) {
        let key = group_key(record);
        if reimbursements.contains(record.id.as_str()) {
            shared.push(key, record);
        } else {
            primary.push(key, record);
        }
    }

    let overview = InstallmentOverview {
        groups: primary.finish(),
        shared: shared.finish(),
    };
    tracing::debug!(
        groups = overview.groups.len(),
        shared = overview.shared.len(),
        "grouped installment parcels"
    );
    overview
}

/// Grouping key of a parcel: its group id, or the legacy composite key when it has none.
pub fn group_key(parcel: &Transaction) -> String {
    if let Some(group_id) = parcel
        .installment_group_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
    {
        return group_id.to_string();
    }
    format!(
        "legacy:{}|{}|{}|{}|{}",
        description_class(&parcel.description),
        parcel.payment_method.as_deref().unwrap_or_default(),
        parcel.category.as_deref().unwrap_or_default(),
        parcel.kind.label(),
        parcel.installments.unwrap_or_default()
    )
}

/// Description with any trailing `(k/n)` parcel marker removed.
fn description_class(description: &str) -> &str {
    let trimmed = description.trim();
    if let Some(open) = trimmed.rfind('(') {
        let marker = &trimmed[open..];
        let is_marker = marker.ends_with(')')
            && marker[1..marker.len() - 1]
                .split_once('/')
                .map_or(false, |(k, n)| is_number(k) && is_number(n));
        if is_marker {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

fn is_number(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

/// Most frequent description among parcels; ties go to the one seen first.
fn canonical_description(parcels: &[Transaction]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for parcel in parcels {
        let description = description_class(&parcel.description);
        match counts.iter_mut().find(|(seen, _)| *seen == description) {
            Some((_, count)) => *count += 1,
            None => counts.push((description, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (description, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((description, count));
        }
    }
    best.map(|(description, _)| description.to_string())
        .unwrap_or_default()
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Insertion-ordered buckets of parcels per key.
#[derive(Default)]
struct Buckets<'a> {
    order: Vec<String>,
    parcels: HashMap<String, Vec<&'a Transaction>>,
}

impl<'a> Buckets<'a> {
    fn push(&mut self, key: String, parcel: &'a Transaction) {
        if !self.parcels.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.parcels.entry(key).or_default().push(parcel);
    }

    fn finish(mut self) -> Vec<InstallmentGroup> {
        let mut groups: Vec<InstallmentGroup> = self
            .order
            .into_iter()
            .filter_map(|key| {
                let parcels = self.parcels.remove(&key)?;
                let owned = parcels.into_iter().cloned().collect();
                Some(InstallmentGroup::from_parcels(key, owned))
            })
            .collect();
        groups.sort_by(|a, b| {
            compare_dates(a.start_date, b.start_date).then_with(|| a.key.cmp(&b.key))
        });
        groups
    }
}
