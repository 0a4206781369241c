use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::common::{format_date, parse_date};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

/// Step of a recurring series. Only fixed monthly and yearly cadences exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Monthly,
    Yearly,
}

/// A persisted transaction record as the store hands it over.
///
/// Field names serialize in the store's camelCase shape. The date stays a raw string so a single
/// malformed record can be skipped instead of failing the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub excluded_dates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_installment: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_group_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_shared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<String>,
    #[serde(default, rename = "iOwe", deserialize_with = "null_as_default")]
    pub i_owe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row stores send `null` for unset columns; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        amount: Decimal,
        kind: TransactionType,
    ) -> Self {
        Self {
            id: id.into(),
            date: format_date(date),
            amount,
            kind,
            description: String::new(),
            category: None,
            payment_method: None,
            is_recurring: false,
            frequency: None,
            excluded_dates: Vec::new(),
            recurring_group_id: None,
            installments: None,
            current_installment: None,
            installment_group_id: None,
            is_shared: false,
            shared_with: None,
            i_owe: false,
            related_transaction_id: None,
            is_paid: None,
            created_at: None,
        }
    }

    pub fn expense(id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self::new(id, date, amount, TransactionType::Expense)
    }

    pub fn income(id: impl Into<String>, date: NaiveDate, amount: Decimal) -> Self {
        Self::new(id, date, amount, TransactionType::Income)
    }

    /// Fresh opaque identifier for records the engine proposes to the store.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn recurring(mut self, frequency: Frequency) -> Self {
        self.is_recurring = true;
        self.frequency = Some(frequency);
        self
    }

    pub fn excluding(mut self, date: NaiveDate) -> Self {
        self.add_excluded_date(date);
        self
    }

    pub fn exception_of(mut self, template_id: impl Into<String>) -> Self {
        self.recurring_group_id = Some(template_id.into());
        self
    }

    pub fn installment(mut self, current: u32, total: u32) -> Self {
        self.current_installment = Some(current);
        self.installments = Some(total);
        self
    }

    pub fn in_installment_group(mut self, group_id: impl Into<String>) -> Self {
        self.installment_group_id = Some(group_id.into());
        self
    }

    pub fn shared_with(mut self, counterparty: impl Into<String>, i_owe: bool) -> Self {
        self.is_shared = true;
        self.shared_with = Some(counterparty.into());
        self.i_owe = i_owe;
        self
    }

    pub fn linked_to(mut self, related_id: impl Into<String>) -> Self {
        self.related_transaction_id = Some(related_id.into());
        self
    }

    pub fn paid(mut self, paid: bool) -> Self {
        self.is_paid = Some(paid);
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = format_date(date);
    }

    /// Whether this record drives a recurring series.
    ///
    /// Installment parcels never do, even when flagged recurring.
    pub fn is_series_template(&self) -> bool {
        self.is_recurring && self.installments.map_or(true, |count| count <= 1)
    }

    pub fn frequency_or_default(&self) -> Frequency {
        self.frequency.unwrap_or_default()
    }

    /// A stored one-off edit of a single occurrence of `template_id`.
    pub fn is_exception_of(&self, template_id: &str) -> bool {
        !self.is_recurring && self.recurring_group_id.as_deref() == Some(template_id)
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.excluded_dates
            .iter()
            .filter_map(|raw| parse_date(raw))
            .any(|excluded| excluded == date)
    }

    /// Adds `date` to the exclusion list, returning whether it was newly added.
    pub fn add_excluded_date(&mut self, date: NaiveDate) -> bool {
        if self.is_excluded(date) {
            return false;
        }
        self.excluded_dates.push(format_date(date));
        self.excluded_dates.sort();
        true
    }

    pub fn is_installment_parcel(&self) -> bool {
        self.installments.map_or(false, |count| count > 1)
    }

    /// Explicitly settled.
    pub fn is_settled(&self) -> bool {
        self.is_paid == Some(true)
    }

    /// Counts as paid unless explicitly marked unpaid.
    pub fn counts_as_paid(&self) -> bool {
        self.is_paid != Some(false)
    }

    pub fn is_shared_with(&self, counterparty: &str) -> bool {
        self.is_shared
            && self
                .shared_with
                .as_deref()
                .map_or(false, |name| name.trim() == counterparty.trim())
    }
}
