use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// The counterparty owes the user.
    OwedToUser,
    /// The user owes the counterparty.
    UserOwes,
}

/// One transaction's contribution to a counterparty balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub transaction_id: String,
    /// Record whose `isPaid` flag decides settlement, when there is one.
    pub settlement_id: Option<String>,
    pub description: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub settled: bool,
}

/// Amounts owed in each direction between the user and one counterparty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Balance {
    pub counterparty: String,
    pub total_owed_to_user: Decimal,
    pub total_user_owes: Decimal,
    pub settled_owed_to_user: Decimal,
    pub settled_user_owes: Decimal,
    pub pending_owed_to_user: Decimal,
    pub pending_user_owes: Decimal,
    /// `pending_owed_to_user - pending_user_owes`; positive means the counterparty owes.
    pub net_balance: Decimal,
    pub entries: Vec<LedgerEntry>,
}

impl Balance {
    fn new(counterparty: &str) -> Self {
        Self {
            counterparty: counterparty.trim().to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, entry: LedgerEntry) {
        match (entry.direction, entry.settled) {
            (Direction::OwedToUser, true) => self.settled_owed_to_user += entry.amount,
            (Direction::OwedToUser, false) => self.pending_owed_to_user += entry.amount,
            (Direction::UserOwes, true) => self.settled_user_owes += entry.amount,
            (Direction::UserOwes, false) => self.pending_user_owes += entry.amount,
        }
        match entry.direction {
            Direction::OwedToUser => self.total_owed_to_user += entry.amount,
            Direction::UserOwes => self.total_user_owes += entry.amount,
        }
        self.net_balance = self.pending_owed_to_user - self.pending_user_owes;
        self.entries.push(entry);
    }

    pub fn is_even(&self) -> bool {
        self.net_balance.is_zero()
    }
}

/// Both directions of `relatedTransactionId` over one snapshot.
///
/// A link written on either record ties the pair together, so a reimbursement income is found
/// even when only the expense points at it.
struct Links<'a> {
    by_id: HashMap<&'a str, &'a Transaction>,
    referenced_by: HashMap<&'a str, Vec<&'a Transaction>>,
}

impl<'a> Links<'a> {
    fn new(records: &'a [Transaction]) -> Self {
        let mut by_id = HashMap::new();
        let mut referenced_by: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for record in records {
            by_id.insert(record.id.as_str(), record);
            if let Some(related) = record.related_transaction_id.as_deref() {
                referenced_by.entry(related).or_default().push(record);
            }
        }
        Self {
            by_id,
            referenced_by,
        }
    }

    /// The live record of `kind` paired with `record`, preferring its own link.
    fn partner(&self, record: &Transaction, kind: TransactionType) -> Option<&'a Transaction> {
        let forward = record
            .related_transaction_id
            .as_deref()
            .and_then(|id| self.by_id.get(id).copied())
            .filter(|other| other.kind == kind);
        forward.or_else(|| {
            self.referenced_by
                .get(record.id.as_str())?
                .iter()
                .copied()
                .find(|other| other.kind == kind)
        })
    }
}

/// What `record` contributes to its counterparty's balance, if anything.
///
/// - An expense the counterparty paid in full (`iOwe`) is owed entirely by the user and settled
///   by its own flag.
/// - An expense the user paid is split in half; settlement comes from the paired reimbursement
///   income, never from the expense itself. Without a live pair the half stays pending.
/// - An income paired with a live expense is that expense's reimbursement and adds nothing. An
///   unpaired shared income is a receivable settled by its own flag.
fn entry_for(record: &Transaction, links: &Links<'_>) -> Option<LedgerEntry> {
    if !record.is_shared || record.shared_with.is_none() {
        return None;
    }

    let entry = |direction, amount, settled, settlement_id: Option<&str>| LedgerEntry {
        transaction_id: record.id.clone(),
        settlement_id: settlement_id.map(str::to_string),
        description: record.description.clone(),
        direction,
        amount,
        settled,
    };

    match record.kind {
        TransactionType::Expense if record.i_owe => Some(entry(
            Direction::UserOwes,
            record.amount,
            record.is_settled(),
            Some(record.id.as_str()),
        )),
        TransactionType::Expense => {
            let half = record.amount / Decimal::TWO;
            match links.partner(record, TransactionType::Income) {
                Some(reimbursement) => Some(entry(
                    Direction::OwedToUser,
                    half,
                    reimbursement.is_settled(),
                    Some(reimbursement.id.as_str()),
                )),
                None => {
                    if record.related_transaction_id.is_some() {
                        tracing::debug!(
                            id = %record.id,
                            related = ?record.related_transaction_id,
                            "orphan link, half stays pending"
                        );
                    }
                    Some(entry(Direction::OwedToUser, half, false, None))
                }
            }
        }
        TransactionType::Income => {
            if links.partner(record, TransactionType::Expense).is_some() {
                return None;
            }
            Some(entry(
                Direction::OwedToUser,
                record.amount,
                record.is_settled(),
                Some(record.id.as_str()),
            ))
        }
    }
}

/// Balance between the user and `counterparty` over the whole snapshot.
pub fn compute_ledger(records: &[Transaction], counterparty: &str) -> Balance {
    let links = Links::new(records);
    let mut balance = Balance::new(counterparty);
    for record in records
        .iter()
        .filter(|record| record.is_shared_with(counterparty))
    {
        if let Some(entry) = entry_for(record, &links) {
            balance.record(entry);
        }
    }
    tracing::debug!(
        counterparty = %balance.counterparty,
        entries = balance.entries.len(),
        net = %balance.net_balance,
        "computed shared ledger"
    );
    balance
}

/// Every counterparty named on a shared record, sorted and deduplicated.
pub fn counterparties(records: &[Transaction]) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.is_shared)
        .filter_map(|record| record.shared_with.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One balance per counterparty, in name order.
pub fn compute_all_ledgers(records: &[Transaction]) -> Vec<Balance> {
    counterparties(records)
        .iter()
        .map(|name| compute_ledger(records, name))
        .collect()
}

/// Pending net over all counterparties in a single pass.
///
/// Equals the sum of `net_balance` over [`compute_all_ledgers`].
pub fn global_pending_net(records: &[Transaction]) -> Decimal {
    let links = Links::new(records);
    records
        .iter()
        .filter(|record| {
            record
                .shared_with
                .as_deref()
                .map_or(false, |name| !name.trim().is_empty())
        })
        .filter_map(|record| entry_for(record, &links))
        .filter(|entry| !entry.settled)
        .map(|entry| match entry.direction {
            Direction::OwedToUser => entry.amount,
            Direction::UserOwes => -entry.amount,
        })
        .sum()
}
