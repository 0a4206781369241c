//! Shared expenses: balances owed between the user and each counterparty.

pub mod ledger;

pub use ledger::{
    compute_all_ledgers, compute_ledger, counterparties, global_pending_net, Balance, Direction,
    LedgerEntry,
};
