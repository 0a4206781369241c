#![doc(test(attr(deny(warnings))))]

//! Fintrack Core derives what a personal finance tracker displays from a snapshot of stored
//! transactions: recurring occurrences per month, installment purchases, and balances owed
//! between the user and the people they share expenses with.
//!
//! Every engine function is pure. Callers fetch the snapshot, pass it in, and persist whatever
//! records the editing helpers hand back.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod installments;
pub mod recurring;
pub mod shared;
pub mod utils;

pub use domain::{CalendarPeriod, Frequency, Transaction, TransactionType};
pub use errors::{EngineError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Fintrack Core tracing initialized.");
    });
}
