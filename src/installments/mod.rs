//! Installment purchases: regrouping flat parcels and rescheduling them.

pub mod grouper;
pub mod recalculator;

pub use grouper::{
    group_installments, group_installments_with_shared, group_key, InstallmentGroup,
    InstallmentOverview,
};
pub use recalculator::{recalculate_installment_dates, DateReassignment};
