//! Record shapes read from the transaction store and the calendar helpers around them.

pub mod common;
pub mod transaction;

pub use common::{days_in_month, format_date, parse_date, CalendarPeriod};
pub use transaction::{Frequency, Transaction, TransactionType};
