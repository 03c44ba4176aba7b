//! Output formatting.

pub mod detail;
pub mod table;

pub use detail::{format_account_detail, format_loan_detail, format_reserve_detail};
pub use table::{format_loans_table, format_reserves_table};
