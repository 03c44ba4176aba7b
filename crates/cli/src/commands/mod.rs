//! Command implementations.

pub mod admin;
pub mod inspect;
pub mod liquidate;
pub mod loan;
pub mod pool;

pub use admin::{run_advance, run_faucet, run_init, run_price_set};
pub use inspect::{run_account_show, run_reserve_list, run_reserve_show};
pub use liquidate::run_liquidate;
pub use loan::{run_loan_close, run_loan_list, run_loan_open, run_loan_repay, run_loan_show};
pub use pool::{run_pool_borrow, run_pool_deposit, run_pool_repay, run_pool_withdraw};
