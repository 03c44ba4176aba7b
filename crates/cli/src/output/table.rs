//! Table formatting for reserve and loan lists.

use bitmor_rs_engine::math::ray_to_f64;
use bitmor_rs_engine::{Loan, LoanStatus, Reserve};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::state::format_amount;

#[derive(Tabled)]
struct ReserveRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Supply APR")]
    supply_apr: String,
    #[tabled(rename = "Borrow APR")]
    borrow_apr: String,
    #[tabled(rename = "LTV")]
    ltv: String,
    #[tabled(rename = "Liq. Threshold")]
    threshold: String,
}

#[derive(Tabled)]
struct LoanRow {
    #[tabled(rename = "Vault")]
    vault: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Principal")]
    principal: String,
    #[tabled(rename = "Installment")]
    installment: String,
    #[tabled(rename = "Months")]
    months: String,
    #[tabled(rename = "Insured")]
    insured: String,
}

fn truncate_address(addr: &str) -> String {
    if addr.len() > 10 {
        format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

fn format_rate(rate_ray: alloy_primitives::U256) -> String {
    format!("{:.2}%", ray_to_f64(rate_ray) * 100.0)
}

fn format_bps(bps: u64) -> String {
    format!("{:.2}%", bps as f64 / 100.0)
}

pub fn format_reserves_table(reserves: &[&Reserve]) -> String {
    if reserves.is_empty() {
        return "No reserves initialized.".to_string();
    }

    let rows: Vec<ReserveRow> = reserves
        .iter()
        .map(|r| ReserveRow {
            symbol: r.symbol.clone(),
            address: truncate_address(&format!("{}", r.asset)),
            available: format_amount(r.available_liquidity, r.config.decimals),
            supply_apr: format_rate(r.current_liquidity_rate),
            borrow_apr: format_rate(r.current_variable_borrow_rate),
            ltv: format_bps(r.config.ltv_bps),
            threshold: format_bps(r.config.liquidation_threshold_bps),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()))
        .to_string()
}

pub fn format_loans_table(loans: &[&Loan], stable_decimals: u32) -> String {
    if loans.is_empty() {
        return "No loans found.".to_string();
    }

    let rows: Vec<LoanRow> = loans
        .iter()
        .map(|l| LoanRow {
            vault: truncate_address(&format!("{}", l.vault)),
            status: match l.status {
                LoanStatus::Active => "Active".to_string(),
                LoanStatus::Completed => "Completed".to_string(),
                LoanStatus::Liquidated => "Liquidated".to_string(),
            },
            principal: format_amount(l.loan_amount, stable_decimals),
            installment: format_amount(l.estimated_monthly_payment, stable_decimals),
            months: l.duration.to_string(),
            insured: if l.is_insured() { "Yes" } else { "No" }.to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()))
        .to_string()
}
