//! Detailed output formatting for single records.

use alloy_primitives::U256;
use bitmor_rs_engine::math::ray_to_f64;
use bitmor_rs_engine::{AccountData, Loan, LoanStatus, Reserve};
use colored::Colorize;

use crate::state::format_amount;

fn format_rate(rate_ray: U256) -> String {
    format!("{:.2}%", ray_to_f64(rate_ray) * 100.0)
}

fn format_usd8(value: U256) -> String {
    format!("${}", format_amount(value, 8))
}

fn format_health_factor(hf: U256) -> String {
    if hf == U256::MAX {
        "inf (no debt)".to_string()
    } else {
        format!("{:.4}", ray_to_f64(hf))
    }
}

pub fn format_loan_detail(loan: &Loan, debt: U256, collateral: U256, stable_decimals: u32, collateral_decimals: u32, clock: u64) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=".repeat(60)));
    output.push_str(&format!("{}\n", format!("Loan {}", loan.vault).bold()));
    output.push_str(&format!("{}\n\n", "=".repeat(60)));

    output.push_str(&format!("{}\n", "Terms".cyan().bold()));
    output.push_str(&format!("  Borrower:    {}\n", loan.borrower));
    output.push_str(&format!(
        "  Deposit:     {}\n",
        format_amount(loan.deposit_amount, stable_decimals)
    ));
    output.push_str(&format!(
        "  Principal:   {}\n",
        format_amount(loan.loan_amount, stable_decimals)
    ));
    output.push_str(&format!(
        "  Collateral:  {}\n",
        format_amount(loan.collateral_amount, collateral_decimals)
    ));
    output.push_str(&format!(
        "  Installment: {}\n",
        format_amount(loan.estimated_monthly_payment, stable_decimals)
    ));
    output.push_str(&format!("  Term:        {} months\n", loan.duration));
    output.push_str(&format!(
        "  Insurance:   {}\n\n",
        if loan.is_insured() {
            format!("policy #{}", loan.insurance_id)
        } else {
            "none".to_string()
        }
    ));

    output.push_str(&format!("{}\n", "Current State".cyan().bold()));
    let status = match loan.status {
        LoanStatus::Active => "Active".green(),
        LoanStatus::Completed => "Completed".blue(),
        LoanStatus::Liquidated => "Liquidated".red(),
    };
    output.push_str(&format!("  Status:           {status}\n"));
    output.push_str(&format!(
        "  Outstanding debt: {}\n",
        format_amount(debt, stable_decimals)
    ));
    output.push_str(&format!(
        "  Vault collateral: {}\n",
        format_amount(collateral, collateral_decimals)
    ));
    if loan.status == LoanStatus::Active {
        if loan.is_overdue(clock) {
            output.push_str(&format!(
                "  Payment:          {}\n",
                format!("{} days overdue", loan.days_past_due(clock)).red()
            ));
        } else {
            output.push_str(&format!(
                "  Payment:          due in {} days\n",
                loan.days_until_due(clock)
            ));
        }
    }
    output
}

pub fn format_account_detail(
    account: alloy_primitives::Address,
    data: &AccountData,
    balances: &[(String, String)],
) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", format!("Account {account}").bold()));
    output.push_str(&format!("{}\n\n", "-".repeat(60)));

    output.push_str(&format!("{}\n", "Wallet".cyan().bold()));
    for (symbol, amount) in balances {
        output.push_str(&format!("  {symbol:<8} {amount}\n"));
    }
    output.push('\n');

    output.push_str(&format!("{}\n", "Position".cyan().bold()));
    output.push_str(&format!(
        "  Collateral value: {}\n",
        format_usd8(data.total_collateral_value)
    ));
    output.push_str(&format!(
        "  Debt value:       {}\n",
        format_usd8(data.total_debt_value)
    ));
    let hf = format_health_factor(data.health_factor);
    let hf = if data.is_unhealthy() {
        hf.red()
    } else {
        hf.green()
    };
    output.push_str(&format!("  Health factor:    {hf}\n"));
    output
}

pub fn format_reserve_detail(reserve: &Reserve, clock: u64) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", format!("Reserve {}", reserve.symbol).bold()));
    output.push_str(&format!("{}\n\n", "-".repeat(60)));

    output.push_str(&format!("{}\n", "Configuration".cyan().bold()));
    output.push_str(&format!("  Asset:          {}\n", reserve.asset));
    output.push_str(&format!("  Decimals:       {}\n", reserve.config.decimals));
    output.push_str(&format!(
        "  LTV:            {:.2}%\n",
        reserve.config.ltv_bps as f64 / 100.0
    ));
    output.push_str(&format!(
        "  Liq. threshold: {:.2}%\n",
        reserve.config.liquidation_threshold_bps as f64 / 100.0
    ));
    output.push_str(&format!(
        "  Liq. bonus:     {:.2}%\n",
        (reserve.config.liquidation_bonus_bps as f64 - 10_000.0) / 100.0
    ));
    output.push_str(&format!(
        "  Borrowing:      {}\n\n",
        if reserve.config.borrowing_enabled {
            "enabled"
        } else {
            "disabled"
        }
    ));

    output.push_str(&format!("{}\n", "State".cyan().bold()));
    output.push_str(&format!(
        "  Available liquidity: {}\n",
        format_amount(reserve.available_liquidity, reserve.config.decimals)
    ));
    if let Ok(debt) = reserve.total_variable_debt(clock) {
        output.push_str(&format!(
            "  Variable debt:       {}\n",
            format_amount(debt, reserve.config.decimals)
        ));
    }
    output.push_str(&format!(
        "  Supply APR:          {}\n",
        format_rate(reserve.current_liquidity_rate)
    ));
    output.push_str(&format!(
        "  Borrow APR:          {}\n",
        format_rate(reserve.current_variable_borrow_rate)
    ));
    output.push_str(&format!(
        "  Liquidity index:     {:.6}\n",
        ray_to_f64(reserve.liquidity_index)
    ));
    output.push_str(&format!(
        "  Borrow index:        {:.6}\n",
        ray_to_f64(reserve.variable_borrow_index)
    ));
    output
}
