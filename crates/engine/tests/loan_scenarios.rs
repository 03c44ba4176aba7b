//! End-to-end lifecycle tests driven through the public API only.

use alloy_primitives::{Address, U256};
use bitmor_rs_engine::{
    DefaultRateStrategy, ErrorKind, LiquidationType, LoanRequest, LoanStatus, OraclePricedVenue,
    Protocol, ProtocolError, ReserveConfig, SECONDS_PER_MONTH,
};

const USDC: Address = Address::repeat_byte(0xA1);
const CBBTC: Address = Address::repeat_byte(0xB1);

const USDC_PRICE: u64 = 100_000_000; // $1
const BTC_PRICE: u64 = 60_000_00000000; // $60k

const START: u64 = 1_700_000_000;

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

fn usdc(amount: u64) -> U256 {
    U256::from(amount) * U256::from(1_000_000u64)
}

fn setup_protocol() -> Protocol {
    let mut protocol = Protocol::new();
    protocol.init_reserve(
        USDC,
        "USDC",
        ReserveConfig::usdc(),
        DefaultRateStrategy::usdc(),
        START,
    );
    protocol.init_reserve(
        CBBTC,
        "cbBTC",
        ReserveConfig::cbbtc(),
        DefaultRateStrategy::cbbtc(),
        START,
    );
    protocol.oracle.set_price(USDC, U256::from(USDC_PRICE));
    protocol.oracle.set_price(CBBTC, U256::from(BTC_PRICE));

    // 1M USDC of supplier liquidity
    let lp = addr(9);
    fund(&mut protocol, USDC, lp, usdc(1_000_000));
    protocol
        .deposit(USDC, usdc(1_000_000), lp, lp, START)
        .unwrap();
    protocol
}

fn fund(protocol: &mut Protocol, asset: Address, account: Address, amount: U256) {
    protocol.ledger.mint(asset, account, amount);
    protocol
        .ledger
        .approve(asset, account, protocol.pool_account, amount);
}

fn venue() -> OraclePricedVenue {
    OraclePricedVenue::new(10)
        .with_asset(USDC, U256::from(USDC_PRICE), 6)
        .with_asset(CBBTC, U256::from(BTC_PRICE), 8)
}

/// 40k USDC down on 1 cbBTC over 12 months
fn open_loan(protocol: &mut Protocol, insurance_id: u64) -> Address {
    let borrower = addr(1);
    fund(protocol, USDC, borrower, usdc(40_000));
    protocol
        .initialize_loan(
            &LoanRequest {
                borrower,
                stable_asset: USDC,
                collateral_asset: CBBTC,
                deposit_amount: usdc(40_000),
                collateral_amount: U256::from(100_000_000u64),
                duration: 12,
                insurance_id,
            },
            &venue(),
            START,
        )
        .unwrap()
}

#[test]
fn scenario_reference_loan_amortizes_to_completion() {
    let mut protocol = setup_protocol();
    let vault = open_loan(&mut protocol, 0);
    let borrower = addr(1);
    let installment = protocol.loans[&vault].estimated_monthly_payment;

    // Eleven scheduled installments
    for month in 1..=11u64 {
        let ts = START + month * SECONDS_PER_MONTH;
        fund(&mut protocol, USDC, borrower, installment);
        protocol.repay_loan(vault, installment, ts).unwrap();
        assert_eq!(protocol.loans[&vault].status, LoanStatus::Active);
    }

    // The residual at month twelve is a final-installment-sized payoff
    let ts = START + 12 * SECONDS_PER_MONTH;
    let residual = protocol.debt_of(vault, USDC, ts).unwrap();
    assert!(residual > U256::ZERO);
    assert!(residual < installment * U256::from(2u64));

    fund(&mut protocol, USDC, borrower, residual);
    protocol.repay_loan(vault, residual, ts).unwrap();

    assert_eq!(protocol.loans[&vault].status, LoanStatus::Completed);
    assert_eq!(protocol.debt_of(vault, USDC, ts).unwrap(), U256::ZERO);
    // All purchased collateral back in the borrower's wallet
    assert_eq!(
        protocol.ledger.balance_of(CBBTC, borrower),
        protocol.loans[&vault].collateral_amount
    );
}

#[test]
fn scenario_uninsured_crash_is_fully_liquidated() {
    let mut protocol = setup_protocol();
    let vault = open_loan(&mut protocol, 0);

    // Healthy at $60k
    assert_eq!(
        protocol.classify(vault, START).unwrap(),
        LiquidationType::None
    );

    // BTC drops to $20k: 20k debt against 20k * 0.9479 of collateral power
    protocol
        .oracle
        .set_price(CBBTC, U256::from(20_000_00000000u64));
    assert_eq!(
        protocol.classify(vault, START).unwrap(),
        LiquidationType::Full
    );

    let debt = protocol.debt_of(vault, USDC, START).unwrap();
    let liquidator = addr(5);
    fund(&mut protocol, USDC, liquidator, debt);

    let outcome = protocol
        .liquidation_call(CBBTC, USDC, vault, debt, liquidator, START)
        .unwrap();
    assert_eq!(outcome.liquidation_type, LiquidationType::Full);
    assert_eq!(outcome.debt_covered, debt);

    // Bonus-weighted seizure: 20k of debt at $20k/BTC plus 5% exceeds the
    // vault's holdings, so the clamp hands over everything
    let held = protocol.loans[&vault].collateral_amount;
    assert_eq!(outcome.collateral_seized, held);
    assert_eq!(protocol.ledger.balance_of(CBBTC, liquidator), held);
    assert_eq!(protocol.loans[&vault].status, LoanStatus::Liquidated);
}

#[test]
fn scenario_insured_crash_is_shielded() {
    let mut protocol = setup_protocol();
    let vault = open_loan(&mut protocol, 42);

    protocol
        .oracle
        .set_price(CBBTC, U256::from(20_000_00000000u64));
    assert_eq!(
        protocol.classify(vault, START).unwrap(),
        LiquidationType::Micro
    );

    let debt = protocol.debt_of(vault, USDC, START).unwrap();
    let liquidator = addr(5);
    fund(&mut protocol, USDC, liquidator, debt);

    // Full coverage is suppressed outright
    let err = protocol
        .liquidation_call(CBBTC, USDC, vault, debt, liquidator, START)
        .unwrap_err();
    assert!(matches!(err, ProtocolError::InsuredPositionProtected { .. }));

    // A 5% slice goes through, with the receipt parked in escrow
    let slice = debt * U256::from(500u64) / U256::from(10_000u64);
    let outcome = protocol
        .liquidation_call(CBBTC, USDC, vault, slice, liquidator, START)
        .unwrap();
    assert_eq!(outcome.liquidation_type, LiquidationType::Micro);
    assert_eq!(protocol.ledger.balance_of(CBBTC, liquidator), U256::ZERO);
    assert_eq!(protocol.escrow.entries_for(vault).count(), 1);
    assert_eq!(protocol.loans[&vault].status, LoanStatus::Active);
}

#[test]
fn scenario_flash_close_pays_suppliers() {
    let mut protocol = setup_protocol();
    let vault = open_loan(&mut protocol, 0);
    let borrower = addr(1);
    let lp = addr(9);

    // Three months of accrual, then an early close paid out in BTC
    let ts = START + 3 * SECONDS_PER_MONTH;
    protocol.close_loan(vault, true, &venue(), ts).unwrap();

    assert_eq!(protocol.loans[&vault].status, LoanStatus::Completed);
    let payout = protocol.ledger.balance_of(CBBTC, borrower);
    assert!(payout > U256::from(50_000_000u64));
    assert!(payout < U256::from(100_000_000u64));

    // Borrow interest plus the flash premium accrued to the supplier
    let lp_balance = protocol.collateral_of(lp, USDC, ts).unwrap();
    assert!(lp_balance > usdc(1_000_000));
    let withdrawn = protocol
        .withdraw(USDC, lp_balance, lp, lp, ts)
        .unwrap();
    assert_eq!(protocol.ledger.balance_of(USDC, lp), withdrawn);
}

#[test]
fn scenario_failed_close_is_invisible() {
    let mut protocol = setup_protocol();
    let vault = open_loan(&mut protocol, 0);

    let hostile_venue = OraclePricedVenue::new(800)
        .with_asset(USDC, U256::from(USDC_PRICE), 6)
        .with_asset(CBBTC, U256::from(BTC_PRICE), 8);

    let snapshot = serde_json::to_string(&protocol).unwrap();
    let ts = START + SECONDS_PER_MONTH;
    let err = protocol
        .close_loan(vault, true, &hostile_venue, ts)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
    assert_eq!(serde_json::to_string(&protocol).unwrap(), snapshot);

    // The loan is still serviceable afterwards
    let borrower = addr(1);
    let installment = protocol.loans[&vault].estimated_monthly_payment;
    fund(&mut protocol, USDC, borrower, installment);
    protocol.repay_loan(vault, installment, ts).unwrap();
}

#[test]
fn scenario_interest_accrues_over_a_year() {
    let mut protocol = setup_protocol();

    // A plain pool borrower, no loan product involved
    let whale = addr(7);
    fund(&mut protocol, CBBTC, whale, U256::from(1_000_000_000u64));
    protocol
        .deposit(CBBTC, U256::from(1_000_000_000u64), whale, whale, START)
        .unwrap();
    protocol
        .borrow(USDC, usdc(200_000), whale, whale, START)
        .unwrap();

    let year_later = START + 365 * 86_400;
    let debt = protocol.debt_of(whale, USDC, year_later).unwrap();

    // Two-slope curve at 20% utilization: a handful of percent, compounded
    assert!(debt > usdc(200_000) * U256::from(104u64) / U256::from(100u64));
    assert!(debt < usdc(200_000) * U256::from(110u64) / U256::from(100u64));

    // Suppliers earned their share of it
    let lp = addr(9);
    let lp_balance = protocol.collateral_of(lp, USDC, year_later).unwrap();
    assert!(lp_balance > usdc(1_000_000));
}
