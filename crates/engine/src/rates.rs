//! Per-asset interest rate strategies.
//!
//! Each reserve is configured with a two-segment rate curve: below the
//! optimal utilization the variable rate climbs along `slope1`, above it
//! the steeper `slope2` takes over. The liquidity rate is the overall
//! borrow rate weighted by utilization, net of the reserve factor. The
//! calculation is a pure function of the reserve figures; it is re-run
//! after every state-changing pool operation.
//!
//! Parameter presets for the Bitmor market (USDC and cbBTC) live in
//! [`DefaultRateStrategy::usdc`] and [`DefaultRateStrategy::cbbtc`].

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::math::{percent_mul, ray_div, ray_mul, RAY};

/// The three current rates produced by a strategy run, all ray-scaled and
/// annualized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestRates {
    pub liquidity_rate: U256,
    pub variable_borrow_rate: U256,
    pub stable_borrow_rate: U256,
}

/// A pluggable utilization-to-rates mapping.
///
/// One implementation per strategy; reserves hold their strategy by value
/// and resolve it at call time.
pub trait RateModel {
    /// Computes the current rates from post-operation reserve figures.
    ///
    /// `total_liquidity == 0` means zero utilization, never an error.
    fn calculate_interest_rates(
        &self,
        available_liquidity: U256,
        total_stable_debt: U256,
        total_variable_debt: U256,
        avg_stable_rate: U256,
        reserve_factor_bps: u64,
    ) -> InterestRates;
}

/// The standard two-slope rate strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRateStrategy {
    /// Utilization at the kink between the two slopes (ray)
    pub optimal_utilization_rate: U256,
    /// Variable rate at zero utilization (ray)
    pub base_variable_borrow_rate: U256,
    /// Variable rate increase from zero to optimal utilization (ray)
    pub variable_rate_slope1: U256,
    /// Variable rate increase from optimal to full utilization (ray)
    pub variable_rate_slope2: U256,
    /// Stable rate slopes, kept for reserves that enable stable borrowing
    pub stable_rate_slope1: U256,
    pub stable_rate_slope2: U256,
}

impl DefaultRateStrategy {
    /// USDC strategy from the Bitmor market configuration:
    /// optimal 90%, base 5%, slope1 4%, slope2 2%.
    pub fn usdc() -> Self {
        Self {
            optimal_utilization_rate: ray_pct(90),
            base_variable_borrow_rate: ray_pct(5),
            variable_rate_slope1: ray_pct(4),
            variable_rate_slope2: ray_pct(2),
            stable_rate_slope1: U256::ZERO,
            stable_rate_slope2: U256::ZERO,
        }
    }

    /// cbBTC strategy: collateral-only reserve, all rates zero,
    /// optimal utilization 65%.
    pub fn cbbtc() -> Self {
        Self {
            optimal_utilization_rate: ray_pct(65),
            base_variable_borrow_rate: U256::ZERO,
            variable_rate_slope1: U256::ZERO,
            variable_rate_slope2: U256::ZERO,
            stable_rate_slope1: U256::ZERO,
            stable_rate_slope2: U256::ZERO,
        }
    }
}

/// Whole-percent helper for building ray-scaled strategy parameters
fn ray_pct(pct: u64) -> U256 {
    RAY * U256::from(pct) / U256::from(100)
}

impl RateModel for DefaultRateStrategy {
    fn calculate_interest_rates(
        &self,
        available_liquidity: U256,
        total_stable_debt: U256,
        total_variable_debt: U256,
        avg_stable_rate: U256,
        reserve_factor_bps: u64,
    ) -> InterestRates {
        let total_debt = total_stable_debt + total_variable_debt;
        let total_liquidity = available_liquidity + total_debt;

        let utilization = if total_liquidity.is_zero() {
            U256::ZERO
        } else {
            ray_div(total_debt, total_liquidity)
        };

        let variable_borrow_rate = if utilization <= self.optimal_utilization_rate {
            self.base_variable_borrow_rate
                + ray_mul(
                    self.variable_rate_slope1,
                    ray_div(utilization, self.optimal_utilization_rate),
                )
        } else {
            let excess = ray_div(
                utilization - self.optimal_utilization_rate,
                RAY - self.optimal_utilization_rate,
            );
            self.base_variable_borrow_rate
                + self.variable_rate_slope1
                + ray_mul(self.variable_rate_slope2, excess)
        };

        // Stable borrowing follows the same curve shape on its own slopes
        let stable_borrow_rate = if utilization <= self.optimal_utilization_rate {
            ray_mul(
                self.stable_rate_slope1,
                ray_div(utilization, self.optimal_utilization_rate),
            )
        } else {
            let excess = ray_div(
                utilization - self.optimal_utilization_rate,
                RAY - self.optimal_utilization_rate,
            );
            self.stable_rate_slope1 + ray_mul(self.stable_rate_slope2, excess)
        };

        let overall_borrow_rate = overall_borrow_rate(
            total_stable_debt,
            total_variable_debt,
            variable_borrow_rate,
            avg_stable_rate,
        );

        let liquidity_rate = percent_mul(
            ray_mul(overall_borrow_rate, utilization),
            10_000 - reserve_factor_bps,
        );

        InterestRates {
            liquidity_rate,
            variable_borrow_rate,
            stable_borrow_rate,
        }
    }
}

/// Debt-weighted blend of the stable and variable borrow rates
fn overall_borrow_rate(
    total_stable_debt: U256,
    total_variable_debt: U256,
    variable_borrow_rate: U256,
    avg_stable_rate: U256,
) -> U256 {
    let total_debt = total_stable_debt + total_variable_debt;
    if total_debt.is_zero() {
        return U256::ZERO;
    }

    let weighted_variable = ray_mul(total_variable_debt * RAY / total_debt, variable_borrow_rate);
    let weighted_stable = ray_mul(total_stable_debt * RAY / total_debt, avg_stable_rate);

    weighted_variable + weighted_stable
}
