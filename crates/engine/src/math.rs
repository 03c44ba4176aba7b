//! Ray-scaled fixed-point arithmetic.
//!
//! All rate and index arithmetic in the engine is carried out in *ray*
//! precision (27 decimals) with half-up rounding, so cumulative drift is
//! bounded to less than one unit per operation. Percentages (LTV,
//! liquidation threshold, reserve factor) are expressed in basis points
//! and rounded the same way.

use alloy_primitives::U256;

/// One ray (1e27), the unit for rates and indices
pub const RAY: U256 = U256::from_limbs([11_515_845_246_265_065_472, 54_210_108, 0, 0]);

/// Half a ray, used for half-up rounding
pub const HALF_RAY: U256 = U256::from_limbs([5_757_922_623_132_532_736, 27_105_054, 0, 0]);

/// One wad (1e18)
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Basis-point denominator: 100.00%
pub const PERCENTAGE_FACTOR: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Half of the basis-point denominator, used for half-up rounding
pub const HALF_PERCENT: U256 = U256::from_limbs([5_000, 0, 0, 0]);

/// Seconds in a 365-day year, the accrual base for annualized rates
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Seconds in a 30-day billing month
pub const SECONDS_PER_MONTH: u64 = 2_592_000;

/// Multiplies two ray-scaled values, rounding half up.
///
/// `ray_mul(a, b) = (a * b + RAY/2) / RAY`. One operand may be a plain
/// token amount, in which case the result stays in token scale.
pub fn ray_mul(a: U256, b: U256) -> U256 {
    if a.is_zero() || b.is_zero() {
        return U256::ZERO;
    }
    (a * b + HALF_RAY) / RAY
}

/// Divides two ray-scaled values, rounding half up.
///
/// `ray_div(a, b) = (a * RAY + b/2) / b`. Callers guard the divisor; a
/// zero divisor is unreachable from the engine entrypoints and yields 0.
pub fn ray_div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }
    (a * RAY + b / U256::from(2)) / b
}

/// Multiplies a value by a basis-point percentage, rounding half up.
pub fn percent_mul(value: U256, bps: u64) -> U256 {
    if value.is_zero() || bps == 0 {
        return U256::ZERO;
    }
    (value * U256::from(bps) + HALF_PERCENT) / PERCENTAGE_FACTOR
}

/// Divides a value by a basis-point percentage, rounding half up.
pub fn percent_div(value: U256, bps: u64) -> U256 {
    if bps == 0 {
        return U256::ZERO;
    }
    let half_bps = U256::from(bps) / U256::from(2);
    (value * PERCENTAGE_FACTOR + half_bps) / U256::from(bps)
}

/// Ratio between ray and wad precision (1e9)
const WAD_RAY_RATIO: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Converts a wad-scaled (1e18) value to ray scale.
pub fn wad_to_ray(value: U256) -> U256 {
    value * WAD_RAY_RATIO
}

/// Converts a ray-scaled value to wad scale, rounding half up.
pub fn ray_to_wad(value: U256) -> U256 {
    (value + WAD_RAY_RATIO / U256::from(2)) / WAD_RAY_RATIO
}

/// Raises a ray-scaled base to an integer power by binary exponentiation.
pub fn ray_pow(mut base: U256, mut exp: u64) -> U256 {
    let mut result = if exp % 2 == 0 { RAY } else { base };
    exp /= 2;
    while exp != 0 {
        base = ray_mul(base, base);
        if exp % 2 != 0 {
            result = ray_mul(result, base);
        }
        exp /= 2;
    }
    result
}

/// Linear interest factor accrued between two timestamps.
///
/// `1 + rate * dt / SECONDS_PER_YEAR`, in ray. Used for the liquidity
/// index; compounding happens across successive reserve updates.
pub fn calculate_linear_interest(rate: U256, last_update: u64, now: u64) -> U256 {
    let elapsed = U256::from(now.saturating_sub(last_update));
    RAY + rate * elapsed / U256::from(SECONDS_PER_YEAR)
}

/// Compounded interest factor accrued between two timestamps.
///
/// Third-order binomial expansion of `(1 + rate/secs_per_year)^dt`:
///
/// ```text
/// (1+x)^n ~ 1 + n*x + n*(n-1)/2*x^2 + n*(n-1)*(n-2)/6*x^3
/// ```
///
/// The approximation slightly undercharges borrowers at high rates, which
/// errs on the safe side for the pool. Used for the variable borrow index.
pub fn calculate_compounded_interest(rate: U256, last_update: u64, now: u64) -> U256 {
    let exp = now.saturating_sub(last_update);
    if exp == 0 {
        return RAY;
    }

    let exp_minus_one = exp - 1;
    let exp_minus_two = exp.saturating_sub(2);

    let rate_per_second = rate / U256::from(SECONDS_PER_YEAR);
    let base_power_two = ray_mul(rate_per_second, rate_per_second);
    let base_power_three = ray_mul(base_power_two, rate_per_second);

    let exp = U256::from(exp);
    let second_term = exp * U256::from(exp_minus_one) * base_power_two / U256::from(2);
    let third_term =
        exp * U256::from(exp_minus_one) * U256::from(exp_minus_two) * base_power_three
            / U256::from(6);

    RAY + rate_per_second * exp + second_term + third_term
}

/// Returns the smaller of two values
pub fn min(a: U256, b: U256) -> U256 {
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the larger of two values
pub fn max(a: U256, b: U256) -> U256 {
    if a > b {
        a
    } else {
        b
    }
}

/// Converts a ray-scaled value to f64 for display purposes only
pub fn ray_to_f64(value: U256) -> f64 {
    value.saturating_to::<u128>() as f64 / 1e27
}
