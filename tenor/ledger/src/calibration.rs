//! Pricing identities of the logit curve that every market follows:
//!
//! ```plain
//! proportion   := fcash / (fcash + cash)
//! exchange     := ln(proportion / (1 - proportion)) / rate_scalar + rate_anchor
//! implied_rate := ln(exchange) * YEAR / time_to_maturity
//! ```
//!
//! All values are in rate precision except cash and fCash, which are in
//! internal token precision.

use {
    tenor_math::{Int128, MathResult, MultiplyRatio, Number, RATE_PRECISION, exp_rate, ln_rate},
    tenor_types::YEAR,
};

/// Exchange rate of a market with the given proportion.
pub fn exchange_rate(
    proportion: Int128,
    rate_anchor: Int128,
    rate_scalar: Int128,
) -> MathResult<Int128> {
    let odds = proportion
        .checked_multiply_ratio_trunc(RATE_PRECISION, RATE_PRECISION.checked_sub(proportion)?)?;

    ln_rate(odds)?
        .checked_div(rate_scalar)?
        .checked_add(rate_anchor)
}

/// Annualized rate that compounds to `exchange_rate` over `time_to_maturity`.
pub fn implied_rate(exchange_rate: Int128, time_to_maturity: u64) -> MathResult<Int128> {
    ln_rate(exchange_rate)?.checked_multiply_ratio_trunc(YEAR, time_to_maturity)
}

/// Inverse of [`implied_rate`].
pub fn exchange_rate_at(rate: Int128, time_to_maturity: u64) -> MathResult<Int128> {
    exp_rate(rate.checked_multiply_ratio_trunc(time_to_maturity, YEAR)?)
}

/// fCash to pair with `cash` so the market sits at `proportion`.
pub fn fcash_for_proportion(cash: Int128, proportion: Int128) -> MathResult<Int128> {
    cash.checked_multiply_ratio_trunc(proportion, RATE_PRECISION.checked_sub(proportion)?)
}

/// fCash to pair with `cash` so that the market prices at `rate`.
pub fn fcash_for_rate(
    cash: Int128,
    rate: Int128,
    rate_anchor: Int128,
    rate_scalar: Int128,
    time_to_maturity: u64,
) -> MathResult<Int128> {
    let exchange = exchange_rate_at(rate, time_to_maturity)?;
    let odds = exp_rate(exchange.checked_sub(rate_anchor)?.checked_mul(rate_scalar)?)?;

    cash.checked_multiply_ratio_trunc(odds, RATE_PRECISION)
}

/// Linear interpolation (or extrapolation) of the rate at `maturity` from two
/// known `(maturity, rate)` points:
///
/// ```plain
/// |(long_rate - short_rate) * (maturity - short_maturity) / (long_maturity - short_maturity) + short_rate|
/// ```
///
/// The division truncates before the short rate is added.
pub fn interpolate_rate(
    (short_maturity, short_rate): (u64, Int128),
    (long_maturity, long_rate): (u64, Int128),
    maturity: u64,
) -> MathResult<Int128> {
    let elapsed = Int128::from(maturity).checked_sub(Int128::from(short_maturity))?;
    let span = Int128::from(long_maturity).checked_sub(Int128::from(short_maturity))?;

    long_rate
        .checked_sub(short_rate)?
        .checked_multiply_ratio_trunc(elapsed, span)?
        .checked_add(short_rate)?
        .checked_abs()
}

/// Present value of `notional` paid in `time_to_maturity` seconds, discounted
/// at the annualized `rate`.
pub fn present_value(notional: Int128, rate: Int128, time_to_maturity: u64) -> MathResult<Int128> {
    let discount = exchange_rate_at(rate, time_to_maturity)?;

    notional.checked_multiply_ratio_trunc(RATE_PRECISION, discount)
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, tenor_types::QUARTER, test_case::test_case};

    fn assert_close(actual: Int128, expect: i128, tolerance: i128) {
        let diff = (actual.into_inner() - expect).abs();
        assert!(
            diff <= tolerance,
            "expected {expect} +/- {tolerance}, got {actual}"
        );
    }

    #[test]
    fn balanced_market_exchanges_at_anchor() {
        let exchange = exchange_rate(
            Int128::new(500_000_000),
            Int128::new(1_020_000_000),
            Int128::new(100),
        )
        .unwrap();

        assert_eq!(exchange, Int128::new(1_020_000_000));

        // ln(1.02) * 4
        assert_close(implied_rate(exchange, QUARTER).unwrap(), 79_210_508, 4);
    }

    #[test]
    fn leveraged_market_exchanges_above_anchor() {
        let exchange = exchange_rate(
            Int128::new(750_000_000),
            Int128::new(1_020_000_000),
            Int128::new(100),
        )
        .unwrap();

        // ln(3) / 100 = 0.010986122
        assert_close(exchange, 1_030_986_122, 1);
    }

    #[test_case(40_000_00000000, 500_000_000, 40_000_00000000 ; "balanced")]
    #[test_case(60_000_00000000, 250_000_000, 20_000_00000000 ; "quarter")]
    #[test_case(100, 333_333_333, 49 ; "truncates")]
    fn fcash_for_proportion_works(cash: i128, proportion: i128, expect: i128) {
        assert_eq!(
            fcash_for_proportion(Int128::new(cash), Int128::new(proportion)).unwrap(),
            Int128::new(expect)
        );
    }

    #[test]
    fn fcash_for_rate_inverts_implied_rate() {
        let cash = Int128::new(40_000_00000000);
        let anchor = Int128::new(1_020_000_000);
        let scalar = Int128::new(100);

        let exchange = exchange_rate(Int128::new(500_000_000), anchor, scalar).unwrap();
        let rate = implied_rate(exchange, QUARTER).unwrap();
        let fcash = fcash_for_rate(cash, rate, anchor, scalar, QUARTER).unwrap();

        // Truncation in ln and exp costs a few parts per million at most.
        assert_close(fcash, cash.into_inner(), cash.into_inner() / 100_000);
    }

    #[test_case((100, 50_000_000), (200, 70_000_000), 250, 80_000_000 ; "extrapolate upwards")]
    #[test_case((100, 50_000_000), (200, 70_000_000), 150, 60_000_000 ; "between points")]
    #[test_case((100, 100_000_000), (200, 20_000_000), 300, 60_000_000 ; "negative result is flipped")]
    #[test_case((0, 10), (3, 20), 1, 13 ; "truncates before adding")]
    fn interpolate_rate_works(short: (u64, i128), long: (u64, i128), maturity: u64, expect: i128) {
        assert_eq!(
            interpolate_rate(
                (short.0, Int128::new(short.1)),
                (long.0, Int128::new(long.1)),
                maturity
            )
            .unwrap(),
            Int128::new(expect)
        );
    }

    #[test]
    fn present_value_discounts() {
        // 100 units in one year at 10%: 100 / e^0.1
        assert_close(
            present_value(Int128::new(100_00000000), Int128::new(100_000_000), YEAR).unwrap(),
            9_048_374_180,
            10,
        );

        assert_eq!(
            present_value(Int128::new(100), Int128::ZERO, YEAR).unwrap(),
            Int128::new(100)
        );
    }
}
