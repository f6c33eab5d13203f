use crate::{
    Int128, MathError, MathResult, Number, RATE_PRECISION,
    constants::{LN_2_WAD, WAD},
};

/// Largest exponent at WAD scale whose result still fits in an `i128`.
/// `e^46 * 1e18 ≈ 9.5e37 < i128::MAX`.
const MAX_EXP_WAD: i128 = 46 * WAD;

/// Below this, `e^x * 1e18` truncates to zero.
const MIN_EXP_WAD: i128 = -42 * WAD;

/// Natural logarithm of a [`RATE_PRECISION`]-scaled number, returned at the
/// same scale and truncated toward zero.
///
/// ```plain
/// ln_rate(1.01e9) = 9950330   // ln(1.01) = 0.009950330853...
/// ```
pub fn ln_rate(x: Int128) -> MathResult<Int128> {
    if !x.is_positive() {
        return Err(MathError::non_positive_log(x));
    }

    let wad = x.checked_mul(RATE_PRECISION)?.into_inner();
    let ln = ln_wad(wad)?;

    Ok(Int128::new(ln / RATE_PRECISION.into_inner()))
}

/// Exponential of a [`RATE_PRECISION`]-scaled number, returned at the same
/// scale and truncated toward zero.
pub fn exp_rate(x: Int128) -> MathResult<Int128> {
    let wad = x.checked_mul(RATE_PRECISION)?.into_inner();
    let exp = exp_wad(wad)?;

    Ok(Int128::new(exp / RATE_PRECISION.into_inner()))
}

/// Normalizes `x = m * 2^k` with `m` in `[1, 2)`, then sums the series
/// `ln(m) = 2 * (z + z^3/3 + z^5/5 + ...)` where `z = (m - 1) / (m + 1) <= 1/3`.
fn ln_wad(x: i128) -> MathResult<i128> {
    if x <= 0 {
        return Err(MathError::non_positive_log(x));
    }

    let mut m = x;
    let mut k: i128 = 0;

    while m >= 2 * WAD {
        m >>= 1;
        k += 1;
    }

    while m < WAD {
        m <<= 1;
        k -= 1;
    }

    let z = (m - WAD) * WAD / (m + WAD);
    let z_squared = z * z / WAD;

    let mut term = z;
    let mut sum = 0;
    let mut n = 1;

    while term != 0 {
        sum += term / n;
        term = term * z_squared / WAD;
        n += 2;
    }

    Ok(2 * sum + k * LN_2_WAD)
}

/// Reduces `x = k * ln(2) + r` with `|r| < ln(2)`, sums the Taylor series of
/// `e^r`, then scales by `2^k`.
fn exp_wad(x: i128) -> MathResult<i128> {
    if x > MAX_EXP_WAD {
        return Err(MathError::overflow_exp(x));
    }

    if x < MIN_EXP_WAD {
        return Ok(0);
    }

    let k = x / LN_2_WAD;
    let r = x - k * LN_2_WAD;

    let mut term = WAD;
    let mut sum = WAD;
    let mut n = 1;

    loop {
        term = term * r / WAD / n;
        if term == 0 {
            break;
        }
        sum += term;
        n += 1;
    }

    if k >= 0 {
        sum.checked_mul(1 << k)
            .ok_or_else(|| MathError::overflow_exp(x))
    } else {
        Ok(sum >> -k)
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, proptest::prelude::*, test_case::test_case};

    #[test_case(1_000_000_000, 0 ; "ln of one")]
    #[test_case(2_000_000_000, 693_147_180 ; "ln of two")]
    #[test_case(500_000_000, -693_147_180 ; "ln of half truncates toward zero")]
    #[test_case(1_010_000_000, 9_950_330 ; "ln of rate anchor")]
    #[test_case(2_718_281_828, 999_999_999 ; "ln of e truncated")]
    fn ln_rate_works(x: i128, expect: i128) {
        assert_eq!(ln_rate(Int128::new(x)).unwrap(), Int128::new(expect));
    }

    #[test_case(0, 1_000_000_000 ; "exp of zero")]
    #[test_case(1_000_000_000, 2_718_281_828 ; "exp of one")]
    #[test_case(-1_000_000_000, 367_879_441 ; "exp of minus one")]
    #[test_case(693_147_181, 2_000_000_000 ; "exp of ln two")]
    fn exp_rate_works(x: i128, expect: i128) {
        assert_eq!(exp_rate(Int128::new(x)).unwrap(), Int128::new(expect));
    }

    #[test]
    fn ln_of_non_positive_fails() {
        assert!(matches!(
            ln_rate(Int128::ZERO),
            Err(MathError::NonPositiveLog { .. })
        ));
        assert!(matches!(
            ln_rate(Int128::new(-5)),
            Err(MathError::NonPositiveLog { .. })
        ));
    }

    #[test]
    fn exp_bounds() {
        assert!(matches!(
            exp_rate(Int128::new(50 * 1_000_000_000)),
            Err(MathError::OverflowExp { .. })
        ));
        assert_eq!(
            exp_rate(Int128::new(-50 * 1_000_000_000)).unwrap(),
            Int128::ZERO
        );
    }

    proptest! {
        /// `exp(ln(x))` recovers `x` up to the truncation of `ln` to nine
        /// digits, which is a relative error below `1e-8`.
        #[test]
        fn exp_inverts_ln(x in 100_000_000i128..100_000_000_000) {
            let ln = ln_rate(Int128::new(x)).unwrap();
            let back = exp_rate(ln).unwrap().into_inner();
            prop_assert!((back - x).abs() <= x / 100_000_000 + 2);
        }
    }
}
