use {
    crate::{Int128, MathError, MathResult},
    bnum::types::I256,
};

/// Describes operations where a number is multiplied by a numerator then
/// immediately divided by a denominator.
///
/// The product is computed in 256 bits, so `a * b / c` only fails if the final
/// quotient does not fit in 128 bits.
pub trait MultiplyRatio: Sized {
    /// `self * numerator / denominator`, truncated toward zero.
    fn checked_multiply_ratio_trunc<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>;
}

impl MultiplyRatio for Int128 {
    fn checked_multiply_ratio_trunc<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>,
    {
        let numerator = numerator.into();
        let denominator = denominator.into();

        if denominator.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        if self.is_zero() || numerator.is_zero() {
            return Ok(Self::ZERO);
        }

        let product = I256::from(self.into_inner())
            .checked_mul(I256::from(numerator.into_inner()))
            .ok_or_else(|| MathError::overflow_mul(self, numerator))?;

        // Signed division on `I256` truncates toward zero, same as `i128`.
        let quotient = product
            .checked_div(I256::from(denominator.into_inner()))
            .ok_or_else(|| MathError::division_by_zero(self))?;

        i128::try_from(quotient)
            .map(Self::new)
            .map_err(|_| MathError::overflow_conversion::<_, Int128>(quotient))
    }
}

// ----------------------------------- tests -----------------------------------
