use crate::{Int128, MathError, MathResult};

/// Checked arithmetic on [`Int128`].
///
/// Division truncates toward zero, which is the rounding mode every ledger
/// calculation relies on.
pub trait Number: Sized {
    fn checked_add(self, other: Self) -> MathResult<Self>;

    fn checked_sub(self, other: Self) -> MathResult<Self>;

    fn checked_mul(self, other: Self) -> MathResult<Self>;

    fn checked_div(self, other: Self) -> MathResult<Self>;

    fn checked_neg(self) -> MathResult<Self>;

    fn checked_abs(self) -> MathResult<Self>;
}

impl Number for Int128 {
    fn checked_add(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_add(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_add(self, other))
    }

    fn checked_sub(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_sub(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_sub(self, other))
    }

    fn checked_mul(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_mul(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_mul(self, other))
    }

    fn checked_div(self, other: Self) -> MathResult<Self> {
        if other.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        // `i128::MIN / -1` is the only other failure mode.
        self.into_inner()
            .checked_div(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_neg(self))
    }

    fn checked_neg(self) -> MathResult<Self> {
        self.into_inner()
            .checked_neg()
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_neg(self))
    }

    fn checked_abs(self) -> MathResult<Self> {
        self.into_inner()
            .checked_abs()
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_neg(self))
    }
}

/// Sums an iterator of numbers, failing on the first overflow.
pub fn checked_sum<I>(iter: I) -> MathResult<Int128>
where
    I: IntoIterator<Item = Int128>,
{
    iter.into_iter()
        .try_fold(Int128::ZERO, |acc, value| acc.checked_add(value))
}

// ----------------------------------- tests -----------------------------------
