use {
    crate::{CurrencyId, MAX_CURRENCIES, MAX_MARKET_INDEX},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    tenor_math::{DEPOSIT_SHARE_PRECISION, Int128, MathError, RATE_PRECISION, checked_sum},
    thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error("max market index must be between 1 and {}, found {found}", MAX_MARKET_INDEX)]
    MarketIndexOutOfRange { found: u8 },

    #[error("`{field}` must have {expected} entries, found {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("deposit shares must sum to {}, found {sum}", DEPOSIT_SHARE_PRECISION)]
    DepositSharesSum { sum: Int128 },

    #[error("`{field}` of market {market_index} is out of range: {value}")]
    OutOfRange {
        field: &'static str,
        market_index: usize,
        value: String,
    },

    #[error("currency id must be between 1 and {}, found {currency_id}", MAX_CURRENCIES)]
    CurrencyIdOutOfRange { currency_id: CurrencyId },

    #[error("currency {currency_id} has no {what}")]
    Missing {
        currency_id: CurrencyId,
        what: &'static str,
    },
}

impl ParamsError {
    fn out_of_range(field: &'static str, position: usize, value: impl ToString) -> Self {
        Self::OutOfRange {
            field,
            market_index: position + 1,
            value: value.to_string(),
        }
    }
}

pub type ParamsResult<T> = core::result::Result<T, ParamsError>;

fn check_length<T>(field: &'static str, values: &[T], max_market_index: u8) -> ParamsResult<()> {
    if values.len() != max_market_index as usize {
        return Err(ParamsError::LengthMismatch {
            field,
            expected: max_market_index as usize,
            actual: values.len(),
        });
    }

    Ok(())
}

/// Risk parameters shared by every market of a currency.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct CashGroup {
    /// Number of markets on the ladder, `1..=9`.
    pub max_market_index: u8,
    /// Averaging window of the oracle rate, in seconds.
    pub rate_oracle_time_window: u64,
    /// Steepness of the pricing curve of each market.
    pub rate_scalars: Vec<Int128>,
    /// Percentage of a liquidity token's claim recognized as collateral.
    pub liquidity_token_haircuts: Vec<u8>,
}

impl CashGroup {
    pub fn validate(&self) -> ParamsResult<()> {
        if self.max_market_index == 0 || self.max_market_index > MAX_MARKET_INDEX {
            return Err(ParamsError::MarketIndexOutOfRange {
                found: self.max_market_index,
            });
        }

        check_length("rate_scalars", &self.rate_scalars, self.max_market_index)?;
        check_length(
            "liquidity_token_haircuts",
            &self.liquidity_token_haircuts,
            self.max_market_index,
        )?;

        for (i, scalar) in self.rate_scalars.iter().enumerate() {
            if !scalar.is_positive() {
                return Err(ParamsError::out_of_range("rate_scalars", i, scalar));
            }
        }

        for (i, haircut) in self.liquidity_token_haircuts.iter().enumerate() {
            if *haircut > 100 {
                return Err(ParamsError::out_of_range("liquidity_token_haircuts", i, haircut));
            }
        }

        Ok(())
    }

    /// Rate scalar of the 1-based `market_index`.
    pub fn rate_scalar(&self, market_index: u8) -> Option<Int128> {
        let position = (market_index as usize).checked_sub(1)?;
        self.rate_scalars.get(position).copied()
    }
}

/// How the perpetual token spreads its cash over the ladder.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct DepositParameters {
    /// Fraction of incoming cash routed to each market, in deposit share
    /// precision. Sums to exactly [`DEPOSIT_SHARE_PRECISION`].
    pub deposit_shares: Vec<Int128>,
    /// Ceiling on each market's proportion, in rate precision.
    pub leverage_thresholds: Vec<Int128>,
}

impl DepositParameters {
    pub fn validate(&self, max_market_index: u8) -> ParamsResult<()> {
        check_length("deposit_shares", &self.deposit_shares, max_market_index)?;
        check_length("leverage_thresholds", &self.leverage_thresholds, max_market_index)?;

        for (i, share) in self.deposit_shares.iter().enumerate() {
            if !share.is_positive() {
                return Err(ParamsError::out_of_range("deposit_shares", i, share));
            }
        }

        let sum = checked_sum(self.deposit_shares.iter().copied())?;
        if sum != DEPOSIT_SHARE_PRECISION {
            return Err(ParamsError::DepositSharesSum { sum });
        }

        for (i, threshold) in self.leverage_thresholds.iter().enumerate() {
            if !threshold.is_positive() || *threshold >= RATE_PRECISION {
                return Err(ParamsError::out_of_range("leverage_thresholds", i, threshold));
            }
        }

        Ok(())
    }
}

/// Calibration targets used when a market has no previous rate to
/// interpolate from.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct InitializationParameters {
    /// Exchange rate at the middle of each market's pricing curve, in rate
    /// precision. Always above one.
    pub rate_anchors: Vec<Int128>,
    /// Target `fcash / (fcash + cash)` of each market, in rate precision.
    pub proportions: Vec<Int128>,
}

impl InitializationParameters {
    pub fn validate(&self, max_market_index: u8) -> ParamsResult<()> {
        check_length("rate_anchors", &self.rate_anchors, max_market_index)?;
        check_length("proportions", &self.proportions, max_market_index)?;

        for (i, anchor) in self.rate_anchors.iter().enumerate() {
            if *anchor <= RATE_PRECISION {
                return Err(ParamsError::out_of_range("rate_anchors", i, anchor));
            }
        }

        for (i, proportion) in self.proportions.iter().enumerate() {
            if !proportion.is_positive() || *proportion >= RATE_PRECISION {
                return Err(ParamsError::out_of_range("proportions", i, proportion));
            }
        }

        Ok(())
    }
}

// ----------------------------------- tests -----------------------------------
