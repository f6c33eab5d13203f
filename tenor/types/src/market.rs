use {
    crate::CurrencyId,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    tenor_math::{Int128, MathError, MathResult, MultiplyRatio, Number, RATE_PRECISION},
};

/// Storage key of a market.
///
/// The same maturity can appear in several ladders (a 1-year market becomes
/// the 6-month slot three quarters later), so the settlement date of the
/// ladder that created the market is part of the key.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct MarketKey {
    pub currency_id: CurrencyId,
    pub settlement_date: u64,
    pub maturity: u64,
}

/// State of one maturity bucket of a currency's ladder.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct Market {
    pub currency_id: CurrencyId,
    pub maturity: u64,
    /// Quarter boundary of the ladder this market belongs to.
    pub settlement_date: u64,
    /// fCash held by the market. Never negative.
    pub total_fcash: Int128,
    pub total_cash: Int128,
    /// Liquidity tokens outstanding against this market.
    pub total_liquidity: Int128,
    /// Implied rate of the most recent trade, or of the calibration.
    pub last_implied_rate: Int128,
    /// Time-weighted average of the implied rate.
    pub oracle_rate: Int128,
    pub previous_trade_time: u64,
}

impl Market {
    /// A freshly calibrated market. Liquidity tokens are issued one to one
    /// against the cash deposited.
    pub fn new(
        key: MarketKey,
        cash: Int128,
        fcash: Int128,
        implied_rate: Int128,
        now: u64,
    ) -> Self {
        Self {
            currency_id: key.currency_id,
            maturity: key.maturity,
            settlement_date: key.settlement_date,
            total_fcash: fcash,
            total_cash: cash,
            total_liquidity: cash,
            last_implied_rate: implied_rate,
            oracle_rate: implied_rate,
            previous_trade_time: now,
        }
    }

    pub fn key(&self) -> MarketKey {
        MarketKey {
            currency_id: self.currency_id,
            settlement_date: self.settlement_date,
            maturity: self.maturity,
        }
    }

    /// `fcash / (fcash + cash)` in rate precision. Zero for an empty market.
    pub fn proportion(&self) -> MathResult<Int128> {
        let total = self.total_fcash.checked_add(self.total_cash)?;

        if total.is_zero() {
            return Ok(Int128::ZERO);
        }

        self.total_fcash
            .checked_multiply_ratio_trunc(RATE_PRECISION, total)
    }

    /// Immutably adds `cash` to the market at its current proportion.
    ///
    /// Returns the new market state, the liquidity tokens minted and the fCash
    /// the market absorbed. The depositor owes that fCash.
    pub fn add_liquidity(self, cash: Int128) -> MathResult<(Self, Int128, Int128)> {
        let tokens = self
            .total_liquidity
            .checked_multiply_ratio_trunc(cash, self.total_cash)?;
        let fcash = self
            .total_fcash
            .checked_multiply_ratio_trunc(cash, self.total_cash)?;

        let market = Self {
            total_fcash: self.total_fcash.checked_add(fcash)?,
            total_cash: self.total_cash.checked_add(cash)?,
            total_liquidity: self.total_liquidity.checked_add(tokens)?,
            ..self
        };

        Ok((market, tokens, fcash))
    }

    /// Immutably burns `tokens` liquidity tokens.
    ///
    /// Returns the new market state and the holder's pro-rata claim on cash and
    /// fCash. Burning every outstanding token drains the market exactly.
    pub fn remove_liquidity(self, tokens: Int128) -> MathResult<(Self, Int128, Int128)> {
        if tokens > self.total_liquidity {
            return Err(MathError::overflow_sub(self.total_liquidity, tokens));
        }

        let cash = self
            .total_cash
            .checked_multiply_ratio_trunc(tokens, self.total_liquidity)?;
        let fcash = self
            .total_fcash
            .checked_multiply_ratio_trunc(tokens, self.total_liquidity)?;

        let market = Self {
            total_fcash: self.total_fcash.checked_sub(fcash)?,
            total_cash: self.total_cash.checked_sub(cash)?,
            total_liquidity: self.total_liquidity.checked_sub(tokens)?,
            ..self
        };

        Ok((market, cash, fcash))
    }

    /// Immutably moves the given amounts out of the market (negative amounts
    /// move into it).
    pub fn apply_trade(self, fcash_to_account: Int128, cash_to_account: Int128) -> MathResult<Self> {
        Ok(Self {
            total_fcash: self.total_fcash.checked_sub(fcash_to_account)?,
            total_cash: self.total_cash.checked_sub(cash_to_account)?,
            ..self
        })
    }

    /// Immutably records a trade at `implied_rate`, updating the oracle rate
    /// as a time-weighted average over `time_window` seconds:
    ///
    /// ```plain
    /// dt >= window : oracle := last_implied
    /// otherwise    : oracle := last_implied * dt / window + oracle * (window - dt) / window
    /// ```
    pub fn record_trade(self, implied_rate: Int128, now: u64, time_window: u64) -> MathResult<Self> {
        let elapsed = now.saturating_sub(self.previous_trade_time);

        let oracle_rate = if elapsed >= time_window {
            self.last_implied_rate
        } else {
            let recent = self
                .last_implied_rate
                .checked_multiply_ratio_trunc(elapsed, time_window)?;
            let prior = self
                .oracle_rate
                .checked_multiply_ratio_trunc(time_window - elapsed, time_window)?;

            recent.checked_add(prior)?
        };

        Ok(Self {
            oracle_rate,
            last_implied_rate: implied_rate,
            previous_trade_time: now,
            ..self
        })
    }
}

// ----------------------------------- tests -----------------------------------
