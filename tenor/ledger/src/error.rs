use {
    tenor_math::{Int128, MathError},
    tenor_types::{Addr, CurrencyId, ParamsError},
    thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error("insufficient cash to initialize markets of currency {currency_id}")]
    InsufficientCash { currency_id: CurrencyId },

    #[error(
        "leverage threshold exceeded! currency: {currency_id}, market: {market_index}, proportion: {proportion}, threshold: {threshold}"
    )]
    LeverageThresholdExceeded {
        currency_id: CurrencyId,
        market_index: u8,
        proportion: Int128,
        threshold: Int128,
    },

    #[error("failed to calibrate market! currency: {currency_id}, maturity: {maturity}, reason: {reason}")]
    CalibrationFault {
        currency_id: CurrencyId,
        maturity: u64,
        reason: String,
    },

    #[error("markets of currency {currency_id} are already initialized for quarter {time_ref}")]
    MarketsAlreadyInitialized { currency_id: CurrencyId, time_ref: u64 },

    #[error("markets of currency {currency_id} have not been initialized for quarter {time_ref}")]
    MarketsNotInitialized { currency_id: CurrencyId, time_ref: u64 },

    #[error("currency {currency_id} is not listed")]
    CurrencyNotListed { currency_id: CurrencyId },

    #[error("currency {currency_id} is already listed")]
    CurrencyAlreadyListed { currency_id: CurrencyId },

    #[error(
        "insufficient balance! account: {account}, currency: {currency_id}, needed: {needed}, available: {available}"
    )]
    InsufficientBalance {
        account: Addr,
        currency_id: CurrencyId,
        needed: Int128,
        available: Int128,
    },

    #[error("invalid trade on market {market_index} of currency {currency_id}: {reason}")]
    InvalidTrade {
        currency_id: CurrencyId,
        market_index: u8,
        reason: String,
    },

    #[error("market {market_index} of currency {currency_id} not found for quarter {time_ref}")]
    MarketNotFound {
        currency_id: CurrencyId,
        market_index: u8,
        time_ref: u64,
    },

    #[error("block time can't go backwards! current: {current}, new: {new}")]
    ClockWentBackwards { current: u64, new: u64 },

    #[error("account {account} is the perpetual token of currency {currency_id}")]
    PerpetualTokenAccount { account: Addr, currency_id: CurrencyId },

    #[error("amount must be positive, found {amount}")]
    NonPositiveAmount { amount: Int128 },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn calibration_fault(currency_id: CurrencyId, maturity: u64, reason: impl ToString) -> Self {
        Self::CalibrationFault {
            currency_id,
            maturity,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_trade(currency_id: CurrencyId, market_index: u8, reason: impl ToString) -> Self {
        Self::InvalidTrade {
            currency_id,
            market_index,
            reason: reason.to_string(),
        }
    }
}

impl From<config::ConfigError> for LedgerError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type LedgerResult<T> = core::result::Result<T, LedgerError>;
