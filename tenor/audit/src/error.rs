use {
    serde::Serialize,
    tenor_ledger::LedgerError,
    tenor_math::{Int128, MathError},
    tenor_types::{AccountContext, Addr, CurrencyId},
    thiserror::Error,
};

/// The conservation law a violation breaks.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Law {
    CashConservation,
    TokenSupply,
    FCashNetZero,
    LiquidityAccounting,
    ContextConsistency,
}

/// A broken conservation law.
///
/// This is a fault in the ledger itself, never a user error. Each variant
/// carries enough to locate the inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error(
        "cash not conserved! currency: {currency_id}, custodial balance: {custodial}, accounted: {accounted}"
    )]
    CashNotConserved {
        currency_id: CurrencyId,
        custodial: Int128,
        accounted: Int128,
    },

    #[error(
        "perpetual token supply mismatch! currency: {currency_id}, total supply: {total_supply}, held: {held}"
    )]
    SupplyMismatch {
        currency_id: CurrencyId,
        total_supply: Int128,
        held: Int128,
    },

    #[error(
        "perpetual token of currency {currency_id} holds balances in currency {other_currency_id}! cash: {cash_balance}, perpetual tokens: {perpetual_token_balance}"
    )]
    ForeignBalance {
        currency_id: CurrencyId,
        other_currency_id: CurrencyId,
        cash_balance: Int128,
        perpetual_token_balance: Int128,
    },

    #[error(
        "perpetual token of currency {currency_id} holds an asset in currency {asset_currency_id} at maturity {maturity}"
    )]
    ForeignAsset {
        currency_id: CurrencyId,
        asset_currency_id: CurrencyId,
        maturity: u64,
    },

    #[error("fCash does not net to zero! currency: {currency_id}, maturity: {maturity}, net: {net}")]
    FCashNotNetZero {
        currency_id: CurrencyId,
        maturity: u64,
        net: Int128,
    },

    #[error(
        "market holds negative fCash! currency: {currency_id}, maturity: {maturity}, settlement date: {settlement_date}, fCash: {total_fcash}"
    )]
    NegativeMarketFCash {
        currency_id: CurrencyId,
        maturity: u64,
        settlement_date: u64,
        total_fcash: Int128,
    },

    #[error(
        "liquidity tokens held don't match supply! currency: {currency_id}, maturity: {maturity}, market: {market_index}, supply: {supply}, held: {held}"
    )]
    LiquidityMismatch {
        currency_id: CurrencyId,
        maturity: u64,
        market_index: u8,
        supply: Int128,
        held: Int128,
    },

    #[error(
        "negative liquidity supply! currency: {currency_id}, maturity: {maturity}, market: {market_index}, supply: {supply}"
    )]
    NegativeLiquiditySupply {
        currency_id: CurrencyId,
        maturity: u64,
        market_index: u8,
        supply: Int128,
    },

    #[error(
        "liquidity tokens without a market! currency: {currency_id}, maturity: {maturity}, market: {market_index}, held: {held}"
    )]
    OrphanLiquidityToken {
        currency_id: CurrencyId,
        maturity: u64,
        market_index: u8,
        held: Int128,
    },

    #[error("stale account context! account: {account}, cached: {cached:?}, computed: {computed:?}")]
    StaleAccountContext {
        account: Addr,
        cached: AccountContext,
        computed: AccountContext,
    },

    #[error("overflow while checking {law:?} of currency {currency_id}: {err}")]
    Overflow {
        law: Law,
        currency_id: CurrencyId,
        err: MathError,
    },
}

impl InvariantViolation {
    pub fn law(&self) -> Law {
        match self {
            Self::CashNotConserved { .. } => Law::CashConservation,
            Self::SupplyMismatch { .. } | Self::ForeignBalance { .. } | Self::ForeignAsset { .. } => {
                Law::TokenSupply
            },
            Self::FCashNotNetZero { .. } | Self::NegativeMarketFCash { .. } => Law::FCashNetZero,
            Self::LiquidityMismatch { .. }
            | Self::NegativeLiquiditySupply { .. }
            | Self::OrphanLiquidityToken { .. } => Law::LiquidityAccounting,
            Self::StaleAccountContext { .. } => Law::ContextConsistency,
            Self::Overflow { law, .. } => *law,
        }
    }

    /// Currency the violation was found in, if it is specific to one.
    pub fn currency_id(&self) -> Option<CurrencyId> {
        match self {
            Self::CashNotConserved { currency_id, .. }
            | Self::SupplyMismatch { currency_id, .. }
            | Self::ForeignBalance { currency_id, .. }
            | Self::ForeignAsset { currency_id, .. }
            | Self::FCashNotNetZero { currency_id, .. }
            | Self::NegativeMarketFCash { currency_id, .. }
            | Self::LiquidityMismatch { currency_id, .. }
            | Self::NegativeLiquiditySupply { currency_id, .. }
            | Self::OrphanLiquidityToken { currency_id, .. }
            | Self::Overflow { currency_id, .. } => Some(*currency_id),
            Self::StaleAccountContext { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Violation(#[from] InvariantViolation),
}

pub type AuditResult<T> = core::result::Result<T, AuditError>;
