use {
    serde::Serialize,
    tenor_math::Int128,
    tenor_types::{Addr, CurrencyId, MarketKey},
};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtListCurrency {
    pub currency_id: CurrencyId,
    pub symbol: String,
    pub listing_time: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtDeposit {
    pub account: Addr,
    pub currency_id: CurrencyId,
    pub amount: Int128,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtWithdraw {
    pub account: Addr,
    pub currency_id: CurrencyId,
    pub amount: Int128,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtSettle {
    pub currency_id: CurrencyId,
    /// Liquidity token positions withdrawn from expired ladders.
    pub liquidity_tokens: usize,
    /// Matured fCash positions converted to cash.
    pub fcash_assets: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtInitializeMarkets {
    pub currency_id: CurrencyId,
    pub time_ref: u64,
    pub first_initialization: bool,
    pub settlement: EvtSettle,
    /// Cash the perpetual token deposited across the new ladder.
    pub net_cash: Int128,
    pub markets: Vec<MarketKey>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtMintPerpetual {
    pub account: Addr,
    pub currency_id: CurrencyId,
    pub amount: Int128,
    pub tokens_minted: Int128,
    /// Whether the cash was added to the markets or left with the perpetual
    /// token for the next initialization.
    pub deposited_to_markets: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtRedeemPerpetual {
    pub account: Addr,
    pub currency_id: CurrencyId,
    pub tokens_redeemed: Int128,
    pub cash_received: Int128,
    /// Net fCash positions transferred to the redeemer, by maturity.
    pub fcash_received: Vec<(u64, Int128)>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EvtTrade {
    pub account: Addr,
    pub market: MarketKey,
    pub fcash_to_account: Int128,
    pub cash_to_account: Int128,
    pub oracle_rate: Int128,
}
