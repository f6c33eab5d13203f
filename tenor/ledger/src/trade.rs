use {
    crate::{
        EvtTrade, Ledger, LedgerError, LedgerResult, LedgerState,
        custody::ensure_not_perpetual_token, rollover::ensure_markets_current,
    },
    serde::{Deserialize, Serialize},
    tenor_math::Int128,
    tenor_types::{Addr, AssetKey, CurrencyId, MarketKey, market_offset, time_ref},
    tracing::{info, warn},
};

/// Result of pricing a trade against a market, produced outside the ledger.
///
/// Amounts are signed from the account's point of view: lending cash for
/// fCash is a positive `fcash_to_account` and a negative `cash_to_account`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub market_index: u8,
    pub fcash_to_account: Int128,
    pub cash_to_account: Int128,
    /// Implied rate of the market after the trade.
    pub implied_rate: Int128,
}

impl Ledger {
    pub fn apply_trade(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        trade: Trade,
    ) -> LedgerResult<EvtTrade> {
        self.transact(|state| do_apply_trade(state, account, currency_id, trade))
    }
}

pub fn do_apply_trade(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    trade: Trade,
) -> LedgerResult<EvtTrade> {
    match _do_apply_trade(state, account, currency_id, trade) {
        Ok(evt) => {
            info!(
                account = account.to_string(),
                currency_id,
                market_index = trade.market_index,
                fcash_to_account = trade.fcash_to_account.to_string(),
                cash_to_account = trade.cash_to_account.to_string(),
                oracle_rate = evt.oracle_rate.to_string(),
                "Applied trade"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(
                account = account.to_string(),
                currency_id,
                market_index = trade.market_index,
                err = err.to_string(),
                "Failed to apply trade"
            );

            Err(err)
        },
    }
}

fn _do_apply_trade(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    trade: Trade,
) -> LedgerResult<EvtTrade> {
    let market_index = trade.market_index;

    if account == Addr::perpetual_token(currency_id) {
        return Err(LedgerError::invalid_trade(
            currency_id,
            market_index,
            "the perpetual token does not trade",
        ));
    }

    ensure_not_perpetual_token(state, account)?;

    if trade.fcash_to_account.is_zero() && trade.cash_to_account.is_zero() {
        return Err(LedgerError::invalid_trade(currency_id, market_index, "empty trade"));
    }

    if trade.implied_rate.is_negative() {
        return Err(LedgerError::invalid_trade(
            currency_id,
            market_index,
            format!("negative implied rate {}", trade.implied_rate),
        ));
    }

    ensure_markets_current(state, currency_id)?;

    let now = state.block_time;
    let settlement_date = time_ref(now);
    let currency = state.currency(currency_id)?;
    let time_window = currency.cash_group.rate_oracle_time_window;

    let not_found = LedgerError::MarketNotFound {
        currency_id,
        market_index,
        time_ref: settlement_date,
    };

    if market_index == 0 || market_index > currency.cash_group.max_market_index {
        return Err(not_found);
    }

    let offset = market_offset(market_index).ok_or_else(|| not_found.clone())?;
    let key = MarketKey {
        currency_id,
        settlement_date,
        maturity: settlement_date + offset,
    };
    let market = state.market(&key).cloned().ok_or(not_found)?;

    let market = market.apply_trade(trade.fcash_to_account, trade.cash_to_account)?;

    if market.total_fcash.is_negative() || market.total_cash.is_negative() {
        return Err(LedgerError::invalid_trade(
            currency_id,
            market_index,
            format!(
                "market would hold fCash {} and cash {}",
                market.total_fcash, market.total_cash
            ),
        ));
    }

    let market = market.record_trade(trade.implied_rate, now, time_window)?;
    let oracle_rate = market.oracle_rate;

    state
        .account_mut(account)
        .portfolio
        .add(AssetKey::fcash(currency_id, key.maturity), trade.fcash_to_account)?;
    state.add_cash(account, currency_id, trade.cash_to_account)?;
    state.set_market(market);

    Ok(EvtTrade {
        account,
        market: key,
        fcash_to_account: trade.fcash_to_account,
        cash_to_account: trade.cash_to_account,
        oracle_rate,
    })
}

// ----------------------------------- tests -----------------------------------
