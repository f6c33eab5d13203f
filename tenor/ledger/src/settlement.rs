use {
    crate::{EvtSettle, LedgerError, LedgerResult, LedgerState},
    tenor_math::Int128,
    tenor_types::{Addr, AssetKey, CurrencyId, MarketKey, settlement_date_for, time_ref},
    tracing::debug,
};

/// Settles every position in `currency_id` that expired before the ladder
/// active at the current block time, across every account.
///
/// - A liquidity token of a ladder settled before the current quarter is
///   burned for its share of the market's cash and fCash. Shares are computed
///   against the market as it stands, so the last holder drains it exactly.
/// - An fCash position at or past maturity becomes cash one to one.
pub(crate) fn settle_currency(
    state: &mut LedgerState,
    currency_id: CurrencyId,
) -> LedgerResult<EvtSettle> {
    let now = state.block_time;
    let current_ref = time_ref(now);
    let addresses = state.accounts.keys().copied().collect::<Vec<_>>();

    let mut liquidity_tokens = 0;
    let mut fcash_assets = 0;

    for address in addresses {
        liquidity_tokens += settle_liquidity_tokens(state, address, currency_id, current_ref)?;
        fcash_assets += settle_fcash(state, address, currency_id, now)?;
    }

    debug!(
        currency_id,
        liquidity_tokens, fcash_assets, "Settled expired positions"
    );

    Ok(EvtSettle {
        currency_id,
        liquidity_tokens,
        fcash_assets,
    })
}

fn settle_liquidity_tokens(
    state: &mut LedgerState,
    address: Addr,
    currency_id: CurrencyId,
    current_ref: u64,
) -> LedgerResult<usize> {
    let Some(account) = state.accounts.get(&address) else {
        return Ok(0);
    };

    let expired = account
        .portfolio
        .keys()
        .filter(|key| key.currency_id == currency_id)
        .filter_map(|key| {
            let market_index = key.kind.market_index()?;
            let settlement_date = settlement_date_for(key.maturity, market_index)?;
            (settlement_date < current_ref).then_some((*key, market_index, settlement_date))
        })
        .collect::<Vec<_>>();

    for (key, market_index, settlement_date) in &expired {
        let market_key = MarketKey {
            currency_id,
            settlement_date: *settlement_date,
            maturity: key.maturity,
        };

        let market = state
            .market(&market_key)
            .cloned()
            .ok_or(LedgerError::MarketNotFound {
                currency_id,
                market_index: *market_index,
                time_ref: *settlement_date,
            })?;

        let account = state.account_mut(address);
        let tokens = account.portfolio.remove(key);
        let (market, cash, fcash) = market.remove_liquidity(tokens)?;

        account
            .portfolio
            .add(AssetKey::fcash(currency_id, key.maturity), fcash)?;
        state.add_cash(address, currency_id, cash)?;
        state.set_market(market);
    }

    Ok(expired.len())
}

fn settle_fcash(
    state: &mut LedgerState,
    address: Addr,
    currency_id: CurrencyId,
    now: u64,
) -> LedgerResult<usize> {
    let Some(account) = state.accounts.get(&address) else {
        return Ok(0);
    };

    let matured = account
        .portfolio
        .keys_where(currency_id, |key| key.kind.is_fcash() && key.maturity <= now);

    for key in &matured {
        let notional: Int128 = state.account_mut(address).portfolio.remove(key);
        state.add_cash(address, currency_id, notional)?;
    }

    Ok(matured.len())
}
