use {
    crate::{
        EvtMintPerpetual, EvtRedeemPerpetual, Ledger, LedgerError, LedgerResult, LedgerState,
        calibration,
        custody::{debit_cash, ensure_not_perpetual_token, ensure_positive},
        rollover::{ensure_markets_current, has_liquidity_tokens},
    },
    std::collections::BTreeMap,
    tenor_math::{DEPOSIT_SHARE_PRECISION, Int128, MultiplyRatio, Number},
    tenor_types::{Addr, AssetKey, AssetKind, CurrencyId, MarketKey, market_offset, time_ref},
    tracing::{debug, info, warn},
};

impl Ledger {
    /// Mints perpetual tokens for `amount` of cash, taken from the account's
    /// cash balance or, if `use_cash_balance` is false, deposited from outside
    /// the ledger.
    pub fn mint_perpetual(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
        use_cash_balance: bool,
    ) -> LedgerResult<EvtMintPerpetual> {
        self.transact(|state| {
            do_mint_perpetual(state, account, currency_id, amount, use_cash_balance)
        })
    }

    /// Redeems perpetual tokens for their share of the perpetual token's cash
    /// and positions.
    pub fn redeem_perpetual(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        tokens: Int128,
    ) -> LedgerResult<EvtRedeemPerpetual> {
        self.transact(|state| do_redeem_perpetual(state, account, currency_id, tokens))
    }
}

// ---------------------------------- queries ----------------------------------

/// Oracle rate the ledger discounts a cash flow at `maturity` by.
///
/// Maturities on the active ladder use their market's oracle rate. Others are
/// interpolated between the neighbouring markets, and clamped to the nearest
/// market outside the ladder. Zero if the currency has no active markets.
pub fn oracle_rate_at(
    state: &LedgerState,
    currency_id: CurrencyId,
    maturity: u64,
) -> LedgerResult<Int128> {
    let markets = state.active_markets(currency_id);

    let (Some(first), Some(last)) = (markets.first(), markets.last()) else {
        return Ok(Int128::ZERO);
    };

    if maturity <= first.maturity {
        return Ok(first.oracle_rate);
    }

    if maturity >= last.maturity {
        return Ok(last.oracle_rate);
    }

    for pair in markets.windows(2) {
        let (short, long) = (&pair[0], &pair[1]);

        if maturity == long.maturity {
            return Ok(long.oracle_rate);
        }

        if maturity > short.maturity && maturity < long.maturity {
            return Ok(calibration::interpolate_rate(
                (short.maturity, short.oracle_rate),
                (long.maturity, long.oracle_rate),
                maturity,
            )?);
        }
    }

    Ok(last.oracle_rate)
}

fn fcash_present_value(
    state: &LedgerState,
    currency_id: CurrencyId,
    maturity: u64,
    notional: Int128,
) -> LedgerResult<Int128> {
    let Some(time_to_maturity) = maturity.checked_sub(state.block_time).filter(|t| *t > 0) else {
        return Ok(notional);
    };

    let rate = oracle_rate_at(state, currency_id, maturity)?;

    Ok(calibration::present_value(notional, rate, time_to_maturity)?)
}

/// Value of everything the perpetual token of a currency holds: its cash, its
/// claims on market cash and fCash through liquidity tokens, and its own
/// fCash, each discounted at the oracle rate of its maturity.
pub fn perpetual_token_present_value(
    state: &LedgerState,
    currency_id: CurrencyId,
) -> LedgerResult<Int128> {
    let perp = Addr::perpetual_token(currency_id);
    let mut value = state.cash_balance(&perp, currency_id);

    let Some(account) = state.account(&perp) else {
        return Ok(value);
    };

    for (key, notional) in account.portfolio.iter() {
        if key.currency_id != currency_id {
            continue;
        }

        let fcash = match key.kind {
            AssetKind::FCash => *notional,
            AssetKind::LiquidityToken { .. } => {
                let market = state.liquidity_token_market(key)?;

                let cash_claim = market
                    .total_cash
                    .checked_multiply_ratio_trunc(*notional, market.total_liquidity)?;
                value = value.checked_add(cash_claim)?;

                market
                    .total_fcash
                    .checked_multiply_ratio_trunc(*notional, market.total_liquidity)?
            },
        };

        value = value.checked_add(fcash_present_value(state, currency_id, key.maturity, fcash)?)?;
    }

    Ok(value)
}

/// Perpetual tokens that minting with `amount` of cash would issue now.
pub fn perpetual_tokens_to_mint(
    state: &LedgerState,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<Int128> {
    let total_supply = state.perpetual_token(currency_id)?.total_supply;

    if total_supply.is_zero() {
        return Ok(amount);
    }

    let present_value = perpetual_token_present_value(state, currency_id)?;

    if !present_value.is_positive() {
        return Err(LedgerError::calibration_fault(
            currency_id,
            state.block_time,
            format!("perpetual token has non-positive present value {present_value}"),
        ));
    }

    Ok(amount.checked_multiply_ratio_trunc(total_supply, present_value)?)
}

// ----------------------------------- mint ------------------------------------

pub fn do_mint_perpetual(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
    use_cash_balance: bool,
) -> LedgerResult<EvtMintPerpetual> {
    match _do_mint_perpetual(state, account, currency_id, amount, use_cash_balance) {
        Ok(evt) => {
            info!(
                account = account.to_string(),
                currency_id,
                amount = amount.to_string(),
                tokens_minted = evt.tokens_minted.to_string(),
                deposited_to_markets = evt.deposited_to_markets,
                "Minted perpetual tokens"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(
                account = account.to_string(),
                currency_id,
                err = err.to_string(),
                "Failed to mint perpetual tokens"
            );

            Err(err)
        },
    }
}

fn _do_mint_perpetual(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
    use_cash_balance: bool,
) -> LedgerResult<EvtMintPerpetual> {
    ensure_positive(amount)?;
    ensure_not_perpetual_token(state, account)?;

    let deposited_to_markets = has_liquidity_tokens(state, currency_id);
    if deposited_to_markets {
        ensure_markets_current(state, currency_id)?;
    }

    // Price the tokens before the new cash changes the perpetual token's value.
    let tokens_minted = perpetual_tokens_to_mint(state, currency_id, amount)?;

    if use_cash_balance {
        debit_cash(state, account, currency_id, amount)?;
    } else {
        state.add_custody(currency_id, amount)?;
    }

    let perp = Addr::perpetual_token(currency_id);
    state.add_cash(perp, currency_id, amount)?;

    if deposited_to_markets {
        deposit_into_markets(state, currency_id, amount)?;
    }

    let now = state.block_time;
    let balance = state.account_mut(account).balance_mut(currency_id);
    balance.perpetual_token_balance = balance.perpetual_token_balance.checked_add(tokens_minted)?;
    balance.last_mint_time = now;

    let token = state.perpetual_token_mut(currency_id)?;
    token.total_supply = token.total_supply.checked_add(tokens_minted)?;

    Ok(EvtMintPerpetual {
        account,
        currency_id,
        amount,
        tokens_minted,
        deposited_to_markets,
    })
}

/// Adds `amount` of the perpetual token's cash to the active markets by
/// deposit share, at each market's current proportion.
///
/// A slot with no market yet, because the ladder was extended after the last
/// initialization, is skipped. Its share stays in the perpetual token's cash
/// until the next rollover.
fn deposit_into_markets(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<()> {
    let perp = Addr::perpetual_token(currency_id);
    let deposit = state
        .perpetual_token(currency_id)?
        .deposit_parameters()?
        .clone();
    let max_market_index = state.currency(currency_id)?.cash_group.max_market_index;

    deposit.validate(max_market_index)?;

    let settlement_date = time_ref(state.block_time);
    let mut remaining = amount;

    for market_index in 1..=max_market_index {
        let position = (market_index - 1) as usize;
        let Some(maturity) = market_offset(market_index).map(|offset| settlement_date + offset)
        else {
            continue;
        };
        let Some(market) = state
            .market(&MarketKey {
                currency_id,
                settlement_date,
                maturity,
            })
            .filter(|market| market.total_liquidity.is_positive())
            .cloned()
        else {
            debug!(currency_id, market_index, "No market to deposit into");
            continue;
        };

        let proportion = market.proportion()?;
        let threshold = deposit.leverage_thresholds[position];

        if proportion >= threshold {
            return Err(LedgerError::LeverageThresholdExceeded {
                currency_id,
                market_index,
                proportion,
                threshold,
            });
        }

        let cash = if market_index == max_market_index {
            remaining
        } else {
            amount.checked_multiply_ratio_trunc(
                deposit.deposit_shares[position],
                DEPOSIT_SHARE_PRECISION,
            )?
        };
        remaining = remaining.checked_sub(cash)?;

        let (market, tokens, fcash) = market.add_liquidity(cash)?;

        let portfolio = &mut state.account_mut(perp).portfolio;
        portfolio.add(
            AssetKey::liquidity_token(currency_id, maturity, market_index),
            tokens,
        )?;
        portfolio.add(AssetKey::fcash(currency_id, maturity), fcash.checked_neg()?)?;

        state.add_cash(perp, currency_id, cash.checked_neg()?)?;
        state.set_market(market);
    }

    Ok(())
}

// ---------------------------------- redeem -----------------------------------

pub fn do_redeem_perpetual(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    tokens: Int128,
) -> LedgerResult<EvtRedeemPerpetual> {
    match _do_redeem_perpetual(state, account, currency_id, tokens) {
        Ok(evt) => {
            info!(
                account = account.to_string(),
                currency_id,
                tokens_redeemed = tokens.to_string(),
                cash_received = evt.cash_received.to_string(),
                fcash_positions = evt.fcash_received.len(),
                "Redeemed perpetual tokens"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(
                account = account.to_string(),
                currency_id,
                err = err.to_string(),
                "Failed to redeem perpetual tokens"
            );

            Err(err)
        },
    }
}

fn _do_redeem_perpetual(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    tokens: Int128,
) -> LedgerResult<EvtRedeemPerpetual> {
    ensure_positive(tokens)?;
    ensure_not_perpetual_token(state, account)?;

    let available = state.perpetual_token_balance(&account, currency_id);
    if available < tokens {
        return Err(LedgerError::InsufficientBalance {
            account,
            currency_id,
            needed: tokens,
            available,
        });
    }

    if has_liquidity_tokens(state, currency_id) {
        ensure_markets_current(state, currency_id)?;
    }

    let total_supply = state.perpetual_token(currency_id)?.total_supply;
    let perp = Addr::perpetual_token(currency_id);

    // Share of the perpetual token's idle cash.
    let mut cash_received = state
        .cash_balance(&perp, currency_id)
        .checked_multiply_ratio_trunc(tokens, total_supply)?;
    state.add_cash(perp, currency_id, cash_received.checked_neg()?)?;

    let positions = state
        .account(&perp)
        .map(|account| {
            account
                .portfolio
                .iter()
                .filter(|(key, _)| key.currency_id == currency_id)
                .map(|(key, notional)| (*key, *notional))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut fcash_received = BTreeMap::<u64, Int128>::new();

    for (key, notional) in positions {
        let share = notional.checked_multiply_ratio_trunc(tokens, total_supply)?;

        if share.is_zero() {
            continue;
        }

        state
            .account_mut(perp)
            .portfolio
            .add(key, share.checked_neg()?)?;

        let fcash = match key.kind {
            AssetKind::FCash => share,
            AssetKind::LiquidityToken { .. } => {
                let market = state.liquidity_token_market(&key)?.clone();
                let (market, cash, fcash) = market.remove_liquidity(share)?;
                state.set_market(market);
                cash_received = cash_received.checked_add(cash)?;

                fcash
            },
        };

        let net = fcash_received.entry(key.maturity).or_default();
        *net = net.checked_add(fcash)?;
    }

    state.add_cash(account, currency_id, cash_received)?;

    let fcash_received = fcash_received
        .into_iter()
        .filter(|(_, notional)| !notional.is_zero())
        .collect::<Vec<_>>();

    let redeemer = state.account_mut(account);
    for (maturity, notional) in &fcash_received {
        redeemer
            .portfolio
            .add(AssetKey::fcash(currency_id, *maturity), *notional)?;
    }

    let balance = redeemer.balance_mut(currency_id);
    balance.perpetual_token_balance = balance.perpetual_token_balance.checked_sub(tokens)?;

    let token = state.perpetual_token_mut(currency_id)?;
    token.total_supply = token.total_supply.checked_sub(tokens)?;

    Ok(EvtRedeemPerpetual {
        account,
        currency_id,
        tokens_redeemed: tokens,
        cash_received,
        fcash_received,
    })
}

// ----------------------------------- tests -----------------------------------
