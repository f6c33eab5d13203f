use {
    crate::{
        EvtInitializeMarkets, Ledger, LedgerError, LedgerResult, LedgerState, calibration,
        settlement::settle_currency,
    },
    tenor_math::{DEPOSIT_SHARE_PRECISION, Int128, MultiplyRatio, Number, RATE_PRECISION},
    tenor_types::{
        Addr, AssetKey, CurrencyId, Market, MarketKey, QUARTER, market_offset, time_ref,
    },
    tracing::{debug, info, warn},
};

impl Ledger {
    /// Settles the expired ladder of a currency and initializes the markets of
    /// the current quarter with the perpetual token's cash.
    pub fn initialize_markets(
        &mut self,
        currency_id: CurrencyId,
    ) -> LedgerResult<EvtInitializeMarkets> {
        self.transact(|state| do_initialize_markets(state, currency_id))
    }
}

/// Whether the perpetual token of a currency currently provides liquidity to
/// any market.
pub(crate) fn has_liquidity_tokens(state: &LedgerState, currency_id: CurrencyId) -> bool {
    state
        .account(&Addr::perpetual_token(currency_id))
        .is_some_and(|account| {
            account
                .portfolio
                .keys()
                .any(|key| key.currency_id == currency_id && !key.kind.is_fcash())
        })
}

/// Fails unless the markets of a currency that the perpetual token is providing
/// liquidity to were initialized for the current quarter.
pub(crate) fn ensure_markets_current(
    state: &LedgerState,
    currency_id: CurrencyId,
) -> LedgerResult<()> {
    let current_ref = time_ref(state.block_time);

    if state.currency(currency_id)?.last_initialized != Some(current_ref) {
        return Err(LedgerError::MarketsNotInitialized {
            currency_id,
            time_ref: current_ref,
        });
    }

    Ok(())
}

fn ensure_positive_fcash(
    currency_id: CurrencyId,
    maturity: u64,
    fcash: Int128,
) -> LedgerResult<()> {
    if !fcash.is_positive() {
        return Err(LedgerError::calibration_fault(
            currency_id,
            maturity,
            format!("market would hold non-positive fCash {fcash}"),
        ));
    }

    Ok(())
}

/// Rate at `maturity` between two markets of the previous ladder, if both of
/// them carry an oracle rate.
fn bracket_rate(
    short: Option<(u64, Int128)>,
    long: Option<(u64, Int128)>,
    maturity: u64,
) -> LedgerResult<Option<Int128>> {
    match (short, long) {
        (Some(short), Some(long)) => Ok(Some(calibration::interpolate_rate(short, long, maturity)?)),
        _ => Ok(None),
    }
}

pub fn do_initialize_markets(
    state: &mut LedgerState,
    currency_id: CurrencyId,
) -> LedgerResult<EvtInitializeMarkets> {
    match _do_initialize_markets(state, currency_id) {
        Ok(evt) => {
            info!(
                currency_id,
                time_ref = evt.time_ref,
                first_initialization = evt.first_initialization,
                net_cash = evt.net_cash.to_string(),
                markets = evt.markets.len(),
                "Initialized markets"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(currency_id, err = err.to_string(), "Failed to initialize markets");

            Err(err)
        },
    }
}

fn _do_initialize_markets(
    state: &mut LedgerState,
    currency_id: CurrencyId,
) -> LedgerResult<EvtInitializeMarkets> {
    let now = state.block_time;
    let current_ref = time_ref(now);
    let currency = state.currency(currency_id)?.clone();

    let first_initialization =
        currency.last_initialized.is_none() || !has_liquidity_tokens(state, currency_id);

    if !first_initialization && currency.last_initialized >= Some(current_ref) {
        return Err(LedgerError::MarketsAlreadyInitialized {
            currency_id,
            time_ref: current_ref,
        });
    }

    // 1. Settle everything that expired with the previous ladder.
    let settlement = settle_currency(state, currency_id)?;

    // 2. The perpetual token needs cash to provide and parameters to provide it by.
    let perp = Addr::perpetual_token(currency_id);
    let net_cash = state.cash_balance(&perp, currency_id);

    if !net_cash.is_positive() {
        return Err(LedgerError::InsufficientCash { currency_id });
    }

    let token = state.perpetual_token(currency_id)?;
    let max_market_index = currency.cash_group.max_market_index;
    let deposit = token.deposit_parameters()?.clone();
    let initialization = token.initialization_parameters()?.clone();

    currency.cash_group.validate()?;
    deposit.validate(max_market_index)?;
    initialization.validate(max_market_index)?;

    // 3. Calibrate and fund every slot of the new ladder.
    let previous_ref = current_ref.checked_sub(QUARTER);
    let previous_oracle_rate = |market_index: u8| -> Option<(u64, Int128)> {
        let settlement_date = previous_ref?;
        let maturity = settlement_date + market_offset(market_index)?;
        let market = state.market(&MarketKey {
            currency_id,
            settlement_date,
            maturity,
        })?;

        (!market.oracle_rate.is_zero()).then_some((maturity, market.oracle_rate))
    };

    let mut markets = Vec::with_capacity(max_market_index as usize);
    let mut remaining = net_cash;

    for market_index in 1..=max_market_index {
        let position = (market_index - 1) as usize;
        let maturity = current_ref
            + market_offset(market_index).ok_or_else(|| {
                LedgerError::calibration_fault(currency_id, current_ref, "invalid market index")
            })?;
        let time_to_maturity = maturity - now;

        let cash = if market_index == max_market_index {
            remaining
        } else {
            net_cash.checked_multiply_ratio_trunc(
                deposit.deposit_shares[position],
                DEPOSIT_SHARE_PRECISION,
            )?
        };
        remaining = remaining.checked_sub(cash)?;

        let rate_anchor = initialization.rate_anchors[position];
        let rate_scalar = currency.cash_group.rate_scalars[position];

        // Rate inherited or interpolated from the previous ladder, if it has
        // one to offer. The front market inherits the old six-month rate. The
        // new six-month market sits between the old six-month and one-year
        // markets. Every longer market extrapolates one quarter past the old
        // market of the same slot.
        let interpolated = if first_initialization {
            None
        } else {
            match market_index {
                1 => previous_oracle_rate(2).map(|(_, rate)| rate),
                2 => bracket_rate(previous_oracle_rate(2), previous_oracle_rate(3), maturity)?,
                _ => bracket_rate(
                    previous_oracle_rate(market_index - 1),
                    previous_oracle_rate(market_index),
                    maturity,
                )?,
            }
        };

        let (fcash, implied_rate) = match interpolated {
            Some(rate) => {
                let fcash = calibration::fcash_for_rate(
                    cash,
                    rate,
                    rate_anchor,
                    rate_scalar,
                    time_to_maturity,
                )?;
                ensure_positive_fcash(currency_id, maturity, fcash)?;

                (fcash, rate)
            },
            None => {
                let fcash =
                    calibration::fcash_for_proportion(cash, initialization.proportions[position])?;

                ensure_positive_fcash(currency_id, maturity, fcash)?;

                let proportion = fcash.checked_multiply_ratio_trunc(
                    RATE_PRECISION,
                    fcash.checked_add(cash)?,
                )?;
                let exchange_rate =
                    calibration::exchange_rate(proportion, rate_anchor, rate_scalar)?;

                if exchange_rate < RATE_PRECISION {
                    return Err(LedgerError::calibration_fault(
                        currency_id,
                        maturity,
                        format!("exchange rate {exchange_rate} is below one"),
                    ));
                }

                (fcash, calibration::implied_rate(exchange_rate, time_to_maturity)?)
            },
        };

        let key = MarketKey {
            currency_id,
            settlement_date: current_ref,
            maturity,
        };

        if let Some(existing) = state.market(&key) {
            if !existing.total_liquidity.is_zero()
                || !existing.total_cash.is_zero()
                || !existing.total_fcash.is_zero()
            {
                return Err(LedgerError::MarketsAlreadyInitialized {
                    currency_id,
                    time_ref: current_ref,
                });
            }
        }

        let market = Market::new(key, cash, fcash, implied_rate, now);
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

        debug!(
            currency_id,
            market_index,
            maturity,
            cash = cash.to_string(),
            fcash = fcash.to_string(),
            oracle_rate = implied_rate.to_string(),
            interpolated = interpolated.is_some(),
            "Calibrated market"
        );

        markets.push(market);
    }

    // 4. Move the cash into the markets. The perpetual token holds the
    //    liquidity and owes the fCash.
    state.add_cash(perp, currency_id, net_cash.checked_neg()?)?;

    let mut keys = Vec::with_capacity(markets.len());

    for (position, market) in markets.into_iter().enumerate() {
        let market_index = (position + 1) as u8;
        let portfolio = &mut state.account_mut(perp).portfolio;

        portfolio.add(
            AssetKey::liquidity_token(currency_id, market.maturity, market_index),
            market.total_liquidity,
        )?;
        portfolio.add(
            AssetKey::fcash(currency_id, market.maturity),
            market.total_fcash.checked_neg()?,
        )?;

        keys.push(market.key());
        state.set_market(market);
    }

    // 5. Record the quarter.
    state.currency_mut(currency_id)?.last_initialized = Some(current_ref);

    Ok(EvtInitializeMarkets {
        currency_id,
        time_ref: current_ref,
        first_initialization,
        settlement,
        net_cash,
        markets: keys,
    })
}

// ----------------------------------- tests -----------------------------------
