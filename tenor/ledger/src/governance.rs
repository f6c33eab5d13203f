use {
    crate::{EvtListCurrency, Ledger, LedgerError, LedgerResult, LedgerState},
    tenor_types::{
        CashGroup, Currency, CurrencyConfig, CurrencyId, DepositParameters,
        InitializationParameters, PerpetualToken,
    },
    tracing::{info, warn},
};

impl Ledger {
    pub fn list_currency(&mut self, config: CurrencyConfig) -> LedgerResult<EvtListCurrency> {
        self.transact(|state| do_list_currency(state, config))
    }

    pub fn update_cash_group(
        &mut self,
        currency_id: CurrencyId,
        cash_group: CashGroup,
    ) -> LedgerResult<()> {
        self.transact(|state| do_update_cash_group(state, currency_id, cash_group))
    }

    pub fn update_deposit_parameters(
        &mut self,
        currency_id: CurrencyId,
        params: DepositParameters,
    ) -> LedgerResult<()> {
        self.transact(|state| do_update_deposit_parameters(state, currency_id, params))
    }

    pub fn update_initialization_parameters(
        &mut self,
        currency_id: CurrencyId,
        params: InitializationParameters,
    ) -> LedgerResult<()> {
        self.transact(|state| do_update_initialization_parameters(state, currency_id, params))
    }
}

// ------------------------------- list currency -------------------------------

pub fn do_list_currency(
    state: &mut LedgerState,
    config: CurrencyConfig,
) -> LedgerResult<EvtListCurrency> {
    let currency_id = config.currency_id;

    match _do_list_currency(state, config) {
        Ok(evt) => {
            info!(currency_id, symbol = evt.symbol.as_str(), "Listed currency");

            Ok(evt)
        },
        Err(err) => {
            warn!(currency_id, err = err.to_string(), "Failed to list currency");

            Err(err)
        },
    }
}

fn _do_list_currency(
    state: &mut LedgerState,
    config: CurrencyConfig,
) -> LedgerResult<EvtListCurrency> {
    config.validate()?;

    if state.currencies.contains_key(&config.currency_id) {
        return Err(LedgerError::CurrencyAlreadyListed {
            currency_id: config.currency_id,
        });
    }

    let listing_time = state.block_time;

    state.currencies.insert(config.currency_id, Currency {
        id: config.currency_id,
        symbol: config.symbol.clone(),
        decimals: config.decimals,
        listing_time,
        cash_group: config.cash_group,
        last_initialized: None,
    });

    state.perpetual_tokens.insert(config.currency_id, PerpetualToken {
        deposit: config.deposit,
        initialization: config.initialization,
        ..PerpetualToken::new(config.currency_id)
    });

    Ok(EvtListCurrency {
        currency_id: config.currency_id,
        symbol: config.symbol,
        listing_time,
    })
}

// ---------------------------- parameter updates ------------------------------

pub fn do_update_cash_group(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    cash_group: CashGroup,
) -> LedgerResult<()> {
    let max_market_index = cash_group.max_market_index;

    match _do_update_cash_group(state, currency_id, cash_group) {
        Ok(()) => {
            info!(currency_id, max_market_index, "Updated cash group");

            Ok(())
        },
        Err(err) => {
            warn!(currency_id, err = err.to_string(), "Failed to update cash group");

            Err(err)
        },
    }
}

fn _do_update_cash_group(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    cash_group: CashGroup,
) -> LedgerResult<()> {
    cash_group.validate()?;

    state.currency_mut(currency_id)?.cash_group = cash_group;

    Ok(())
}

pub fn do_update_deposit_parameters(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    params: DepositParameters,
) -> LedgerResult<()> {
    match _do_update_deposit_parameters(state, currency_id, params) {
        Ok(()) => {
            info!(currency_id, "Updated deposit parameters");

            Ok(())
        },
        Err(err) => {
            warn!(
                currency_id,
                err = err.to_string(),
                "Failed to update deposit parameters"
            );

            Err(err)
        },
    }
}

fn _do_update_deposit_parameters(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    params: DepositParameters,
) -> LedgerResult<()> {
    params.validate(state.currency(currency_id)?.cash_group.max_market_index)?;

    state.perpetual_token_mut(currency_id)?.deposit = Some(params);

    Ok(())
}

pub fn do_update_initialization_parameters(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    params: InitializationParameters,
) -> LedgerResult<()> {
    match _do_update_initialization_parameters(state, currency_id, params) {
        Ok(()) => {
            info!(currency_id, "Updated initialization parameters");

            Ok(())
        },
        Err(err) => {
            warn!(
                currency_id,
                err = err.to_string(),
                "Failed to update initialization parameters"
            );

            Err(err)
        },
    }
}

fn _do_update_initialization_parameters(
    state: &mut LedgerState,
    currency_id: CurrencyId,
    params: InitializationParameters,
) -> LedgerResult<()> {
    params.validate(state.currency(currency_id)?.cash_group.max_market_index)?;

    state.perpetual_token_mut(currency_id)?.initialization = Some(params);

    Ok(())
}

// ----------------------------------- tests -----------------------------------
