use {
    crate::{EvtDeposit, EvtWithdraw, Ledger, LedgerError, LedgerResult, LedgerState},
    tenor_math::{Int128, Number},
    tenor_types::{Addr, CurrencyId},
    tracing::{info, warn},
};

impl Ledger {
    /// Moves `amount` of a currency from outside the ledger into the cash
    /// balance of `account`.
    pub fn deposit(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
    ) -> LedgerResult<EvtDeposit> {
        self.transact(|state| do_deposit(state, account, currency_id, amount))
    }

    pub fn withdraw(
        &mut self,
        account: Addr,
        currency_id: CurrencyId,
        amount: Int128,
    ) -> LedgerResult<EvtWithdraw> {
        self.transact(|state| do_withdraw(state, account, currency_id, amount))
    }
}

pub(crate) fn ensure_positive(amount: Int128) -> LedgerResult<()> {
    if !amount.is_positive() {
        return Err(LedgerError::NonPositiveAmount { amount });
    }

    Ok(())
}

/// Fails if `account` is the perpetual token of any listed currency. Only the
/// ledger itself moves balances in and out of those.
pub(crate) fn ensure_not_perpetual_token(
    state: &LedgerState,
    account: Addr,
) -> LedgerResult<()> {
    if let Some(currency_id) = state.perpetual_token_currency(&account) {
        return Err(LedgerError::PerpetualTokenAccount {
            account,
            currency_id,
        });
    }

    Ok(())
}

/// Takes `amount` out of the cash balance of `account`, failing if it would go
/// below zero.
pub(crate) fn debit_cash(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<()> {
    let available = state.cash_balance(&account, currency_id);

    if available < amount {
        return Err(LedgerError::InsufficientBalance {
            account,
            currency_id,
            needed: amount,
            available,
        });
    }

    state.add_cash(account, currency_id, amount.checked_neg()?)?;

    Ok(())
}

// ---------------------------------- deposit ----------------------------------

pub fn do_deposit(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<EvtDeposit> {
    match _do_deposit(state, account, currency_id, amount) {
        Ok(evt) => {
            info!(
                account = account.to_string(),
                currency_id,
                amount = amount.to_string(),
                "Deposited cash"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(
                account = account.to_string(),
                currency_id,
                err = err.to_string(),
                "Failed to deposit cash"
            );

            Err(err)
        },
    }
}

fn _do_deposit(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<EvtDeposit> {
    ensure_positive(amount)?;
    ensure_not_perpetual_token(state, account)?;
    state.currency(currency_id)?;

    state.add_cash(account, currency_id, amount)?;
    state.add_custody(currency_id, amount)?;

    Ok(EvtDeposit {
        account,
        currency_id,
        amount,
    })
}

// --------------------------------- withdraw ----------------------------------

pub fn do_withdraw(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<EvtWithdraw> {
    match _do_withdraw(state, account, currency_id, amount) {
        Ok(evt) => {
            info!(
                account = account.to_string(),
                currency_id,
                amount = amount.to_string(),
                "Withdrew cash"
            );

            Ok(evt)
        },
        Err(err) => {
            warn!(
                account = account.to_string(),
                currency_id,
                err = err.to_string(),
                "Failed to withdraw cash"
            );

            Err(err)
        },
    }
}

fn _do_withdraw(
    state: &mut LedgerState,
    account: Addr,
    currency_id: CurrencyId,
    amount: Int128,
) -> LedgerResult<EvtWithdraw> {
    ensure_positive(amount)?;
    ensure_not_perpetual_token(state, account)?;
    state.currency(currency_id)?;

    debit_cash(state, account, currency_id, amount)?;
    state.add_custody(currency_id, amount.checked_neg()?)?;

    Ok(EvtWithdraw {
        account,
        currency_id,
        amount,
    })
}

// ----------------------------------- tests -----------------------------------
