use {
    crate::{CurrencyBitmap, CurrencyId, Portfolio},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
    tenor_math::Int128,
};

/// Balances an account holds in one currency.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Default, Debug, Clone, PartialEq, Eq,
)]
pub struct BalanceState {
    pub cash_balance: Int128,
    pub perpetual_token_balance: Int128,
    pub last_mint_time: u64,
}

impl BalanceState {
    pub fn is_empty(&self) -> bool {
        self.cash_balance.is_zero() && self.perpetual_token_balance.is_zero()
    }
}

/// Summary of an account, cached so that it doesn't need to be derived from
/// the balances and portfolio on every read.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Default, Debug, Clone, PartialEq, Eq,
)]
pub struct AccountContext {
    /// Earliest maturity among the portfolio's positions, or zero if the
    /// portfolio is empty.
    pub next_maturity: u64,
    pub has_debt: bool,
    pub active_currencies: CurrencyBitmap,
}

impl AccountContext {
    pub fn compute(account: &Account) -> Self {
        let next_maturity = account.portfolio.min_maturity().unwrap_or(0);

        let has_debt = account
            .balances
            .values()
            .any(|balance| balance.cash_balance.is_negative())
            || account
                .portfolio
                .iter()
                .any(|(key, notional)| key.kind.is_fcash() && notional.is_negative());

        let active_currencies = account
            .balances
            .iter()
            .filter(|(_, balance)| !balance.is_empty())
            .map(|(currency_id, _)| *currency_id)
            .collect();

        Self {
            next_maturity,
            has_debt,
            active_currencies,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub balances: BTreeMap<CurrencyId, BalanceState>,
    pub portfolio: Portfolio,
    pub context: AccountContext,
}

impl Account {
    pub fn balance(&self, currency_id: CurrencyId) -> BalanceState {
        self.balances.get(&currency_id).cloned().unwrap_or_default()
    }

    pub fn balance_mut(&mut self, currency_id: CurrencyId) -> &mut BalanceState {
        self.balances.entry(currency_id).or_default()
    }

    pub fn cash_balance(&self, currency_id: CurrencyId) -> Int128 {
        self.balance(currency_id).cash_balance
    }

    pub fn perpetual_token_balance(&self, currency_id: CurrencyId) -> Int128 {
        self.balance(currency_id).perpetual_token_balance
    }

    /// Refreshes the cached context. Balance entries that have been emptied
    /// are dropped first unless they carry a mint time.
    pub fn refresh_context(&mut self) {
        self.balances
            .retain(|_, balance| !balance.is_empty() || balance.last_mint_time != 0);
        self.context = AccountContext::compute(self);
    }
}

// ----------------------------------- tests -----------------------------------
