use {
    crate::{LedgerError, LedgerResult},
    borsh::{BorshDeserialize, BorshSerialize},
    std::collections::{BTreeMap, BTreeSet},
    tenor_math::{Int128, Number},
    tenor_types::{
        Account, AccountContext, Addr, AssetKey, BalanceState, Currency, CurrencyId, Market,
        MarketKey, PerpetualToken, Portfolio, maturity_ladder, settlement_date_for, time_ref,
    },
};

/// The complete state of the ledger.
///
/// Operations write to accounts through `account_mut`, which remembers the
/// address so that the commit at the end of a transaction can refresh its
/// cached context. Writing to the fields directly skips that refresh.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub block_time: u64,
    pub accounts: BTreeMap<Addr, Account>,
    pub markets: BTreeMap<MarketKey, Market>,
    pub currencies: BTreeMap<CurrencyId, Currency>,
    pub perpetual_tokens: BTreeMap<CurrencyId, PerpetualToken>,
    /// Units of each currency held by the ledger on behalf of its users.
    pub custody: BTreeMap<CurrencyId, Int128>,
    #[borsh(skip)]
    touched: BTreeSet<Addr>,
}

impl LedgerState {
    pub fn new(genesis_time: u64) -> Self {
        Self {
            block_time: genesis_time,
            ..Default::default()
        }
    }

    // ---------------------------------- queries ----------------------------------

    pub fn block_time(&self) -> u64 {
        self.block_time
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Addr, &Account)> {
        self.accounts.iter()
    }

    pub fn account(&self, address: &Addr) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn balance_state(&self, address: &Addr, currency_id: CurrencyId) -> BalanceState {
        self.accounts
            .get(address)
            .map(|account| account.balance(currency_id))
            .unwrap_or_default()
    }

    pub fn cash_balance(&self, address: &Addr, currency_id: CurrencyId) -> Int128 {
        self.balance_state(address, currency_id).cash_balance
    }

    pub fn perpetual_token_balance(&self, address: &Addr, currency_id: CurrencyId) -> Int128 {
        self.balance_state(address, currency_id)
            .perpetual_token_balance
    }

    pub fn portfolio(&self, address: &Addr) -> Portfolio {
        self.accounts
            .get(address)
            .map(|account| account.portfolio.clone())
            .unwrap_or_default()
    }

    pub fn account_context(&self, address: &Addr) -> AccountContext {
        self.accounts
            .get(address)
            .map(|account| account.context.clone())
            .unwrap_or_default()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    pub fn currency(&self, currency_id: CurrencyId) -> LedgerResult<&Currency> {
        self.currencies
            .get(&currency_id)
            .ok_or(LedgerError::CurrencyNotListed { currency_id })
    }

    pub fn perpetual_tokens(&self) -> impl Iterator<Item = &PerpetualToken> {
        self.perpetual_tokens.values()
    }

    pub fn perpetual_token(&self, currency_id: CurrencyId) -> LedgerResult<&PerpetualToken> {
        self.perpetual_tokens
            .get(&currency_id)
            .ok_or(LedgerError::CurrencyNotListed { currency_id })
    }

    /// Currency whose perpetual token lives at `address`, if any.
    pub fn perpetual_token_currency(&self, address: &Addr) -> Option<CurrencyId> {
        self.perpetual_tokens
            .keys()
            .copied()
            .find(|currency_id| Addr::perpetual_token(*currency_id) == *address)
    }

    pub fn custodial_balance(&self, currency_id: CurrencyId) -> Int128 {
        self.custody.get(&currency_id).copied().unwrap_or_default()
    }

    pub fn market(&self, key: &MarketKey) -> Option<&Market> {
        self.markets.get(key)
    }

    /// The market a liquidity token position is a share of.
    pub fn liquidity_token_market(&self, key: &AssetKey) -> LedgerResult<&Market> {
        let market_index = key.kind.market_index().unwrap_or_default();
        let not_found = || LedgerError::MarketNotFound {
            currency_id: key.currency_id,
            market_index,
            time_ref: settlement_date_for(key.maturity, market_index).unwrap_or_default(),
        };

        let settlement_date = settlement_date_for(key.maturity, market_index).ok_or_else(not_found)?;

        self.markets
            .get(&MarketKey {
                currency_id: key.currency_id,
                settlement_date,
                maturity: key.maturity,
            })
            .ok_or_else(not_found)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    /// Markets of the ladder that was active at `time`, ordered by market
    /// index. Slots that were never initialized are skipped.
    pub fn active_markets_at(&self, currency_id: CurrencyId, time: u64) -> Vec<Market> {
        let Some(currency) = self.currencies.get(&currency_id) else {
            return vec![];
        };

        let settlement_date = time_ref(time);

        maturity_ladder(time, currency.cash_group.max_market_index)
            .into_iter()
            .filter_map(|maturity| {
                self.markets
                    .get(&MarketKey {
                        currency_id,
                        settlement_date,
                        maturity,
                    })
                    .cloned()
            })
            .collect()
    }

    pub fn active_markets(&self, currency_id: CurrencyId) -> Vec<Market> {
        self.active_markets_at(currency_id, self.block_time)
    }

    /// Every market of a currency created by the ladder settled at
    /// `settlement_date`, whatever the cash group looks like now.
    pub fn markets_settled_at(
        &self,
        currency_id: CurrencyId,
        settlement_date: u64,
    ) -> impl Iterator<Item = &Market> {
        let start = MarketKey {
            currency_id,
            settlement_date,
            maturity: 0,
        };
        let end = MarketKey {
            currency_id,
            settlement_date,
            maturity: u64::MAX,
        };

        self.markets.range(start..=end).map(|(_, market)| market)
    }

    // --------------------------------- mutations ---------------------------------

    pub(crate) fn account_mut(&mut self, address: Addr) -> &mut Account {
        self.touched.insert(address);
        self.accounts.entry(address).or_default()
    }

    pub(crate) fn currency_mut(&mut self, currency_id: CurrencyId) -> LedgerResult<&mut Currency> {
        self.currencies
            .get_mut(&currency_id)
            .ok_or(LedgerError::CurrencyNotListed { currency_id })
    }

    pub(crate) fn perpetual_token_mut(
        &mut self,
        currency_id: CurrencyId,
    ) -> LedgerResult<&mut PerpetualToken> {
        self.perpetual_tokens
            .get_mut(&currency_id)
            .ok_or(LedgerError::CurrencyNotListed { currency_id })
    }

    pub(crate) fn set_market(&mut self, market: Market) {
        self.markets.insert(market.key(), market);
    }

    pub(crate) fn add_cash(
        &mut self,
        address: Addr,
        currency_id: CurrencyId,
        delta: Int128,
    ) -> LedgerResult<Int128> {
        let balance = self.account_mut(address).balance_mut(currency_id);
        balance.cash_balance = balance.cash_balance.checked_add(delta)?;
        Ok(balance.cash_balance)
    }

    pub(crate) fn add_custody(&mut self, currency_id: CurrencyId, delta: Int128) -> LedgerResult<()> {
        let custody = self.custody.entry(currency_id).or_default();
        *custody = custody.checked_add(delta)?;
        Ok(())
    }

    /// Recomputes the cached context of every account touched since the last
    /// commit and drops accounts left with nothing in them.
    pub(crate) fn commit(&mut self) {
        for address in std::mem::take(&mut self.touched) {
            if let Some(account) = self.accounts.get_mut(&address) {
                account.refresh_context();

                if account.balances.is_empty() && account.portfolio.is_empty() {
                    self.accounts.remove(&address);
                }
            }
        }
    }

    // --------------------------------- snapshots ---------------------------------

    /// Serializes a committed state.
    pub fn to_bytes(&self) -> LedgerResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|err| LedgerError::Snapshot(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> LedgerResult<Self> {
        borsh::from_slice(bytes).map_err(|err| LedgerError::Snapshot(err.to_string()))
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_refreshes_touched_accounts() {
        let mut state = LedgerState::new(0);
        let alice = Addr::mock(1);

        state.add_cash(alice, 1, Int128::new(-5)).unwrap();
        assert_eq!(state.account_context(&alice), AccountContext::default());

        state.commit();
        let context = state.account_context(&alice);
        assert!(context.has_debt);
        assert!(context.active_currencies.is_set(1));
    }

    #[test]
    fn commit_drops_emptied_accounts() {
        let mut state = LedgerState::new(0);
        let alice = Addr::mock(1);

        state.add_cash(alice, 1, Int128::new(5)).unwrap();
        state.commit();
        assert!(state.account(&alice).is_some());

        state.add_cash(alice, 1, Int128::new(-5)).unwrap();
        state.commit();
        assert!(state.account(&alice).is_none());
    }

    #[test]
    fn snapshot_restores_state() {
        let mut state = LedgerState::new(12_345);
        let alice = Addr::mock(1);

        state.add_cash(alice, 1, Int128::new(100)).unwrap();
        state.add_custody(1, Int128::new(100)).unwrap();
        state
            .account_mut(alice)
            .portfolio
            .add(AssetKey::fcash(1, 7_776_000), Int128::new(-3))
            .unwrap();
        state.commit();

        let restored = LedgerState::from_bytes(&state.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.block_time(), 12_345);
        assert_eq!(restored.custodial_balance(1), Int128::new(100));
    }

    #[test]
    fn garbage_snapshot_is_rejected() {
        assert!(matches!(
            LedgerState::from_bytes(&[1, 2, 3]),
            Err(LedgerError::Snapshot(_))
        ));
    }
}
