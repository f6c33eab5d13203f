use {
    crate::{TestSuite, setup_tracing_subscriber},
    anyhow::{anyhow, ensure},
    std::{collections::BTreeMap, ops::Index},
    tenor_audit::check_system_invariants,
    tenor_ledger::{GenesisConfig, Ledger},
    tenor_math::Int128,
    tenor_types::{Addr, CurrencyConfig, CurrencyId, QUARTER},
    tracing::Level,
};

const DEFAULT_TRACING_LEVEL: Level = Level::INFO;

// One second into the second quarter, so that a ladder initialized at genesis
// has a full quarter until its front market matures.
const DEFAULT_GENESIS_TIME: u64 = QUARTER + 1;

/// Named accounts created by [`TestBuilder::add_account`].
#[derive(Debug, Clone, Default)]
pub struct TestAccounts(BTreeMap<&'static str, Addr>);

impl TestAccounts {
    pub fn get(&self, name: &str) -> Option<Addr> {
        self.0.get(name).copied()
    }

    pub fn addresses(&self) -> impl Iterator<Item = Addr> + '_ {
        self.0.values().copied()
    }
}

impl Index<&str> for TestAccounts {
    type Output = Addr;

    fn index(&self, name: &str) -> &Addr {
        self.0
            .get(name)
            .unwrap_or_else(|| panic!("no test account named `{name}`"))
    }
}

pub struct TestBuilder {
    tracing_level: Option<Level>,
    genesis_time: Option<u64>,
    currencies: Vec<CurrencyConfig>,
    accounts: Vec<(&'static str, BTreeMap<CurrencyId, Int128>)>,
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuilder {
    pub fn new() -> Self {
        Self {
            tracing_level: Some(DEFAULT_TRACING_LEVEL),
            genesis_time: None,
            currencies: vec![],
            accounts: vec![],
        }
    }

    /// Use `None` to not print logs at all.
    pub fn set_tracing_level(mut self, level: Option<Level>) -> Self {
        self.tracing_level = level;
        self
    }

    pub fn set_genesis_time(mut self, genesis_time: u64) -> Self {
        self.genesis_time = Some(genesis_time);
        self
    }

    pub fn add_currency(mut self, config: CurrencyConfig) -> Self {
        self.currencies.push(config);
        self
    }

    /// Adds an account that deposits the given cash balances at genesis.
    pub fn add_account<I>(mut self, name: &'static str, balances: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (CurrencyId, Int128)>,
    {
        ensure!(
            self.accounts.iter().all(|(existing, _)| *existing != name),
            "duplicate test account name `{name}`"
        );

        ensure!(
            self.accounts.len() < u8::MAX as usize,
            "too many test accounts"
        );

        self.accounts.push((name, balances.into_iter().collect()));

        Ok(self)
    }

    pub fn build(self) -> anyhow::Result<(TestSuite, TestAccounts)> {
        if let Some(level) = self.tracing_level {
            setup_tracing_subscriber(level);
        }

        let mut ledger = Ledger::from_config(GenesisConfig {
            genesis_time: self.genesis_time.unwrap_or(DEFAULT_GENESIS_TIME),
            currencies: self.currencies,
        })?;

        let mut accounts = TestAccounts::default();

        for (index, (name, balances)) in self.accounts.into_iter().enumerate() {
            let address = Addr::mock(index as u8 + 1);

            for (currency_id, amount) in balances {
                ledger.deposit(address, currency_id, amount)?;
            }

            accounts.0.insert(name, address);
        }

        check_system_invariants(ledger.state())
            .map_err(|violation| anyhow!("genesis state is inconsistent: {violation}"))?;

        Ok((TestSuite::new(ledger), accounts))
    }
}
