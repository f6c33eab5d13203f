use {
    crate::{Ledger, LedgerResult},
    config::{Config, Environment, File, Map},
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::path::Path,
    tenor_types::CurrencyConfig,
    tracing::info,
};

/// Environment variables with this prefix override file values, e.g.
/// `TENOR__GENESIS_TIME=7776000`.
pub const ENV_PREFIX: &str = "TENOR";

pub struct ConfigParser;

impl ConfigParser {
    /// Reads a configuration file and layers environment overrides on top.
    pub fn parse<D>(path: impl AsRef<Path>) -> LedgerResult<D>
    where
        D: DeserializeOwned,
    {
        Self::parse_with_env(path, None)
    }

    /// Same as [`parse`](Self::parse), taking the overrides from `env` instead
    /// of the process environment when given.
    pub fn parse_with_env<D>(
        path: impl AsRef<Path>,
        env: Option<Map<String, String>>,
    ) -> LedgerResult<D>
    where
        D: DeserializeOwned,
    {
        let env_override = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .source(env);

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_override)
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Initial state of a ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    pub genesis_time: u64,
    #[serde(default)]
    pub currencies: Vec<CurrencyConfig>,
}

impl Ledger {
    /// A ledger at `genesis_time` with every configured currency listed.
    pub fn from_config(config: GenesisConfig) -> LedgerResult<Self> {
        let mut ledger = Ledger::new(config.genesis_time);

        for currency in config.currencies {
            ledger.list_currency(currency)?;
        }

        info!(
            genesis_time = config.genesis_time,
            currencies = ledger.state().currencies().count(),
            "Built ledger from genesis config"
        );

        Ok(ledger)
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> LedgerResult<Self> {
        Self::from_config(ConfigParser::parse(path)?)
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        assertor::*,
        std::io::Write,
        tenor_math::Int128,
        tenor_types::QUARTER,
    };

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/genesis.toml");

    #[test]
    fn parse_fixture() {
        let config: GenesisConfig = ConfigParser::parse(FIXTURE).unwrap();

        assert_that!(config.currencies.len()).is_equal_to(2);

        let dai = &config.currencies[0];
        assert_that!(dai.symbol.as_str()).is_equal_to("DAI");
        assert_that!(dai.cash_group.max_market_index).is_equal_to(2);
        assert_that!(dai.deposit.as_ref().unwrap().deposit_shares.clone())
            .is_equal_to(vec![Int128::new(40_000_000), Int128::new(60_000_000)]);
        assert_that!(config.currencies[1].deposit.is_none()).is_true();
    }

    #[test]
    fn build_ledger_from_fixture() {
        let ledger = Ledger::from_config_file(FIXTURE).unwrap();

        assert_that!(ledger.state().currencies().count()).is_equal_to(2);
        assert_that!(
            ledger
                .state()
                .perpetual_token(2)
                .unwrap()
                .initialization
                .is_some()
        )
        .is_true();
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "genesis_time = 1").unwrap();

        let env = Map::from([("TENOR__GENESIS_TIME".to_string(), (3 * QUARTER).to_string())]);
        let config: GenesisConfig = ConfigParser::parse_with_env(file.path(), Some(env)).unwrap();

        assert_that!(config.genesis_time).is_equal_to(3 * QUARTER);
        assert_that!(config.currencies.is_empty()).is_true();
    }

    #[test]
    fn invalid_currency_fails_genesis() {
        let mut config: GenesisConfig = ConfigParser::parse(FIXTURE).unwrap();
        config.currencies[1].cash_group.max_market_index = 0;

        assert_that!(Ledger::from_config(config).is_err()).is_true();
    }
}
