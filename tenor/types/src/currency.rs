use {
    crate::{
        Addr, CashGroup, CurrencyId, DepositParameters, InitializationParameters, MAX_CURRENCIES,
        ParamsError, ParamsResult,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    tenor_math::Int128,
};

/// A listed currency.
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct Currency {
    pub id: CurrencyId,
    pub symbol: String,
    pub decimals: u8,
    /// Block time at which the currency was listed. The audit walks every
    /// ladder from this quarter onwards.
    pub listing_time: u64,
    pub cash_group: CashGroup,
    /// Quarter boundary of the most recent market initialization, if any.
    pub last_initialized: Option<u64>,
}

/// Supply and governance parameters of a currency's perpetual liquidity token.
///
/// The token's cash and portfolio are held in the regular account at
/// [`Addr::perpetual_token`].
#[derive(
    Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq,
)]
pub struct PerpetualToken {
    pub currency_id: CurrencyId,
    pub total_supply: Int128,
    pub deposit: Option<DepositParameters>,
    pub initialization: Option<InitializationParameters>,
}

impl PerpetualToken {
    pub fn new(currency_id: CurrencyId) -> Self {
        Self {
            currency_id,
            total_supply: Int128::ZERO,
            deposit: None,
            initialization: None,
        }
    }

    pub fn address(&self) -> Addr {
        Addr::perpetual_token(self.currency_id)
    }

    pub fn deposit_parameters(&self) -> ParamsResult<&DepositParameters> {
        self.deposit.as_ref().ok_or(ParamsError::Missing {
            currency_id: self.currency_id,
            what: "deposit parameters",
        })
    }

    pub fn initialization_parameters(&self) -> ParamsResult<&InitializationParameters> {
        self.initialization.as_ref().ok_or(ParamsError::Missing {
            currency_id: self.currency_id,
            what: "initialization parameters",
        })
    }
}

/// Everything governance supplies to list a currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrencyConfig {
    pub currency_id: CurrencyId,
    pub symbol: String,
    #[serde(default = "CurrencyConfig::default_decimals")]
    pub decimals: u8,
    pub cash_group: CashGroup,
    #[serde(default)]
    pub deposit: Option<DepositParameters>,
    #[serde(default)]
    pub initialization: Option<InitializationParameters>,
}

impl CurrencyConfig {
    fn default_decimals() -> u8 {
        8
    }

    pub fn validate(&self) -> ParamsResult<()> {
        if self.currency_id == 0 || self.currency_id > MAX_CURRENCIES {
            return Err(ParamsError::CurrencyIdOutOfRange {
                currency_id: self.currency_id,
            });
        }

        self.cash_group.validate()?;

        if let Some(deposit) = &self.deposit {
            deposit.validate(self.cash_group.max_market_index)?;
        }

        if let Some(initialization) = &self.initialization {
            initialization.validate(self.cash_group.max_market_index)?;
        }

        Ok(())
    }
}

// ----------------------------------- tests -----------------------------------
