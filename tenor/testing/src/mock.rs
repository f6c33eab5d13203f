use {
    tenor_math::Int128,
    tenor_types::{
        CashGroup, CurrencyConfig, CurrencyId, DepositParameters, InitializationParameters,
    },
};

pub const DAI: CurrencyId = 2;
pub const USDC: CurrencyId = 3;

/// Cash the perpetual token is seeded with in most scenarios, `100000e8`.
pub const INITIAL_CASH_AMOUNT: Int128 = Int128::new(100_000_00000000);

pub const ORACLE_TIME_WINDOW: u64 = 1200;

const RATE_SCALARS: [i128; 9] = [100, 100, 50, 50, 40, 40, 30, 30, 20];
const LIQUIDITY_TOKEN_HAIRCUTS: [u8; 9] = [99, 98, 97, 96, 95, 94, 93, 92, 91];

pub fn mock_cash_group(max_market_index: u8) -> CashGroup {
    let len = max_market_index as usize;

    CashGroup {
        max_market_index,
        rate_oracle_time_window: ORACLE_TIME_WINDOW,
        rate_scalars: RATE_SCALARS[..len].iter().copied().map(Int128::new).collect(),
        liquidity_token_haircuts: LIQUIDITY_TOKEN_HAIRCUTS[..len].to_vec(),
    }
}

/// A currency listed without perpetual token parameters. Governance supplies
/// them later.
pub fn mock_currency(currency_id: CurrencyId, symbol: &str, max_market_index: u8) -> CurrencyConfig {
    CurrencyConfig {
        currency_id,
        symbol: symbol.to_string(),
        decimals: 18,
        cash_group: mock_cash_group(max_market_index),
        deposit: None,
        initialization: None,
    }
}

pub fn deposit_parameters<const N: usize>(
    deposit_shares: [i128; N],
    leverage_thresholds: [i128; N],
) -> DepositParameters {
    DepositParameters {
        deposit_shares: deposit_shares.map(Int128::new).to_vec(),
        leverage_thresholds: leverage_thresholds.map(Int128::new).to_vec(),
    }
}

pub fn initialization_parameters<const N: usize>(
    rate_anchors: [i128; N],
    proportions: [i128; N],
) -> InitializationParameters {
    InitializationParameters {
        rate_anchors: rate_anchors.map(Int128::new).to_vec(),
        proportions: proportions.map(Int128::new).to_vec(),
    }
}
