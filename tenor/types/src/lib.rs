mod account;
mod address;
mod asset;
mod bitmap;
mod currency;
mod market;
mod params;
mod time;

pub use {
    account::*, address::*, asset::*, bitmap::*, currency::*, market::*, params::*, time::*,
};

/// Identifier of a listed currency. Valid identifiers are `1..=MAX_CURRENCIES`.
pub type CurrencyId = u16;

/// The active-currency bitmap is a `u64`, so at most 64 currencies can be listed.
pub const MAX_CURRENCIES: CurrencyId = 64;
