use crate::Int128;

/// Basis for implied rates, oracle rates, proportions, exchange rates, rate
/// anchors and leverage thresholds. `1e9` represents `1.0`.
pub const RATE_PRECISION: Int128 = Int128::new(1_000_000_000);

/// Basis for every cash, fCash, liquidity token and perpetual token notional.
pub const INTERNAL_TOKEN_PRECISION: Int128 = Int128::new(100_000_000);

/// Basis for perpetual token deposit shares. A 40% share is `0.4e8`.
pub const DEPOSIT_SHARE_PRECISION: Int128 = Int128::new(100_000_000);

/// Scale used internally by `ln` and `exp`, nine digits finer than
/// [`RATE_PRECISION`].
pub(crate) const WAD: i128 = 1_000_000_000_000_000_000;

/// `ln(2)` at [`WAD`] scale.
pub(crate) const LN_2_WAD: i128 = 693_147_180_559_945_309;
