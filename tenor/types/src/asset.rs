use {
    crate::CurrencyId,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::collections::{BTreeMap, btree_map},
    tenor_math::{Int128, MathResult, Number},
};

/// What a portfolio position is a claim on.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// A zero-coupon claim on underlying cash at maturity. Negative is a debt.
    FCash,
    /// A share of the market in ladder slot `market_index` (1-based).
    LiquidityToken { market_index: u8 },
}

impl AssetKind {
    pub const FCASH_ASSET_TYPE: u8 = 1;

    /// Numeric asset type: `1` for fCash, `1 + market_index` for the liquidity
    /// token of a market.
    pub const fn asset_type(self) -> u8 {
        match self {
            AssetKind::FCash => Self::FCASH_ASSET_TYPE,
            AssetKind::LiquidityToken { market_index } => Self::FCASH_ASSET_TYPE + market_index,
        }
    }

    pub const fn from_asset_type(asset_type: u8) -> Option<Self> {
        match asset_type {
            0 => None,
            Self::FCASH_ASSET_TYPE => Some(AssetKind::FCash),
            _ => Some(AssetKind::LiquidityToken {
                market_index: asset_type - Self::FCASH_ASSET_TYPE,
            }),
        }
    }

    pub const fn is_fcash(self) -> bool {
        matches!(self, AssetKind::FCash)
    }

    pub const fn market_index(self) -> Option<u8> {
        match self {
            AssetKind::FCash => None,
            AssetKind::LiquidityToken { market_index } => Some(market_index),
        }
    }
}

/// Uniquely identifies a position within one account's portfolio.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct AssetKey {
    pub currency_id: CurrencyId,
    pub maturity: u64,
    pub kind: AssetKind,
}

impl AssetKey {
    pub const fn fcash(currency_id: CurrencyId, maturity: u64) -> Self {
        Self {
            currency_id,
            maturity,
            kind: AssetKind::FCash,
        }
    }

    pub const fn liquidity_token(currency_id: CurrencyId, maturity: u64, market_index: u8) -> Self {
        Self {
            currency_id,
            maturity,
            kind: AssetKind::LiquidityToken { market_index },
        }
    }
}

/// A position as exposed to queries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub currency_id: CurrencyId,
    pub maturity: u64,
    pub kind: AssetKind,
    pub notional: Int128,
}

/// The set of positions held by an account, at most one per [`AssetKey`].
///
/// Positions whose notional drops to zero are removed, so an empty portfolio
/// really holds nothing.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    assets: BTreeMap<AssetKey, Int128>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn get(&self, key: &AssetKey) -> Int128 {
        self.assets.get(key).copied().unwrap_or_default()
    }

    /// Adds `delta` to the notional at `key`, removing the position if it
    /// nets to zero. Returns the new notional.
    pub fn add(&mut self, key: AssetKey, delta: Int128) -> MathResult<Int128> {
        let updated = self.get(&key).checked_add(delta)?;

        if updated.is_zero() {
            self.assets.remove(&key);
        } else {
            self.assets.insert(key, updated);
        }

        Ok(updated)
    }

    /// Removes the position at `key` and returns its notional (zero if none).
    pub fn remove(&mut self, key: &AssetKey) -> Int128 {
        self.assets.remove(key).unwrap_or_default()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AssetKey, Int128> {
        self.assets.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.assets.keys()
    }

    pub fn assets(&self) -> impl Iterator<Item = Asset> + '_ {
        self.assets.iter().map(|(key, notional)| Asset {
            currency_id: key.currency_id,
            maturity: key.maturity,
            kind: key.kind,
            notional: *notional,
        })
    }

    /// Keys of every position in `currency_id` matching the predicate, cloned
    /// so the caller can mutate the portfolio while walking them.
    pub fn keys_where<F>(&self, currency_id: CurrencyId, predicate: F) -> Vec<AssetKey>
    where
        F: Fn(&AssetKey) -> bool,
    {
        self.assets
            .keys()
            .filter(|key| key.currency_id == currency_id && predicate(key))
            .copied()
            .collect()
    }

    pub fn min_maturity(&self) -> Option<u64> {
        self.assets.keys().map(|key| key.maturity).min()
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[test_case(AssetKind::FCash, 1 ; "fcash")]
    #[test_case(AssetKind::LiquidityToken { market_index: 1 }, 2 ; "three month liquidity")]
    #[test_case(AssetKind::LiquidityToken { market_index: 9 }, 10 ; "twenty year liquidity")]
    fn asset_type_works(kind: AssetKind, asset_type: u8) {
        assert_eq!(kind.asset_type(), asset_type);
        assert_eq!(AssetKind::from_asset_type(asset_type), Some(kind));
    }

    #[test]
    fn asset_type_zero_is_invalid() {
        assert_eq!(AssetKind::from_asset_type(0), None);
    }

    #[test]
    fn zero_positions_are_removed() {
        let mut portfolio = Portfolio::new();
        let key = AssetKey::fcash(1, 100);

        portfolio.add(key, Int128::new(-50)).unwrap();
        assert_eq!(portfolio.get(&key), Int128::new(-50));
        assert_eq!(portfolio.len(), 1);

        portfolio.add(key, Int128::new(50)).unwrap();
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.get(&key), Int128::ZERO);
    }

    #[test]
    fn keys_are_unique_per_kind() {
        let mut portfolio = Portfolio::new();
        portfolio.add(AssetKey::fcash(1, 100), Int128::new(5)).unwrap();
        portfolio
            .add(AssetKey::liquidity_token(1, 100, 1), Int128::new(7))
            .unwrap();
        portfolio.add(AssetKey::fcash(2, 50), Int128::new(1)).unwrap();

        assert_eq!(portfolio.len(), 3);
        assert_eq!(portfolio.min_maturity(), Some(50));
        assert_eq!(
            portfolio.keys_where(1, |key| key.kind.is_fcash()),
            vec![AssetKey::fcash(1, 100)]
        );
    }
}
