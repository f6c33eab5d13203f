use {
    crate::{CurrencyId, MAX_CURRENCIES},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Set of currency identifiers packed into a `u64`. Currency `i` occupies
/// bit `i - 1`.
#[derive(
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(transparent)]
pub struct CurrencyBitmap(u64);

impl CurrencyBitmap {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `false` if the id is out of range, leaving the bitmap as is.
    pub fn set(&mut self, currency_id: CurrencyId) -> bool {
        match Self::mask(currency_id) {
            Some(mask) => {
                self.0 |= mask;
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self, currency_id: CurrencyId) {
        if let Some(mask) = Self::mask(currency_id) {
            self.0 &= !mask;
        }
    }

    pub fn is_set(self, currency_id: CurrencyId) -> bool {
        Self::mask(currency_id).is_some_and(|mask| self.0 & mask != 0)
    }

    /// Set currency ids in ascending order.
    pub fn iter(self) -> impl Iterator<Item = CurrencyId> {
        (1..=MAX_CURRENCIES).filter(move |id| self.is_set(*id))
    }

    fn mask(currency_id: CurrencyId) -> Option<u64> {
        if currency_id == 0 || currency_id > MAX_CURRENCIES {
            return None;
        }

        Some(1 << (currency_id - 1))
    }
}

impl FromIterator<CurrencyId> for CurrencyBitmap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = CurrencyId>,
    {
        let mut bitmap = Self::EMPTY;
        for currency_id in iter {
            bitmap.set(currency_id);
        }
        bitmap
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_work() {
        let mut bitmap = CurrencyBitmap::EMPTY;
        assert!(bitmap.set(1));
        assert!(bitmap.set(64));
        assert!(!bitmap.set(0));
        assert!(!bitmap.set(65));

        assert_eq!(bitmap.bits(), 1 | (1 << 63));
        assert!(bitmap.is_set(1));
        assert!(bitmap.is_set(64));
        assert!(!bitmap.is_set(2));

        bitmap.clear(1);
        assert_eq!(bitmap.iter().collect::<Vec<_>>(), vec![64]);

        bitmap.clear(64);
        assert!(bitmap.is_empty());
    }

    #[test]
    fn iter_is_ascending() {
        let bitmap: CurrencyBitmap = [7, 2, 33].into_iter().collect();
        assert_eq!(bitmap.iter().collect::<Vec<_>>(), vec![2, 7, 33]);
    }
}
