use {
    crate::MathError,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{de, ser},
    std::{
        fmt::{self, Display},
        str::FromStr,
    },
};

/// A signed 128-bit integer used for every balance, notional, rate and ratio
/// in the ledger.
///
/// Arithmetic is only exposed through the checked methods of [`Number`](crate::Number)
/// and [`MultiplyRatio`](crate::MultiplyRatio), so an overflow surfaces as a
/// [`MathError`] instead of a panic or a silent wrap.
#[derive(
    BorshSerialize,
    BorshDeserialize,
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
pub struct Int128(i128);

impl Int128 {
    pub const MAX: Self = Self(i128::MAX);
    pub const MIN: Self = Self(i128::MIN);
    pub const ONE: Self = Self(1);
    pub const ZERO: Self = Self(0);

    pub const fn new(value: i128) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> i128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

impl From<i128> for Int128 {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

impl From<i64> for Int128 {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<u64> for Int128 {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl From<u32> for Int128 {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

impl TryFrom<Int128> for u64 {
    type Error = MathError;

    fn try_from(value: Int128) -> Result<Self, Self::Error> {
        u64::try_from(value.0).map_err(|_| MathError::overflow_conversion::<_, u64>(value))
    }
}

impl FromStr for Int128 {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        i128::from_str(s)
            .map(Self)
            .map_err(|err| MathError::parse_number::<Self>(s, err))
    }
}

impl Display for Int128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ser::Serialize for Int128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Int128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(Int128Visitor)
    }
}

struct Int128Visitor;

impl de::Visitor<'_> for Int128Visitor {
    type Value = Int128;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string-encoded or plain 128-bit signed integer")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Int128::from_str(v).map_err(E::custom)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Int128::from(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Int128::from(v))
    }

    fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Int128::new(v))
    }
}

// ----------------------------------- tests -----------------------------------
