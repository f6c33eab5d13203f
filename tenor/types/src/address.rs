use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{de, ser},
    sha2::{Digest, Sha256},
    std::{
        fmt::{self, Display},
        str::FromStr,
    },
    thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address `{input}`: {reason}")]
pub struct AddrParseError {
    input: String,
    reason: String,
}

/// An account address: 20 bytes, displayed as `0x`-prefixed lowercase hex.
#[derive(
    BorshSerialize, BorshDeserialize, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Addr([u8; Addr::LENGTH]);

impl Addr {
    pub const LENGTH: usize = 20;

    pub const fn from_array(array: [u8; Self::LENGTH]) -> Self {
        Self(array)
    }

    /// Generate a mock address for use in testing.
    pub const fn mock(index: u8) -> Self {
        let mut bytes = [0; Self::LENGTH];
        bytes[Self::LENGTH - 1] = index;
        Self(bytes)
    }

    /// Address of the perpetual token account of a currency:
    ///
    /// ```plain
    /// address := sha256("perpetual_token" | currency_id_be)[..20]
    /// ```
    pub fn perpetual_token(currency_id: u16) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"perpetual_token");
        hasher.update(currency_id.to_be_bytes());
        let hash = hasher.finalize();

        let mut bytes = [0; Self::LENGTH];
        bytes.copy_from_slice(&hash[..Self::LENGTH]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({self})")
    }
}

impl FromStr for Addr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| AddrParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let hex_str = s.strip_prefix("0x").ok_or_else(|| err("missing 0x prefix"))?;
        let bytes = hex::decode(hex_str).map_err(|e| err(&e.to_string()))?;
        let array = <[u8; Self::LENGTH]>::try_from(bytes.as_slice())
            .map_err(|_| err("address must be 20 bytes"))?;

        Ok(Self(array))
    }
}

impl ser::Serialize for Addr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Addr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = <String as de::Deserialize>::deserialize(deserializer)?;
        Addr::from_str(&s).map_err(de::Error::custom)
    }
}

// ----------------------------------- tests -----------------------------------
