use crate::LedgerError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryInto;
use std::str::FromStr;

/// A 20-byte ledger address, displayed as hex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches("0x");
        let bytes = hex::decode(s).map_err(|_| LedgerError::AddressBadHex)?;
        let bytes: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| LedgerError::AddressBadLen)?;
        Ok(Address(bytes))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip() {
        let addr = Address::new([7u8; 20]);
        let displayed = addr.to_string();
        assert!(displayed.starts_with("0x"));
        assert_eq!(displayed.parse::<Address>().unwrap(), addr);
        // Bare hex without the prefix parses too.
        assert_eq!(hex::encode([7u8; 20]).parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn address_rejects_malformed() {
        assert!(matches!(
            "0xzz".parse::<Address>(),
            Err(LedgerError::AddressBadHex)
        ));
        assert!(matches!(
            "0xabcd".parse::<Address>(),
            Err(LedgerError::AddressBadLen)
        ));
    }
}
