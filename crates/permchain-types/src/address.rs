// LEDGER IDENTITIES
// 20-byte account/contract addresses and 4-byte function selectors
//
// SAFETY INVARIANTS:
// 1. Both types are plain values: equality, ordering and hashing are bytewise
// 2. Text form is always 0x-prefixed lowercase hex (identical on every node)
// 3. Selectors are derived as keccak256(signature)[..4]

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use crate::error::AclError;

/// Account or contract identity on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Address whose last eight bytes carry `value` big-endian.
    ///
    /// Reserved system addresses are laid out this way.
    pub const fn from_low_u64(value: u64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Address(bytes)
    }

    /// Take the trailing 20 bytes of a 32-byte digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(raw).map_err(|_| AclError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| AclError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Four-byte function selector identifying a callable operation on a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FuncSig([u8; 4]);

impl FuncSig {
    pub const fn new(bytes: [u8; 4]) -> Self {
        FuncSig(bytes)
    }

    /// Selector for a canonical signature such as `setAuthorization(address,address)`.
    pub fn from_signature(signature: &str) -> Self {
        let digest = Keccak256::digest(signature.as_bytes());
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&digest[..4]);
        FuncSig(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FuncSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for FuncSig {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(raw).map_err(|_| AclError::InvalidSelector(s.to_string()))?;
        let bytes: [u8; 4] = decoded
            .try_into()
            .map_err(|_| AclError::InvalidSelector(s.to_string()))?;
        Ok(FuncSig(bytes))
    }
}

impl Serialize for FuncSig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FuncSig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
