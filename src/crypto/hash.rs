//! Keccak-256 hashing utilities
//!
//! Provides the hash primitive used for address derivation, domain
//! separation and the typed transaction digest, plus helpers for building
//! 32-byte ABI-style words.

use sha3::{Digest, Keccak256};

/// A 32-byte hash value
pub type Hash = [u8; 32];

/// Computes Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(out.as_slice());
    hash
}

/// Computes Keccak-256 over the concatenation of several byte slices
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let out = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(out.as_slice());
    hash
}

/// Computes Keccak-256 hash and returns it as a hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

/// Left-pads a big-endian integer into a 32-byte word
pub fn u128_word(value: u128) -> Hash {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-pads a `u64` into a 32-byte word
pub fn u64_word(value: u64) -> Hash {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Serde helpers encoding bytes as hex strings
pub mod hex_serde {
    /// `Vec<u8>` as a hex string
    pub mod bytes {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&hex::encode(bytes))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<u8>, D::Error> {
            let text = String::deserialize(deserializer)?;
            hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(serde::de::Error::custom)
        }
    }

    /// A 32-byte [`Hash`](super::Hash) as a hex string
    pub mod word {
        use super::super::Hash;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&hex::encode(hash))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
            let text = String::deserialize(deserializer)?;
            let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(&text))
                .map_err(serde::de::Error::custom)?;
            bytes
                .try_into()
                .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
        }
    }
}
