//! Typed, domain-bound transaction digests
//!
//! The digest an owner signs is built in three layers:
//!
//! ```text
//! struct_hash     = keccak(TX_TYPE_HASH || destination || value || keccak(payload) || nonce)
//! structured_hash = keccak(0x19 0x01 || domain_separator || struct_hash)
//! final_hash      = keccak("\x19Ethereum Signed Message:\n32" || structured_hash)
//! ```
//!
//! The domain separator binds the digest to one vault instance on one
//! network, so a signature can never be replayed elsewhere.

use crate::crypto::hash::hex_serde;
use crate::crypto::{keccak256, keccak256_concat, u128_word, u64_word, Address, Hash};
use serde::{Deserialize, Serialize};

/// Schema of the signing domain
pub const DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)";

/// Protocol name bound into the domain
pub const PROTOCOL_NAME: &[u8] = b"Simple MultiSig";

/// Protocol version bound into the domain
pub const PROTOCOL_VERSION: &[u8] = b"1";

/// Schema of the signed transaction
pub const TX_TYPE: &[u8] =
    b"MultiSigTransaction(address destination,uint256 value,bytes data,uint256 nonce)";

/// Fixed domain salt
pub const DOMAIN_SALT: Hash = [
    0x25, 0x15, 0x43, 0xaf, 0x6a, 0x22, 0x23, 0x78, 0x66, 0x5a, 0x76, 0xfe, 0x38, 0xdb, 0xce, 0xae,
    0x48, 0x71, 0xa0, 0x70, 0xb7, 0xfd, 0xaf, 0x5c, 0x6c, 0x30, 0xcf, 0x75, 0x8d, 0xc3, 0x3c, 0xc0,
];

/// Prefix of a structured (typed) digest
pub const STRUCTURED_PREFIX: &[u8] = b"\x19\x01";

/// Personal-sign prefix for a 32-byte message
pub const SIGNING_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Compute the domain separator of a vault instance
pub fn domain_separator(network_id: u64, instance: &Address) -> Hash {
    keccak256_concat(&[
        &keccak256(DOMAIN_TYPE),
        &keccak256(PROTOCOL_NAME),
        &keccak256(PROTOCOL_VERSION),
        &u64_word(network_id),
        &instance.to_word(),
        &DOMAIN_SALT,
    ])
}

/// What the owners agree to do: send `value` and `payload` to `destination`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub destination: Address,
    pub value: u128,
    #[serde(with = "hex_serde::bytes")]
    pub payload: Vec<u8>,
}

impl TransactionIntent {
    pub fn new(destination: Address, value: u128, payload: Vec<u8>) -> Self {
        Self {
            destination,
            value,
            payload,
        }
    }

    /// A plain value transfer with no call data
    pub fn transfer(destination: Address, value: u128) -> Self {
        Self::new(destination, value, Vec::new())
    }

    /// Hash of the transaction fields at `nonce`
    pub fn struct_hash(&self, nonce: u64) -> Hash {
        keccak256_concat(&[
            &keccak256(TX_TYPE),
            &self.destination.to_word(),
            &u128_word(self.value),
            &keccak256(&self.payload),
            &u64_word(nonce),
        ])
    }

    /// The digest owners must sign to authorize this intent at `nonce`
    pub fn signing_hash(&self, domain_separator: &Hash, nonce: u64) -> Hash {
        let structured = keccak256_concat(&[
            STRUCTURED_PREFIX,
            domain_separator,
            &self.struct_hash(nonce),
        ]);
        keccak256_concat(&[SIGNING_PREFIX, &structured])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    #[test]
    fn test_type_hashes() {
        // keccak256("1")
        assert_eq!(
            hex::encode(keccak256(PROTOCOL_VERSION)),
            "c89efdaa54c0f20c7adf612882df0950f5a951637e0307cdcb4c672f298b8bc6"
        );
        assert_eq!(
            hex::encode(keccak256(DOMAIN_TYPE)),
            "d87cd6ef79d4e2b95e15ce8abf732db51ec771f1ca2edccf22a46c729ac56472"
        );
    }

    #[test]
    fn test_domain_separator_binds_instance_and_network() {
        let base = domain_separator(1, &addr(1));
        assert_eq!(base, domain_separator(1, &addr(1)));
        assert_ne!(base, domain_separator(2, &addr(1)));
        assert_ne!(base, domain_separator(1, &addr(2)));
    }

    #[test]
    fn test_signing_hash_covers_every_field() {
        let domain = domain_separator(1, &addr(9));
        let intent = TransactionIntent::new(addr(1), 5, vec![0xde, 0xad]);
        let base = intent.signing_hash(&domain, 0);

        assert_eq!(base, intent.signing_hash(&domain, 0));
        assert_ne!(base, intent.signing_hash(&domain, 1));
        assert_ne!(base, intent.signing_hash(&domain_separator(2, &addr(9)), 0));

        let other_dest = TransactionIntent::new(addr(2), 5, vec![0xde, 0xad]);
        assert_ne!(base, other_dest.signing_hash(&domain, 0));

        let other_value = TransactionIntent::new(addr(1), 6, vec![0xde, 0xad]);
        assert_ne!(base, other_value.signing_hash(&domain, 0));

        let other_payload = TransactionIntent::new(addr(1), 5, vec![0xde, 0xae]);
        assert_ne!(base, other_payload.signing_hash(&domain, 0));
    }

    #[test]
    fn test_signing_hash_layers() {
        let domain = domain_separator(1, &addr(9));
        let intent = TransactionIntent::transfer(addr(1), 0);

        let mut structured_input = Vec::new();
        structured_input.extend_from_slice(&[0x19, 0x01]);
        structured_input.extend_from_slice(&domain);
        structured_input.extend_from_slice(&intent.struct_hash(3));
        let structured = keccak256(&structured_input);

        let mut final_input = b"\x19Ethereum Signed Message:\n32".to_vec();
        final_input.extend_from_slice(&structured);

        assert_eq!(intent.signing_hash(&domain, 3), keccak256(&final_input));
    }

    #[test]
    fn test_intent_serde() {
        let intent = TransactionIntent::new(addr(1), 42, vec![1, 2, 3]);
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("\"010203\""));
        let back: TransactionIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }
}
