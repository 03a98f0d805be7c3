//! Signature bundles submitted for authorization
//!
//! A bundle is three parallel sequences `(v, r, s)`, one entry per
//! signer, ordered by ascending signer address.

use crate::crypto::{Hash, KeyError, KeyPair, Signature};
use crate::multisig::message::TransactionIntent;
use serde::{Deserialize, Serialize};

/// Parallel `(v, r, s)` signature components
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBundle {
    pub v: Vec<u8>,
    pub r: Vec<Hash>,
    pub s: Vec<Hash>,
}

impl SignatureBundle {
    pub fn new(v: Vec<u8>, r: Vec<Hash>, s: Vec<Hash>) -> Self {
        Self { v, r, s }
    }

    /// Build a bundle from individual signatures, keeping their order
    pub fn from_signatures(signatures: &[Signature]) -> Self {
        let mut bundle = Self::default();
        for sig in signatures {
            bundle.push(*sig);
        }
        bundle
    }

    /// Parse comma-separated `r || s || v` hex signatures
    pub fn from_hex_list(list: &str) -> Result<Self, KeyError> {
        let signatures = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Signature::from_hex)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_signatures(&signatures))
    }

    pub fn push(&mut self, signature: Signature) {
        self.v.push(signature.v);
        self.r.push(signature.r);
        self.s.push(signature.s);
    }

    /// True when all three component sequences have exactly `len` entries
    pub fn has_len(&self, len: usize) -> bool {
        self.v.len() == len && self.r.len() == len && self.s.len() == len
    }

    /// Number of complete signatures; only meaningful for a well-formed bundle
    pub fn len(&self) -> usize {
        self.v.len().min(self.r.len()).min(self.s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Helper to sign an intent for a vault at a given nonce
pub fn sign_intent(
    key_pair: &KeyPair,
    domain_separator: &Hash,
    intent: &TransactionIntent,
    nonce: u64,
) -> Result<Signature, KeyError> {
    let digest = intent.signing_hash(domain_separator, nonce);
    key_pair.sign(&digest)
}
