//! Malleability-safe signer recovery
//!
//! Recovery never fails loudly: any malformed, non-canonical or
//! unrecoverable signature yields [`Address::ZERO`], which callers
//! treat as "not an owner".

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, VerifyOnly};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;
use super::hash::Hash;
use super::keys::KeyError;

/// Half of the secp256k1 group order. Signatures with a larger `s` are
/// the malleated twin of a canonical signature and are rejected.
pub const HALF_CURVE_ORDER: Hash = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// A single `(v, r, s)` ECDSA signature
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    pub v: u8,
    pub r: Hash,
    pub s: Hash,
}

impl Signature {
    /// Encode as 65 bytes `r || s || v` in hex
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes.push(self.v);
        hex::encode(bytes)
    }

    /// Decode from 65 bytes `r || s || v` in hex
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        let stripped = text.trim().strip_prefix("0x").unwrap_or(text.trim());
        let bytes =
            hex::decode(stripped).map_err(|_| KeyError::InvalidSignature(text.to_string()))?;
        if bytes.len() != 65 {
            return Err(KeyError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", self.to_hex())
    }
}

impl TryFrom<String> for Signature {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_hex()
    }
}

/// Recovers the signer identity of a digest
pub trait SignatureVerifier: fmt::Debug + Send + Sync {
    /// Returns the signer, or [`Address::ZERO`] on any problem
    fn recover(&self, hash: &Hash, v: u8, r: &Hash, s: &Hash) -> Address;
}

/// [`SignatureVerifier`] backed by libsecp256k1 public-key recovery
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Secp256k1Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secp256k1Verifier")
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn recover(&self, hash: &Hash, v: u8, r: &Hash, s: &Hash) -> Address {
        // Byte order of a big-endian word is its numeric order.
        if s > &HALF_CURVE_ORDER {
            return Address::ZERO;
        }
        if v != 27 && v != 28 {
            return Address::ZERO;
        }

        let recovery_id = match RecoveryId::from_i32(i32::from(v - 27)) {
            Ok(id) => id,
            Err(_) => return Address::ZERO,
        };

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(r);
        compact[32..].copy_from_slice(s);

        let signature = match RecoverableSignature::from_compact(&compact, recovery_id) {
            Ok(sig) => sig,
            Err(_) => return Address::ZERO,
        };
        let message = match Message::from_digest_slice(hash) {
            Ok(msg) => msg,
            Err(_) => return Address::ZERO,
        };

        match self.secp.recover_ecdsa(&message, &signature) {
            Ok(public_key) => Address::from_public_key(&public_key),
            Err(_) => Address::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;
    use crate::crypto::KeyPair;
    use secp256k1::SecretKey;

    /// n - s, the high-s twin of a signature
    fn negate(s: &Hash) -> Hash {
        SecretKey::from_slice(s).unwrap().negate().secret_bytes()
    }

    #[test]
    fn test_recover_signer() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"transfer");
        let sig = kp.sign(&digest).unwrap();

        let verifier = Secp256k1Verifier::new();
        assert_eq!(verifier.recover(&digest, sig.v, &sig.r, &sig.s), kp.address());
    }

    #[test]
    fn test_wrong_digest_recovers_other_identity() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&keccak256(b"one")).unwrap();

        let verifier = Secp256k1Verifier::new();
        let recovered = verifier.recover(&keccak256(b"two"), sig.v, &sig.r, &sig.s);
        assert_ne!(recovered, kp.address());
    }

    #[test]
    fn test_high_s_rejected() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"malleable");
        let sig = kp.sign(&digest).unwrap();

        let high_s = negate(&sig.s);
        assert!(high_s > HALF_CURVE_ORDER);
        let flipped_v = if sig.v == 27 { 28 } else { 27 };

        let verifier = Secp256k1Verifier::new();
        assert_eq!(
            verifier.recover(&digest, flipped_v, &sig.r, &high_s),
            Address::ZERO
        );
        assert_eq!(verifier.recover(&digest, sig.v, &sig.r, &high_s), Address::ZERO);
    }

    #[test]
    fn test_non_canonical_v_rejected() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"v check");
        let sig = kp.sign(&digest).unwrap();

        let verifier = Secp256k1Verifier::new();
        for v in [0u8, 1, 26, 29, 35, 255] {
            assert_eq!(verifier.recover(&digest, v, &sig.r, &sig.s), Address::ZERO);
        }
    }

    #[test]
    fn test_garbage_signature_returns_zero() {
        let verifier = Secp256k1Verifier::new();
        let digest = keccak256(b"garbage");
        assert_eq!(verifier.recover(&digest, 27, &[0u8; 32], &[0u8; 32]), Address::ZERO);
    }

    #[test]
    fn test_hex_encoding() {
        let kp = KeyPair::generate();
        let sig = kp.sign(&keccak256(b"hex")).unwrap();

        let text = sig.to_hex();
        assert_eq!(text.len(), 130);
        assert_eq!(Signature::from_hex(&text).unwrap(), sig);
        assert_eq!(Signature::from_hex(&format!("0x{}", text)).unwrap(), sig);
        assert!(Signature::from_hex("abcd").is_err());
    }
}
