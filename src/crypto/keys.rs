//! ECDSA key management for multisig owners
//!
//! Provides key pair generation and recoverable signing using
//! the secp256k1 elliptic curve.

use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::address::Address;
use super::hash::Hash;
use super::signature::Signature;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let stripped = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// The owner identity controlled by this key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a recoverable `(v, r, s)` signature
    pub fn sign(&self, digest: &Hash) -> Result<Signature, KeyError> {
        sign_digest(&self.secret_key, digest)
    }
}

/// Sign a 32-byte digest with a secret key
///
/// The produced signature always carries a low `s` and `v` in {27, 28}.
pub fn sign_digest(secret_key: &SecretKey, digest: &Hash) -> Result<Signature, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Ok(Signature {
        v: 27 + recovery_id.to_i32() as u8,
        r,
        s,
    })
}
