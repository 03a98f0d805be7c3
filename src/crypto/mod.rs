//! Cryptographic utilities for the multisig engine
//!
//! This module provides:
//! - Keccak-256 hashing
//! - 20-byte addresses derived from secp256k1 public keys
//! - ECDSA key management and recoverable signing
//! - Malleability-safe signer recovery

pub mod address;
pub mod hash;
pub mod keys;
pub mod signature;

pub use address::Address;
pub use hash::{keccak256, keccak256_concat, keccak256_hex, u128_word, u64_word, Hash};
pub use keys::{sign_digest, KeyError, KeyPair};
pub use signature::{Secp256k1Verifier, Signature, SignatureVerifier, HALF_CURVE_ORDER};
