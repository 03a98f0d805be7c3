//! Simple MultiSig: a minimal M-of-N authorization engine in Rust
//!
//! This crate provides a multisig vault featuring:
//! - An immutable, strictly ordered owner set and fixed quorum threshold
//! - Typed, domain-separated transaction digests (Keccak-256)
//! - ECDSA signer recovery (secp256k1) with malleability rejection
//! - A monotonic nonce consumed before every downstream call
//! - An in-process ledger host and JSON persistence
//!
//! # Example
//!
//! ```rust
//! use simple_multisig::crypto::{Address, KeyPair};
//! use simple_multisig::host::Ledger;
//! use simple_multisig::multisig::{sign_intent, AuthorizationEngine, SignatureBundle, TransactionIntent};
//!
//! // Two owners, sorted by address
//! let mut keys = vec![KeyPair::generate(), KeyPair::generate()];
//! keys.sort_by_key(|k| k.address());
//!
//! // A 2-of-2 vault on network 1
//! let mut engine = AuthorizationEngine::new(Address::new([0x11; 20]));
//! engine.initialize(keys.iter().map(|k| k.address()).collect(), 2, 1).unwrap();
//!
//! // Fund it
//! let mut ledger = Ledger::new();
//! ledger.deposit(&mut engine, Address::new([0x22; 20]), 100);
//!
//! // Both owners sign a transfer at the current nonce
//! let intent = TransactionIntent::transfer(Address::new([0x33; 20]), 40);
//! let domain = engine.domain_separator().unwrap();
//! let sigs: Vec<_> = keys
//!     .iter()
//!     .map(|k| sign_intent(k, &domain, &intent, engine.nonce()).unwrap())
//!     .collect();
//!
//! // Anyone can submit the bundle
//! let bundle = SignatureBundle::from_signatures(&sigs);
//! let success = engine.authorize_and_execute(&bundle, &intent, &mut ledger).unwrap();
//! assert!(success);
//! assert_eq!(engine.nonce(), 1);
//! ```

pub mod cli;
pub mod crypto;
pub mod host;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use crypto::{Address, KeyPair, Secp256k1Verifier, Signature, SignatureVerifier};
pub use host::Ledger;
pub use multisig::{
    AuthError, AuthorizationEngine, EngineState, Executor, IdentityRegistry, Notification,
    SignatureBundle, TransactionIntent,
};
pub use storage::{Storage, StorageConfig, VaultFile};
