//! Multi-signature authorization engine
//!
//! A fixed set of owners jointly authorizes transactions by signing a
//! typed, domain-bound digest off-band. Anyone may then submit a bundle
//! of exactly `threshold` signatures, sorted by ascending signer address,
//! to have the transaction executed.
//!
//! # Example
//!
//! ```ignore
//! use simple_multisig::multisig::{sign_intent, AuthorizationEngine, SignatureBundle, TransactionIntent};
//!
//! // A 2-of-3 vault; owners must be sorted ascending
//! let mut engine = AuthorizationEngine::new(vault_address);
//! engine.initialize(vec![a, b, c], 2, network_id)?;
//!
//! // Owners sign the intent at the current nonce
//! let intent = TransactionIntent::transfer(recipient, 100);
//! let domain = engine.domain_separator().unwrap();
//! let sig_a = sign_intent(&key_a, &domain, &intent, engine.nonce())?;
//! let sig_b = sign_intent(&key_b, &domain, &intent, engine.nonce())?;
//!
//! // Anyone submits the bundle
//! let bundle = SignatureBundle::from_signatures(&[sig_a, sig_b]);
//! let success = engine.authorize_and_execute(&bundle, &intent, &mut ledger)?;
//! ```

pub mod bundle;
pub mod engine;
pub mod message;
pub mod registry;

pub use bundle::{sign_intent, SignatureBundle};
pub use engine::{AuthorizationEngine, EngineState, Executor, Notification};
pub use message::{domain_separator, TransactionIntent};
pub use registry::{AuthError, IdentityRegistry, MAX_OWNERS};
