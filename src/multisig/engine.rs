//! Quorum authorization and execution
//!
//! The engine owns the replay counter and, once initialized, the owner
//! registry and domain separator. Every successful authorization round
//! consumes exactly one nonce before the downstream call is made, so a
//! re-entrant or failing callee can never replay the same signatures.

use crate::crypto::hash::hex_serde;
use crate::crypto::{Address, Hash, Secp256k1Verifier, SignatureVerifier};
use crate::multisig::bundle::SignatureBundle;
use crate::multisig::message::{domain_separator, TransactionIntent};
use crate::multisig::registry::{AuthError, IdentityRegistry};
use serde::{Deserialize, Serialize};

/// Performs the side-effecting call of an authorized transaction
pub trait Executor {
    /// Invoke `intent.destination` with `intent.value` and `intent.payload`.
    ///
    /// `caller` is the engine that authorized the call. A callee may
    /// re-enter it; by then the consumed nonce has already advanced.
    /// Returns whether the call succeeded.
    fn invoke(&mut self, caller: &mut AuthorizationEngine, intent: &TransactionIntent) -> bool;
}

/// Observational events emitted by the engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    Deposit {
        source: Address,
        value: u128,
    },
    Execution {
        nonce: u64,
        destination: Address,
        value: u128,
        #[serde(with = "hex_serde::bytes")]
        payload: Vec<u8>,
    },
    ExecutionFailure {
        nonce: u64,
        destination: Address,
        value: u128,
        #[serde(with = "hex_serde::bytes")]
        payload: Vec<u8>,
    },
}

/// Persisted layout of an initialized engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Host-assigned identity of this vault instance
    pub instance: Address,
    pub network_id: u64,
    pub owners: Vec<Address>,
    pub required_signatures: usize,
    pub nonce: u64,
    #[serde(with = "hex_serde::word")]
    pub domain_separator: Hash,
}

/// One-time setup fixed at initialization
#[derive(Clone, Debug)]
struct Setup {
    registry: IdentityRegistry,
    network_id: u64,
    domain_separator: Hash,
}

/// M-of-N authorization engine for a single vault instance
#[derive(Debug)]
pub struct AuthorizationEngine {
    instance: Address,
    verifier: Box<dyn SignatureVerifier>,
    setup: Option<Setup>,
    nonce: u64,
    journal: Vec<Notification>,
}

impl AuthorizationEngine {
    /// Create an uninitialized engine for the vault at `instance`
    pub fn new(instance: Address) -> Self {
        Self::with_verifier(instance, Box::new(Secp256k1Verifier::new()))
    }

    /// Create an uninitialized engine with a custom signature verifier
    pub fn with_verifier(instance: Address, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self {
            instance,
            verifier,
            setup: None,
            nonce: 0,
            journal: Vec::new(),
        }
    }

    /// Restore an engine from its persisted state
    ///
    /// The owner registry is re-validated and the domain separator is
    /// recomputed from the instance and network.
    pub fn from_state(state: &EngineState) -> Result<Self, AuthError> {
        let mut engine = Self::new(state.instance);
        engine.initialize(
            state.owners.clone(),
            state.required_signatures,
            state.network_id,
        )?;
        engine.nonce = state.nonce;
        Ok(engine)
    }

    /// Snapshot the persisted layout
    pub fn state(&self) -> Result<EngineState, AuthError> {
        let setup = self.setup()?;
        Ok(EngineState {
            instance: self.instance,
            network_id: setup.network_id,
            owners: setup.registry.owners().to_vec(),
            required_signatures: setup.registry.threshold(),
            nonce: self.nonce,
            domain_separator: setup.domain_separator,
        })
    }

    /// Fix the owner set, threshold and signing domain. Callable once.
    ///
    /// Nothing is written unless every check passes.
    pub fn initialize(
        &mut self,
        owners: Vec<Address>,
        threshold: usize,
        network_id: u64,
    ) -> Result<(), AuthError> {
        if self.setup.is_some() {
            return Err(AuthError::AlreadyInitialized);
        }

        let registry = IdentityRegistry::new(owners, threshold)?;
        let domain_separator = domain_separator(network_id, &self.instance);

        log::info!(
            "Initialized vault {} as {} on network {}",
            self.instance,
            registry.description(),
            network_id
        );

        self.setup = Some(Setup {
            registry,
            network_id,
            domain_separator,
        });
        Ok(())
    }

    /// Verify a quorum over `intent` at the current nonce, consume the
    /// nonce, then execute the call through `executor`.
    ///
    /// Returns `Ok(false)` when the signatures were valid but the
    /// downstream call failed; the nonce is consumed either way.
    pub fn authorize_and_execute<X: Executor + ?Sized>(
        &mut self,
        bundle: &SignatureBundle,
        intent: &TransactionIntent,
        executor: &mut X,
    ) -> Result<bool, AuthError> {
        self.authorize(bundle, intent)?;
        let nonce = self.nonce;

        let success = executor.invoke(self, intent);

        let notification = if success {
            log::info!(
                "Executed transaction {} to {} (value {})",
                nonce,
                intent.destination,
                intent.value
            );
            Notification::Execution {
                nonce,
                destination: intent.destination,
                value: intent.value,
                payload: intent.payload.clone(),
            }
        } else {
            log::warn!(
                "Transaction {} to {} (value {}) failed downstream",
                nonce,
                intent.destination,
                intent.value
            );
            Notification::ExecutionFailure {
                nonce,
                destination: intent.destination,
                value: intent.value,
                payload: intent.payload.clone(),
            }
        };
        self.journal.push(notification);

        Ok(success)
    }

    /// Check the quorum and advance the nonce
    fn authorize(
        &mut self,
        bundle: &SignatureBundle,
        intent: &TransactionIntent,
    ) -> Result<(), AuthError> {
        let setup = self.setup()?;
        let registry = &setup.registry;
        let threshold = registry.threshold();

        if !bundle.has_len(threshold) {
            return Err(AuthError::MalformedBundle {
                v: bundle.v.len(),
                r: bundle.r.len(),
                s: bundle.s.len(),
                threshold,
            });
        }

        let next = self.nonce.checked_add(1).ok_or(AuthError::NonceExhausted)?;
        let digest = intent.signing_hash(&setup.domain_separator, self.nonce);

        let mut last = Address::ZERO;
        for position in 0..threshold {
            let signer = self.verifier.recover(
                &digest,
                bundle.v[position],
                &bundle.r[position],
                &bundle.s[position],
            );
            log::debug!("Signature {} recovered {}", position, signer);

            if !registry.is_owner(&signer) {
                log::warn!("Rejected bundle: {} is not an owner", signer);
                return Err(AuthError::SignerNotOwner { position, signer });
            }
            if signer <= last {
                log::warn!("Rejected bundle: {} out of order or duplicated", signer);
                return Err(AuthError::SignatureOrderOrDuplicate { position, signer });
            }
            last = signer;
        }

        self.nonce = next;
        Ok(())
    }

    /// Passive receipt of incoming value. Requires no authorization.
    pub fn receive(&mut self, source: Address, value: u128) {
        log::info!("Deposit of {} from {}", value, source);
        self.journal.push(Notification::Deposit { source, value });
    }

    /// The digest owners must sign for `intent` at the current nonce
    pub fn signing_hash(&self, intent: &TransactionIntent) -> Result<Hash, AuthError> {
        let setup = self.setup()?;
        Ok(intent.signing_hash(&setup.domain_separator, self.nonce))
    }

    fn setup(&self) -> Result<&Setup, AuthError> {
        self.setup.as_ref().ok_or(AuthError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.setup.is_some()
    }

    pub fn instance(&self) -> Address {
        self.instance
    }

    /// Owners in ascending order; empty before initialization
    pub fn owners(&self) -> &[Address] {
        self.setup
            .as_ref()
            .map(|s| s.registry.owners())
            .unwrap_or(&[])
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.setup
            .as_ref()
            .map_or(false, |s| s.registry.is_owner(address))
    }

    /// Number of signatures per bundle; zero before initialization
    pub fn required_signatures(&self) -> usize {
        self.setup.as_ref().map_or(0, |s| s.registry.threshold())
    }

    /// Nonce the next transaction must be signed over
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn network_id(&self) -> Option<u64> {
        self.setup.as_ref().map(|s| s.network_id)
    }

    pub fn domain_separator(&self) -> Option<Hash> {
        self.setup.as_ref().map(|s| s.domain_separator)
    }

    /// Notifications emitted so far and not yet drained
    pub fn notifications(&self) -> &[Notification] {
        &self.journal
    }

    /// Take all pending notifications
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.journal)
    }
}
