//! Immutable owner registry
//!
//! Holds the canonical, strictly ascending owner list and the number of
//! signatures required to authorize a transaction.

use crate::crypto::Address;
use std::collections::HashSet;
use thiserror::Error;

/// Maximum number of owners a vault may have
pub const MAX_OWNERS: usize = 10;

/// Errors raised while initializing or authorizing against a vault
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Vault is already initialized")]
    AlreadyInitialized,
    #[error("Invalid owner count: {0} (expected 1..={max})", max = MAX_OWNERS)]
    InvalidOwnerCount(usize),
    #[error("Invalid threshold: {threshold} for {owners} owners")]
    InvalidThreshold { threshold: usize, owners: usize },
    #[error("Owners must be non-zero and strictly ascending (offending index {0})")]
    OwnersNotSorted(usize),
    #[error("Vault is not initialized")]
    NotInitialized,
    #[error("Malformed signature bundle: v={v}, r={r}, s={s}, threshold={threshold}")]
    MalformedBundle {
        v: usize,
        r: usize,
        s: usize,
        threshold: usize,
    },
    #[error("Signer {signer} at position {position} is not an owner")]
    SignerNotOwner { position: usize, signer: Address },
    #[error("Signer {signer} at position {position} is out of order or duplicated")]
    SignatureOrderOrDuplicate { position: usize, signer: Address },
    #[error("Nonce space exhausted")]
    NonceExhausted,
}

/// The owner set of a vault and its quorum threshold
#[derive(Clone, Debug)]
pub struct IdentityRegistry {
    owners: Vec<Address>,
    is_owner: HashSet<Address>,
    threshold: usize,
}

impl IdentityRegistry {
    /// Validate and build a registry
    ///
    /// # Errors
    /// - [`AuthError::InvalidOwnerCount`] unless `1 <= owners.len() <= 10`
    /// - [`AuthError::InvalidThreshold`] unless `1 <= threshold <= owners.len()`
    /// - [`AuthError::OwnersNotSorted`] unless every owner is strictly greater
    ///   than its predecessor, with [`Address::ZERO`] as the initial floor
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, AuthError> {
        if owners.is_empty() || owners.len() > MAX_OWNERS {
            return Err(AuthError::InvalidOwnerCount(owners.len()));
        }

        if threshold == 0 || threshold > owners.len() {
            return Err(AuthError::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }

        // Strict monotonicity from the zero floor rules out duplicates and
        // the null identity in the same pass.
        let mut last = Address::ZERO;
        for (index, owner) in owners.iter().enumerate() {
            if *owner <= last {
                return Err(AuthError::OwnersNotSorted(index));
            }
            last = *owner;
        }

        let is_owner = owners.iter().copied().collect();

        Ok(Self {
            owners,
            is_owner,
            threshold,
        })
    }

    /// Owners in ascending order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.is_owner.contains(address)
    }

    /// Number of signatures required per transaction
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }
}
