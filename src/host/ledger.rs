//! In-process host ledger
//!
//! Tracks native balances and carries out the calls a vault authorizes.
//! A call moves `value` from the vault to the destination; the payload is
//! recorded but not interpreted.

use crate::crypto::hash::hex_serde;
use crate::crypto::Address;
use crate::multisig::{AuthorizationEngine, Executor, TransactionIntent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of call records kept
const MAX_HISTORY: usize = 100;

/// Outcome of one call made on behalf of a vault
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRecord {
    pub from: Address,
    pub destination: Address,
    pub value: u128,
    #[serde(with = "hex_serde::bytes")]
    pub payload: Vec<u8>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// Native balances and call history
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    /// Call history (last 100)
    pub history: Vec<CallRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Credit a vault with incoming value and notify it of the deposit
    ///
    /// Returns `false`, crediting nothing, if the balance would overflow.
    pub fn deposit(
        &mut self,
        engine: &mut AuthorizationEngine,
        source: Address,
        value: u128,
    ) -> bool {
        let balance = self.balances.entry(engine.instance()).or_insert(0);
        match balance.checked_add(value) {
            Some(credited) => *balance = credited,
            None => {
                log::warn!(
                    "Deposit of {} from {} would overflow vault {}",
                    value,
                    source,
                    engine.instance()
                );
                return false;
            }
        }
        engine.receive(source, value);
        true
    }

    /// All non-zero balances, sorted by address
    pub fn balances(&self) -> Vec<(Address, u128)> {
        let mut entries: Vec<(Address, u128)> = self
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(address, amount)| (*address, *amount))
            .collect();
        entries.sort();
        entries
    }

    fn transfer(&mut self, from: Address, to: Address, value: u128) -> bool {
        let have = self.balance_of(&from);
        if have < value {
            log::debug!("Insufficient balance in {}: have {}, need {}", from, have, value);
            return false;
        }
        if from == to || value == 0 {
            return true;
        }

        let to_balance = self.balance_of(&to);
        let credited = match to_balance.checked_add(value) {
            Some(amount) => amount,
            None => return false,
        };
        self.balances.insert(from, have - value);
        self.balances.insert(to, credited);
        true
    }

    fn record(&mut self, record: CallRecord) {
        self.history.push(record);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }
}

impl Executor for Ledger {
    fn invoke(&mut self, caller: &mut AuthorizationEngine, intent: &TransactionIntent) -> bool {
        let from = caller.instance();
        let success = self.transfer(from, intent.destination, intent.value);

        self.record(CallRecord {
            from,
            destination: intent.destination,
            value: intent.value,
            payload: intent.payload.clone(),
            success,
            timestamp: Utc::now(),
        });
        success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::multisig::{sign_intent, Notification, SignatureBundle};

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    fn single_owner_vault() -> (AuthorizationEngine, KeyPair) {
        let key = KeyPair::generate();
        let mut engine = AuthorizationEngine::new(addr(0xAA));
        engine.initialize(vec![key.address()], 1, 7).unwrap();
        (engine, key)
    }

    fn bundle_for(engine: &AuthorizationEngine, key: &KeyPair, intent: &TransactionIntent) -> SignatureBundle {
        let sig = sign_intent(
            key,
            &engine.domain_separator().unwrap(),
            intent,
            engine.nonce(),
        )
        .unwrap();
        SignatureBundle::from_signatures(&[sig])
    }

    #[test]
    fn test_deposit_credits_vault() {
        let (mut engine, _) = single_owner_vault();
        let mut ledger = Ledger::new();

        ledger.deposit(&mut engine, addr(1), 100);
        ledger.deposit(&mut engine, addr(2), 50);

        assert_eq!(ledger.balance_of(&addr(0xAA)), 150);
        assert_eq!(
            engine.drain_notifications(),
            vec![
                Notification::Deposit {
                    source: addr(1),
                    value: 100
                },
                Notification::Deposit {
                    source: addr(2),
                    value: 50
                },
            ]
        );
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let (mut engine, _) = single_owner_vault();
        let mut ledger = Ledger::new();

        assert!(ledger.deposit(&mut engine, addr(1), u128::MAX));
        assert!(!ledger.deposit(&mut engine, addr(2), 1));

        assert_eq!(ledger.balance_of(&addr(0xAA)), u128::MAX);
        assert_eq!(
            engine.drain_notifications(),
            vec![Notification::Deposit {
                source: addr(1),
                value: u128::MAX
            }]
        );
    }

    #[test]
    fn test_authorized_transfer() {
        let (mut engine, key) = single_owner_vault();
        let mut ledger = Ledger::new();
        ledger.deposit(&mut engine, addr(1), 100);

        let intent = TransactionIntent::transfer(addr(2), 40);
        let bundle = bundle_for(&engine, &key, &intent);

        assert_eq!(engine.authorize_and_execute(&bundle, &intent, &mut ledger), Ok(true));
        assert_eq!(ledger.balance_of(&addr(0xAA)), 60);
        assert_eq!(ledger.balance_of(&addr(2)), 40);
        assert_eq!(ledger.history.len(), 1);
        assert!(ledger.history[0].success);
        assert_eq!(
            ledger.balances(),
            vec![(addr(2), 40), (addr(0xAA), 60)]
        );
    }

    #[test]
    fn test_overdraft_fails_but_consumes_nonce() {
        let (mut engine, key) = single_owner_vault();
        let mut ledger = Ledger::new();
        ledger.deposit(&mut engine, addr(1), 10);

        let intent = TransactionIntent::new(addr(2), 11, vec![0x01]);
        let bundle = bundle_for(&engine, &key, &intent);

        assert_eq!(engine.authorize_and_execute(&bundle, &intent, &mut ledger), Ok(false));
        assert_eq!(engine.nonce(), 1);
        assert_eq!(ledger.balance_of(&addr(0xAA)), 10);
        assert_eq!(ledger.balance_of(&addr(2)), 0);
        assert!(!ledger.history[0].success);
        assert_eq!(ledger.history[0].payload, vec![0x01]);
    }

    #[test]
    fn test_history_is_bounded() {
        let (mut engine, _) = single_owner_vault();
        let mut ledger = Ledger::new();

        for i in 0..(MAX_HISTORY + 5) {
            let intent = TransactionIntent::transfer(addr(2), i as u128 + 1);
            ledger.invoke(&mut engine, &intent);
        }
        assert_eq!(ledger.history.len(), MAX_HISTORY);
        assert_eq!(ledger.history[0].value, 6);
    }
}
