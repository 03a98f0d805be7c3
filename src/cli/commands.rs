//! CLI commands for the multisig vault
//!
//! Implements all command handlers for the CLI interface.

use crate::crypto::{Address, KeyPair};
use crate::host::Ledger;
use crate::multisig::{
    AuthError, AuthorizationEngine, Notification, SignatureBundle, TransactionIntent,
};
use crate::storage::{Storage, StorageConfig, VaultFile};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub engine: AuthorizationEngine,
    pub ledger: Ledger,
    pub storage: Storage,
    pub created_at: DateTime<Utc>,
}

impl AppState {
    /// Load an existing vault
    pub fn load(data_dir: &Path) -> CliResult<Self> {
        let storage = open_storage(data_dir)?;

        if !storage.exists() {
            return Err(format!("No vault found at {:?}; run `init` first", data_dir).into());
        }

        let vault = storage.load()?;
        let (engine, ledger) = vault.restore()?;

        Ok(Self {
            engine,
            ledger,
            storage,
            created_at: vault.created_at,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        let vault = VaultFile::capture(&self.engine, &self.ledger, self.created_at)?;
        self.storage.save(&vault)?;
        Ok(())
    }

    /// Print and discard pending notifications
    fn flush_notifications(&mut self) {
        for notification in self.engine.drain_notifications() {
            match notification {
                Notification::Deposit { source, value } => {
                    println!("   📥 Deposit: {} from {}", value, source);
                }
                Notification::Execution {
                    nonce,
                    destination,
                    value,
                    ..
                } => {
                    println!("   ✅ Execution #{}: {} to {}", nonce, value, destination);
                }
                Notification::ExecutionFailure {
                    nonce,
                    destination,
                    value,
                    ..
                } => {
                    println!(
                        "   ❌ Execution failure #{}: {} to {}",
                        nonce, value, destination
                    );
                }
            }
        }
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(config)?)
}

/// Parse a comma-separated owner list
pub fn parse_owners(list: &str) -> CliResult<Vec<Address>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| -> CliResult<Address> { Ok(s.parse()?) })
        .collect()
}

/// Parse optional hex call data
pub fn parse_payload(data: Option<&str>) -> CliResult<Vec<u8>> {
    match data {
        None => Ok(Vec::new()),
        Some(text) => {
            let stripped = text.strip_prefix("0x").unwrap_or(text);
            Ok(hex::decode(stripped)?)
        }
    }
}

/// Build a transaction intent from CLI arguments
pub fn parse_intent(to: &str, value: u128, data: Option<&str>) -> CliResult<TransactionIntent> {
    Ok(TransactionIntent::new(to.parse()?, value, parse_payload(data)?))
}

fn random_address() -> Address {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    Address::new(bytes)
}

/// Generate a new owner key
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔑 New owner key");
    println!("   Address:     {}", key.address());
    println!("   Private key: {}", key.private_key_hex());
    println!("   ⚠️  Keep the private key secret; it cannot be recovered.");

    Ok(())
}

/// Initialize a new vault
pub fn cmd_init(
    data_dir: &Path,
    owners: &str,
    threshold: usize,
    network_id: u64,
    instance: Option<&str>,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() {
        let (mut engine, _) = storage.load()?.restore()?;
        let err = engine
            .initialize(parse_owners(owners)?, threshold, network_id)
            .err()
            .unwrap_or(AuthError::AlreadyInitialized);
        println!("❌ Vault already exists at {:?}", data_dir);
        return Err(err.into());
    }

    let instance = match instance {
        Some(text) => text.parse()?,
        None => random_address(),
    };

    let mut engine = AuthorizationEngine::new(instance);
    engine.initialize(parse_owners(owners)?, threshold, network_id)?;

    let state = AppState {
        engine,
        ledger: Ledger::new(),
        storage,
        created_at: Utc::now(),
    };
    state.save()?;

    println!("✅ Vault initialized!");
    println!("   Address:   {}", state.engine.instance());
    println!("   Network:   {}", network_id);
    println!(
        "   Quorum:    {}-of-{}",
        state.engine.required_signatures(),
        state.engine.owners().len()
    );
    if let Some(domain) = state.engine.domain_separator() {
        println!("   Domain:    0x{}", hex::encode(domain));
    }

    Ok(())
}

/// Send value into the vault
pub fn cmd_deposit(state: &mut AppState, from: &str, amount: u128) -> CliResult<()> {
    let source: Address = from.parse()?;
    if !state.ledger.deposit(&mut state.engine, source, amount) {
        return Err(format!("Deposit of {} would overflow the vault balance", amount).into());
    }
    state.flush_notifications();
    state.save()?;

    println!(
        "   Vault balance: {}",
        state.ledger.balance_of(&state.engine.instance())
    );
    Ok(())
}

/// Print the digest owners must sign for the next transaction
pub fn cmd_hash(state: &AppState, intent: &TransactionIntent) -> CliResult<()> {
    let digest = state.engine.signing_hash(intent)?;

    println!("🔏 Signing digest for nonce {}", state.engine.nonce());
    println!("   0x{}", hex::encode(digest));
    Ok(())
}

/// Sign the next transaction with an owner key
pub fn cmd_sign(state: &AppState, key_hex: &str, intent: &TransactionIntent) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(key_hex)?;
    let digest = state.engine.signing_hash(intent)?;
    let signature = key.sign(&digest)?;

    if !state.engine.is_owner(&key.address()) {
        println!("⚠️  {} is not an owner of this vault", key.address());
    }

    println!("✍️  Signature by {} for nonce {}", key.address(), state.engine.nonce());
    println!("   {}", signature.to_hex());
    Ok(())
}

/// Submit a signature bundle for authorization and execution
pub fn cmd_execute(state: &mut AppState, intent: &TransactionIntent, sigs: &str) -> CliResult<()> {
    let bundle = SignatureBundle::from_hex_list(sigs)?;

    println!(
        "📤 Submitting {} signature(s) for nonce {}...",
        bundle.len(),
        state.engine.nonce()
    );

    let result = state
        .engine
        .authorize_and_execute(&bundle, intent, &mut state.ledger);

    match result {
        Ok(success) => {
            state.flush_notifications();
            state.save()?;
            if !success {
                println!("   The signatures were consumed; re-sign at the new nonce to retry.");
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ Authorization rejected: {}", e);
            Err(e.into())
        }
    }
}

/// Display vault status
pub fn cmd_status(state: &AppState) -> CliResult<()> {
    let engine = &state.engine;

    println!("🏦 Vault {}", engine.instance());
    if let Some(network_id) = engine.network_id() {
        println!("   Network:            {}", network_id);
    }
    println!("   Required signatures: {}", engine.required_signatures());
    println!("   Nonce:              {}", engine.nonce());
    if let Some(domain) = engine.domain_separator() {
        println!("   Domain separator:   0x{}", hex::encode(domain));
    }
    println!("   Created:            {}", state.created_at.format("%Y-%m-%d %H:%M:%S UTC"));

    println!("\n👥 Owners ({}):", engine.owners().len());
    for owner in engine.owners() {
        println!("   {}", owner);
    }

    let balances = state.ledger.balances();
    if !balances.is_empty() {
        println!("\n💰 Balances:");
        for (address, amount) in balances {
            let marker = if address == engine.instance() { " (vault)" } else { "" };
            println!("   {}: {}{}", address, amount, marker);
        }
    }

    if !state.ledger.history.is_empty() {
        println!("\n📜 Recent calls:");
        for record in state.ledger.history.iter().rev().take(10) {
            println!(
                "   {} {} -> {} ({})",
                if record.success { "✅" } else { "❌" },
                record.value,
                record.destination,
                record.timestamp.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::sign_intent;

    #[test]
    fn test_parse_owners() {
        let owners = parse_owners(
            "0x0000000000000000000000000000000000000001, 0x0000000000000000000000000000000000000002",
        )
        .unwrap();
        assert_eq!(owners.len(), 2);
        assert!(owners[0] < owners[1]);

        assert!(parse_owners("0x01,garbage").is_err());
    }

    #[test]
    fn test_parse_payload() {
        assert!(parse_payload(None).unwrap().is_empty());
        assert_eq!(parse_payload(Some("0xcafe")).unwrap(), vec![0xca, 0xfe]);
        assert!(parse_payload(Some("xyz")).is_err());
    }

    #[test]
    fn test_second_init_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = KeyPair::generate();
        let second = KeyPair::generate();

        cmd_init(temp_dir.path(), &first.address().to_string(), 1, 5, None).unwrap();

        let err = cmd_init(temp_dir.path(), &second.address().to_string(), 1, 9, None)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::AlreadyInitialized)
        );

        let reloaded = AppState::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.engine.owners(), &[first.address()][..]);
        assert_eq!(reloaded.engine.network_id(), Some(5));
    }

    #[test]
    fn test_init_deposit_execute_cycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let key = KeyPair::generate();
        let recipient = "0x00000000000000000000000000000000000000dd";

        cmd_init(temp_dir.path(), &key.address().to_string(), 1, 5, None).unwrap();

        let mut state = AppState::load(temp_dir.path()).unwrap();
        cmd_deposit(&mut state, recipient, 100).unwrap();

        let intent = parse_intent(recipient, 30, None).unwrap();
        let domain = state.engine.domain_separator().unwrap();
        let sig = sign_intent(&key, &domain, &intent, state.engine.nonce()).unwrap();
        cmd_execute(&mut state, &intent, &sig.to_hex()).unwrap();

        let reloaded = AppState::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.engine.nonce(), 1);
        assert_eq!(reloaded.ledger.balance_of(&reloaded.engine.instance()), 70);
        assert_eq!(reloaded.ledger.balance_of(&recipient.parse().unwrap()), 30);

        // Replaying the same signature is rejected and nothing is saved
        let mut state = reloaded;
        assert!(cmd_execute(&mut state, &intent, &sig.to_hex()).is_err());
        assert_eq!(AppState::load(temp_dir.path()).unwrap().engine.nonce(), 1);
    }

    #[test]
    fn test_load_without_vault() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::load(temp_dir.path()).is_err());
    }
}
