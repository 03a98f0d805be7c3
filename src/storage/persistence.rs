//! Vault persistence layer
//!
//! Provides save/load functionality for a vault's engine state and the
//! host ledger it runs against.

use crate::host::Ledger;
use crate::multisig::{AuthError, AuthorizationEngine, EngineState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid vault state: {0}")]
    InvalidState(#[from] AuthError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub vault_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".multisig_data"),
            vault_file: "vault.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// On-disk representation of a vault
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultFile {
    pub engine: EngineState,
    pub ledger: Ledger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaultFile {
    /// Capture an initialized engine and its ledger
    pub fn capture(
        engine: &AuthorizationEngine,
        ledger: &Ledger,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            engine: engine.state()?,
            ledger: ledger.clone(),
            created_at,
            updated_at: Utc::now(),
        })
    }

    /// Rebuild the engine, checking the stored domain separator
    pub fn restore(&self) -> Result<(AuthorizationEngine, Ledger), StorageError> {
        let engine = AuthorizationEngine::from_state(&self.engine)?;
        if engine.domain_separator() != Some(self.engine.domain_separator) {
            return Err(StorageError::InvalidData(
                "domain separator does not match instance and network".to_string(),
            ));
        }
        Ok((engine, self.ledger.clone()))
    }
}

/// Vault storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Get the vault file path
    fn vault_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.vault_file)
    }

    /// Get a backup file path
    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.vault_file, index))
    }

    /// Save the vault to disk
    pub fn save(&self, vault: &VaultFile) -> Result<(), StorageError> {
        let path = self.vault_path();

        // Create backup if enabled
        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("vault.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, vault)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Saved vault to {:?}", path);
        Ok(())
    }

    /// Load the vault from disk
    pub fn load(&self) -> Result<VaultFile, StorageError> {
        let path = self.vault_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Vault file not found".to_string(),
            ));
        }

        let file = fs::File::open(&path)?;
        let reader = BufReader::new(file);

        Ok(serde_json::from_reader(reader)?)
    }

    /// Check if a saved vault exists
    pub fn exists(&self) -> bool {
        self.vault_path().exists()
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Address, KeyPair};

    fn temp_storage(max_backups: usize) -> (tempfile::TempDir, Storage) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        };
        let storage = Storage::new(config).unwrap();
        (temp_dir, storage)
    }

    fn sample_vault() -> (AuthorizationEngine, Ledger) {
        let mut keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        keys.sort_by_key(|k| k.address());

        let mut instance = [0u8; 20];
        instance[0] = 0x42;
        let mut engine = AuthorizationEngine::new(Address::new(instance));
        engine
            .initialize(keys.iter().map(|k| k.address()).collect(), 2, 3)
            .unwrap();

        let mut ledger = Ledger::new();
        ledger.deposit(&mut engine, keys[0].address(), 1_000);
        (engine, ledger)
    }

    #[test]
    fn test_save_load_vault() {
        let (_dir, storage) = temp_storage(5);
        let (engine, ledger) = sample_vault();

        let vault = VaultFile::capture(&engine, &ledger, Utc::now()).unwrap();
        storage.save(&vault).unwrap();
        assert!(storage.exists());

        let (restored, restored_ledger) = storage.load().unwrap().restore().unwrap();
        assert_eq!(restored.state().unwrap(), engine.state().unwrap());
        assert_eq!(restored_ledger.balance_of(&engine.instance()), 1_000);
    }

    #[test]
    fn test_load_missing_vault() {
        let (_dir, storage) = temp_storage(5);
        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_capture_requires_initialized_engine() {
        let engine = AuthorizationEngine::new(Address::ZERO);
        let result = VaultFile::capture(&engine, &Ledger::new(), Utc::now());
        assert!(matches!(
            result,
            Err(StorageError::InvalidState(AuthError::NotInitialized))
        ));
    }

    #[test]
    fn test_tampered_domain_rejected() {
        let (engine, ledger) = sample_vault();
        let mut vault = VaultFile::capture(&engine, &ledger, Utc::now()).unwrap();
        vault.engine.domain_separator[0] ^= 0xFF;

        assert!(matches!(vault.restore(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_tampered_owners_rejected() {
        let (engine, ledger) = sample_vault();
        let mut vault = VaultFile::capture(&engine, &ledger, Utc::now()).unwrap();
        vault.engine.owners.reverse();

        assert!(matches!(
            vault.restore(),
            Err(StorageError::InvalidState(AuthError::OwnersNotSorted(1)))
        ));
    }

    #[test]
    fn test_backup_rotation() {
        let (_dir, storage) = temp_storage(3);
        let (engine, ledger) = sample_vault();
        let vault = VaultFile::capture(&engine, &ledger, Utc::now()).unwrap();

        for _ in 0..5 {
            storage.save(&vault).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
    }
}
