// keystore/src/file.rs

//! File-backed keystore: one record per identity under a root directory.
//!
//! A record lives at `<root>/<identity>__keystore.txt` and holds a JSON body
//! with the strategy version that wrote it and the hex-encoded cipher
//! envelope. Identities are restricted to ASCII alphanumerics, which also
//! keeps them safe as file name components.

use crate::cipher::CipherRegistry;
use crate::{KeyStore, KeyStoreError, KeyStoreResult};
use chain_crypto::{KeyPair, SCALAR_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const KEYSTORE_SUFFIX: &str = "__keystore.txt";
const DEFAULT_ENCRYPT_VERSION: &str = "1";

/// On-disk record: the strategy version plus the envelope it produced
#[derive(Debug, Serialize, Deserialize)]
struct KeyStoreRecord {
    ks_version: String,
    cipher: String,
}

/// Identity-indexed keystore persisting one encrypted record per identity.
pub struct FileKeyStore {
    root: PathBuf,
    encrypt_version: String,
    registry: CipherRegistry,
    lock: Mutex<()>,
}

impl FileKeyStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    /// New records are encrypted with the current default strategy.
    pub fn open(root: impl AsRef<Path>) -> KeyStoreResult<Self> {
        Self::open_with_version(root, DEFAULT_ENCRYPT_VERSION)
    }

    /// Open a store that encrypts new records with the given strategy
    /// version. Records written by other known versions remain loadable.
    pub fn open_with_version(root: impl AsRef<Path>, version: &str) -> KeyStoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() && !root.is_dir() {
            return Err(KeyStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("keystore root {} is not a directory", root.display()),
            )));
        }
        fs::create_dir_all(&root)?;

        let registry = CipherRegistry::with_known_versions();
        registry.get(version)?;
        tracing::debug!("Opened keystore at {} (version {})", root.display(), version);

        Ok(Self {
            root,
            encrypt_version: version.to_string(),
            registry,
            lock: Mutex::new(()),
        })
    }

    fn record_path(&self, identity: &str) -> PathBuf {
        self.root.join(format!("{identity}{KEYSTORE_SUFFIX}"))
    }

    fn validate_identity(identity: &str) -> KeyStoreResult<()> {
        if identity.is_empty() || !identity.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(KeyStoreError::InvalidIdentity(identity.to_string()));
        }
        Ok(())
    }

    fn read_record(&self, identity: &str) -> KeyStoreResult<KeyStoreRecord> {
        let path = self.record_path(identity);
        if !path.is_file() {
            return Err(KeyStoreError::UnknownIdentity(identity.to_string()));
        }
        let raw = fs::read(&path)?;
        serde_json::from_slice(&raw).map_err(|e| KeyStoreError::MalformedRecord(e.to_string()))
    }

    fn decrypt_scalar(&self, identity: &str, password: &str) -> KeyStoreResult<[u8; SCALAR_SIZE]> {
        let record = self.read_record(identity)?;
        let strategy = self.registry.get(&record.ks_version)?;
        let envelope =
            hex::decode(&record.cipher).map_err(|e| KeyStoreError::MalformedRecord(e.to_string()))?;
        strategy.decrypt(&envelope, password)
    }
}

impl KeyStore for FileKeyStore {
    fn save(&self, identity: &str, password: &str, key: &KeyPair) -> KeyStoreResult<()> {
        Self::validate_identity(identity)?;
        let _guard = self.lock.lock().expect("keystore lock poisoned");

        let path = self.record_path(identity);
        if path.exists() {
            return Err(KeyStoreError::IdentityAlreadyExists(identity.to_string()));
        }

        let strategy = self.registry.get(&self.encrypt_version)?;
        let envelope = strategy.encrypt(&key.secret_key().to_bytes(), password)?;
        let record = KeyStoreRecord {
            ks_version: strategy.version().to_string(),
            cipher: hex::encode(envelope),
        };
        let body =
            serde_json::to_vec(&record).map_err(|e| KeyStoreError::MalformedRecord(e.to_string()))?;

        // write-then-rename: a record is either absent or complete
        let staging = path.with_extension("tmp");
        fs::write(&staging, &body)?;
        fs::rename(&staging, &path)?;
        tracing::debug!("Saved key for identity {}", identity);
        Ok(())
    }

    fn load(&self, identity: &str, password: &str) -> KeyStoreResult<KeyPair> {
        Self::validate_identity(identity)?;
        let _guard = self.lock.lock().expect("keystore lock poisoned");

        let scalar = self.decrypt_scalar(identity, password)?;
        Ok(KeyPair::from_scalar_bytes(&scalar)?)
    }

    fn remove(&self, identity: &str, password: &str) -> KeyStoreResult<()> {
        Self::validate_identity(identity)?;
        let _guard = self.lock.lock().expect("keystore lock poisoned");

        // the password must decrypt the record before anything is deleted
        self.decrypt_scalar(identity, password)?;
        fs::remove_file(self.record_path(identity))?;
        tracing::debug!("Removed key for identity {}", identity);
        Ok(())
    }

    fn export(
        &self,
        identity: &str,
        password: &str,
        new_password: &str,
    ) -> KeyStoreResult<Vec<u8>> {
        Self::validate_identity(identity)?;
        let _guard = self.lock.lock().expect("keystore lock poisoned");

        let scalar = self.decrypt_scalar(identity, password)?;
        let strategy = self.registry.get(&self.encrypt_version)?;
        strategy.encrypt(&scalar, new_password)
    }

    fn list_identities(&self) -> KeyStoreResult<Vec<String>> {
        let _guard = self.lock.lock().expect("keystore lock poisoned");

        let mut identities = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(identity) = name.strip_suffix(KEYSTORE_SUFFIX) {
                if !identity.is_empty() && identity.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    identities.push(identity.to_string());
                }
            }
        }
        Ok(identities)
    }
}
