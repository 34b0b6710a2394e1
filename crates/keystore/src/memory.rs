// keystore/src/memory.rs

//! In-memory keystore: encrypted envelopes in a map, nothing persisted.
//!
//! Shares the lifecycle semantics of the file store, so callers and tests
//! can swap it in behind the [`KeyStore`] trait.

use crate::cipher::CipherRegistry;
use crate::{KeyStore, KeyStoreError, KeyStoreResult};
use chain_crypto::{KeyPair, SCALAR_SIZE};
use std::collections::HashMap;
use std::sync::Mutex;

struct MemoryRecord {
    ks_version: String,
    envelope: Vec<u8>,
}

/// Keystore holding encrypted records in process memory only.
pub struct MemoryKeyStore {
    encrypt_version: String,
    registry: CipherRegistry,
    records: Mutex<HashMap<String, MemoryRecord>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            encrypt_version: "1".to_string(),
            registry: CipherRegistry::with_known_versions(),
            records: Mutex::new(HashMap::new()),
        }
    }

    fn decrypt_scalar(
        &self,
        records: &HashMap<String, MemoryRecord>,
        identity: &str,
        password: &str,
    ) -> KeyStoreResult<[u8; SCALAR_SIZE]> {
        let record = records
            .get(identity)
            .ok_or_else(|| KeyStoreError::UnknownIdentity(identity.to_string()))?;
        let strategy = self.registry.get(&record.ks_version)?;
        strategy.decrypt(&record.envelope, password)
    }
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&self, identity: &str, password: &str, key: &KeyPair) -> KeyStoreResult<()> {
        let mut records = self.records.lock().expect("keystore lock poisoned");
        if records.contains_key(identity) {
            return Err(KeyStoreError::IdentityAlreadyExists(identity.to_string()));
        }
        let strategy = self.registry.get(&self.encrypt_version)?;
        let envelope = strategy.encrypt(&key.secret_key().to_bytes(), password)?;
        records.insert(
            identity.to_string(),
            MemoryRecord {
                ks_version: strategy.version().to_string(),
                envelope,
            },
        );
        Ok(())
    }

    fn load(&self, identity: &str, password: &str) -> KeyStoreResult<KeyPair> {
        let records = self.records.lock().expect("keystore lock poisoned");
        let scalar = self.decrypt_scalar(&records, identity, password)?;
        Ok(KeyPair::from_scalar_bytes(&scalar)?)
    }

    fn remove(&self, identity: &str, password: &str) -> KeyStoreResult<()> {
        let mut records = self.records.lock().expect("keystore lock poisoned");
        self.decrypt_scalar(&records, identity, password)?;
        records.remove(identity);
        Ok(())
    }

    fn export(
        &self,
        identity: &str,
        password: &str,
        new_password: &str,
    ) -> KeyStoreResult<Vec<u8>> {
        let records = self.records.lock().expect("keystore lock poisoned");
        let scalar = self.decrypt_scalar(&records, identity, password)?;
        let strategy = self.registry.get(&self.encrypt_version)?;
        strategy.encrypt(&scalar, new_password)
    }

    fn list_identities(&self) -> KeyStoreResult<Vec<String>> {
        let records = self.records.lock().expect("keystore lock poisoned");
        Ok(records.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_survives_the_store() {
        let key = KeyPair::generate().unwrap();
        {
            let store = MemoryKeyStore::new();
            store.save("alice", "pw", &key).unwrap();
            assert_eq!(store.list_identities().unwrap(), vec!["alice".to_string()]);
        }
        let fresh = MemoryKeyStore::new();
        assert!(fresh.list_identities().unwrap().is_empty());
    }

    #[test]
    fn test_same_semantics_as_trait_docs() {
        let store = MemoryKeyStore::new();
        let key = KeyPair::generate().unwrap();

        store.save("alice", "pw", &key).unwrap();
        assert!(matches!(
            store.save("alice", "pw", &key),
            Err(KeyStoreError::IdentityAlreadyExists(_))
        ));

        let loaded = store.load("alice", "pw").unwrap();
        assert_eq!(loaded.public_key(), key.public_key());

        assert!(matches!(
            store.load("alice", "wrong"),
            Err(KeyStoreError::DecryptionFailure)
        ));
        assert!(matches!(
            store.remove("alice", "wrong"),
            Err(KeyStoreError::DecryptionFailure)
        ));

        store.remove("alice", "pw").unwrap();
        assert!(matches!(
            store.load("alice", "pw"),
            Err(KeyStoreError::UnknownIdentity(_))
        ));
    }
}
