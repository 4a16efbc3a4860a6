// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for worker-adapter credentials.

use crate::kv::{KvError, KvStore, Storage};
use crate::record::Record;
use quaero_core::{Credential, CredentialId};

impl Record for Credential {
    fn table() -> &'static str {
        "credentials"
    }

    fn key(&self) -> String {
        self.id.as_str().to_string()
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    inner: KvStore<Credential>,
}

impl CredentialStore {
    pub fn new(storage: &Storage) -> Self {
        Self {
            inner: storage.table(),
        }
    }

    pub fn insert(&self, credential: Credential) -> Result<(), KvError> {
        self.inner.insert(credential)
    }

    pub fn get(&self, id: &CredentialId) -> Result<Credential, KvError> {
        self.inner.get(id.as_str())
    }

    pub fn by_name(&self, name: &str) -> Result<Vec<Credential>, KvError> {
        self.inner.find(|c| c.name == name)
    }

    pub fn delete(&self, id: &CredentialId) -> Result<(), KvError> {
        self.inner.delete(id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MaterializedState;
    use crate::wal::Wal;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempdir().unwrap();
        let wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
        let storage = Storage::new(MaterializedState::new(), wal);
        (dir, CredentialStore::new(&storage))
    }

    #[test]
    fn insert_then_lookup_by_name() {
        let (_dir, store) = store();
        store
            .insert(Credential {
                id: CredentialId::new("cred1"),
                name: "places-api".into(),
                kind: "api_key".into(),
                secret: "shh".into(),
                created_at_ms: 1,
            })
            .unwrap();
        let found = store.by_name("places-api").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn debug_format_redacts_secret() {
        let cred = Credential {
            id: CredentialId::new("cred1"),
            name: "places-api".into(),
            kind: "api_key".into(),
            secret: "super-secret".into(),
            created_at_ms: 1,
        };
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
