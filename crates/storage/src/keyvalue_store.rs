// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic key/value persistence, e.g. for adapter checkpoints and small
//! pieces of daemon-wide state. Keys are case-insensitive; the original
//! case the caller supplied is preserved in `display_key` for presentation.

use crate::kv::{KvError, KvStore, Storage};
use crate::record::Record;
use quaero_core::KeyValue;

impl Record for KeyValue {
    fn table() -> &'static str {
        "key_values"
    }

    fn key(&self) -> String {
        self.key.clone()
    }
}

#[derive(Clone)]
pub struct KeyValueStore {
    inner: KvStore<KeyValue>,
}

impl KeyValueStore {
    pub fn new(storage: &Storage) -> Self {
        Self {
            inner: storage.table(),
        }
    }

    /// Insert a brand-new key. Fails with `AlreadyExists` (surfaced as 409
    /// Conflict) if a case-insensitive match already exists — this is the
    /// operation the `KeyValue` API endpoint calls.
    pub fn insert(&self, key: &str, value: serde_json::Value, updated_at_ms: u64) -> Result<(), KvError> {
        self.inner.insert(KeyValue::new(key, value, updated_at_ms))
    }

    /// Create-or-overwrite, used by workers persisting their own checkpoints.
    pub fn set(&self, key: &str, value: serde_json::Value, updated_at_ms: u64) -> Result<(), KvError> {
        self.inner.upsert(KeyValue::new(key, value, updated_at_ms))
    }

    pub fn get(&self, key: &str) -> Result<KeyValue, KvError> {
        self.inner.get(&key.to_ascii_lowercase())
    }

    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        self.inner.delete(&key.to_ascii_lowercase())
    }
}
