// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory materialized view the KV-Store Wrapper reads from. Rebuilt by
//! replaying the WAL on top of the last snapshot at startup.

use crate::wal::WalOp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generic table storage: table name → (primary key → JSON value).
///
/// Kept untyped at this layer (rather than one `HashMap<K, T>` field per
/// entity) so the KV-Store Wrapper's generic `insert`/`get`/`find` surface
/// can address any [`crate::record::Record`] type uniformly, the way the
/// wrapper is specified: callers never see this representation directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    tables: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, table: &str, key: &str) -> bool {
        self.tables
            .get(table)
            .map(|t| t.contains_key(key))
            .unwrap_or(false)
    }

    pub fn get_raw(&self, table: &str, key: &str) -> Option<&serde_json::Value> {
        self.tables.get(table).and_then(|t| t.get(key))
    }

    pub fn put_raw(&mut self, table: &str, key: &str, value: serde_json::Value) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn delete_raw(&mut self, table: &str, key: &str) {
        if let Some(t) = self.tables.get_mut(table) {
            t.remove(key);
        }
    }

    pub fn scan(&self, table: &str) -> impl Iterator<Item = &serde_json::Value> {
        self.tables.get(table).into_iter().flat_map(|t| t.values())
    }

    /// Apply a WAL op during replay.
    pub fn apply(&mut self, op: &WalOp) {
        match op {
            WalOp::Put { table, key, value } => self.put_raw(table, key, value.clone()),
            WalOp::Delete { table, key } => self.delete_raw(table, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut state = MaterializedState::new();
        state.put_raw("jobs", "j1", serde_json::json!({"id": "j1"}));
        assert!(state.contains("jobs", "j1"));
        assert_eq!(
            state.get_raw("jobs", "j1"),
            Some(&serde_json::json!({"id": "j1"}))
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let mut state = MaterializedState::new();
        state.delete_raw("jobs", "missing");
        state.put_raw("jobs", "j1", serde_json::json!(1));
        state.delete_raw("jobs", "j1");
        state.delete_raw("jobs", "j1");
        assert!(!state.contains("jobs", "j1"));
    }

    #[test]
    fn apply_put_and_delete_ops() {
        let mut state = MaterializedState::new();
        state.apply(&WalOp::Put {
            table: "jobs".into(),
            key: "j1".into(),
            value: serde_json::json!(1),
        });
        assert!(state.contains("jobs", "j1"));
        state.apply(&WalOp::Delete {
            table: "jobs".into(),
            key: "j1".into(),
        });
        assert!(!state.contains("jobs", "j1"));
    }

    #[test]
    fn scan_returns_all_values_in_table() {
        let mut state = MaterializedState::new();
        state.put_raw("jobs", "j1", serde_json::json!(1));
        state.put_raw("jobs", "j2", serde_json::json!(2));
        let mut values: Vec<_> = state.scan("jobs").cloned().collect();
        values.sort_by_key(|v| v.as_i64());
        assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(2)]);
    }
}
