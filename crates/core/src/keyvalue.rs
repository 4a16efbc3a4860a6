// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic key/value records, case-insensitive-unique by key.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValue {
    /// Normalized (lowercase) key used for storage and uniqueness.
    pub key: String,
    /// Original case the caller supplied, preserved for display purposes
    /// (error messages, listings) without affecting uniqueness.
    pub display_key: String,
    pub value: serde_json::Value,
    pub updated_at_ms: u64,
}

impl KeyValue {
    pub fn new(key: &str, value: serde_json::Value, updated_at_ms: u64) -> Self {
        Self {
            key: key.to_lowercase(),
            display_key: key.to_string(),
            value,
            updated_at_ms,
        }
    }
}
