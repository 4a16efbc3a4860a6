// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Record` trait every type stored through the KV-Store Wrapper must
//! implement: a table name and a primary key.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type that can be stored in a [`crate::kv::KvStore`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the table this record lives in. Distinct record types must
    /// use distinct table names.
    fn table() -> &'static str;

    /// Primary key, unique within the table.
    fn key(&self) -> String;
}
