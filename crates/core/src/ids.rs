// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newtype identifiers for every entity in the domain model.

use crate::define_id;

define_id! {
    /// Identifies a `QueueJob` (both parent and child jobs share this id space).
    pub struct JobId;
}

define_id! {
    /// Identifies a `JobDefinition`.
    pub struct DefinitionId;
}

define_id! {
    /// Identifies a stored `Credential`.
    pub struct CredentialId;
}

define_id! {
    /// Identifies a stored `Document`.
    pub struct DocumentId;
}

define_id! {
    /// Identifies a `QueueMessage`. Encodes a 20-digit zero-padded unix-nanos
    /// timestamp prefix followed by a v4 UUID, so lexicographic string
    /// ordering is also FIFO delivery order.
    pub struct QueueMessageId;
}

impl QueueMessageId {
    /// Build a new FIFO-ordered message id from a nanosecond timestamp.
    pub fn generate(unix_nanos: u128) -> Self {
        Self::new(format!("{unix_nanos:020}:{}", uuid::Uuid::new_v4()))
    }
}
