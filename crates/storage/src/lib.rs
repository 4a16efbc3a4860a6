// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-storage: the KV-Store Wrapper, Queue Manager, and Job State Store,
//! durable via a WAL + periodic snapshot/checkpoint.

pub mod checkpoint;
pub mod credential_store;
pub mod document_store;
pub mod job_store;
pub mod keyvalue_store;
pub mod kv;
pub mod migration;
pub mod queue_manager;
pub mod record;
pub mod recovery;
pub mod snapshot;
pub mod state;
pub mod wal;

pub use checkpoint::{CheckpointError, CheckpointResult, Checkpointer};
pub use credential_store::CredentialStore;
pub use document_store::DocumentStore;
pub use job_store::JobStateStore;
pub use keyvalue_store::KeyValueStore;
pub use kv::{KvError, KvStore, Storage, TxnCtx};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use queue_manager::QueueManager;
pub use record::Record;
pub use recovery::open_storage;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError, WalOp};
