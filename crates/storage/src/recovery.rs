// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-recovery startup sequence: load the latest snapshot (if any), open
//! the WAL, and replay every entry written after the snapshot's sequence
//! number back into the materialized state.

use crate::checkpoint::load_snapshot;
use crate::kv::Storage;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
}

/// Build a ready-to-use `Storage` by replaying durable state from disk.
///
/// `snapshot_path` and `wal_path` need not exist yet; a fresh daemon starts
/// from an empty `MaterializedState` and sequence zero.
pub fn open_storage(snapshot_path: &Path, wal_path: &Path) -> Result<Storage, RecoveryError> {
    let snapshot = load_snapshot(snapshot_path)?;
    let (mut state, snapshot_seq) = match snapshot {
        Some(s) => (s.state, s.seq),
        None => (MaterializedState::new(), 0),
    };

    let wal = Wal::open(wal_path, snapshot_seq)?;
    for entry in wal.entries_after(snapshot_seq)? {
        state.apply(&entry.op);
    }

    Ok(Storage::new(state, wal))
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
