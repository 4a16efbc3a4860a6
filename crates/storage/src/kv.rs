// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The KV-Store Wrapper: `insert`/`upsert`/`get`/`find`/`update`/`delete`/
//! `txn` over any [`Record`] type, durable via the WAL before the
//! in-memory `MaterializedState` is updated.

use crate::record::Record;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalOp};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("store busy, retry")]
    Busy,
    #[error("storage error: {0}")]
    Fatal(String),
}

impl From<crate::wal::WalError> for KvError {
    fn from(e: crate::wal::WalError) -> Self {
        KvError::Fatal(e.to_string())
    }
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Fatal(e.to_string())
    }
}

/// Shared state + WAL guarded by a single mutex. A single writer keeps the
/// durability ordering (WAL append happens-before materialized mutation)
/// trivially correct without a two-lock protocol.
pub(crate) struct Inner {
    pub state: MaterializedState,
    pub wal: Wal,
}

/// A handle to the KV-Store Wrapper shared by every `KvStore<T>` accessor.
#[derive(Clone)]
pub struct Storage {
    pub(crate) inner: Arc<Mutex<Inner>>,
}

impl Storage {
    pub fn new(state: MaterializedState, wal: Wal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { state, wal })),
        }
    }

    /// Typed accessor for one record type's table.
    pub fn table<T: Record>(&self) -> KvStore<T> {
        KvStore {
            storage: self.clone(),
            _marker: PhantomData,
        }
    }

    /// Flush the WAL if group-commit thresholds are met. Called by the
    /// daemon's periodic flush task.
    pub fn maybe_flush(&self) -> Result<(), KvError> {
        let mut inner = self.inner.lock();
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), KvError> {
        self.inner.lock().wal.flush()?;
        Ok(())
    }

    /// Snapshot the current materialized state and the WAL sequence number
    /// it reflects, for the daemon's periodic checkpoint task.
    pub fn checkpoint_state(&self) -> (MaterializedState, u64) {
        let inner = self.inner.lock();
        (inner.state.clone(), inner.wal.write_seq())
    }

    /// Truncate WAL entries up to and including `seq`, called once a
    /// checkpoint covering `seq` is durable on disk.
    pub fn truncate_wal_before(&self, seq: u64) -> Result<(), KvError> {
        self.inner.lock().wal.truncate_before(seq)?;
        Ok(())
    }

    /// Run a sequence of mutations atomically: all WAL appends are grouped,
    /// and no other caller observes a partially-applied transaction because
    /// the whole closure runs under a single lock.
    pub fn txn<R>(&self, f: impl FnOnce(&mut TxnCtx) -> Result<R, KvError>) -> Result<R, KvError> {
        let mut inner = self.inner.lock();
        let mut ctx = TxnCtx { inner: &mut inner };
        f(&mut ctx)
    }
}

/// Mutation context passed to a [`Storage::txn`] closure.
pub struct TxnCtx<'a> {
    inner: &'a mut Inner,
}

impl TxnCtx<'_> {
    pub fn insert<T: Record>(&mut self, value: T) -> Result<(), KvError> {
        insert_locked(self.inner, value)
    }

    pub fn upsert<T: Record>(&mut self, value: T) -> Result<(), KvError> {
        upsert_locked(self.inner, value)
    }

    pub fn get<T: Record>(&self, key: &str) -> Result<T, KvError> {
        get_locked(&self.inner.state, key)
    }

    pub fn update<T: Record>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut T) -> Result<(), KvError>,
    ) -> Result<T, KvError> {
        update_locked(self.inner, key, f)
    }

    pub fn delete<T: Record>(&mut self, key: &str) -> Result<(), KvError> {
        delete_locked(self.inner, T::table(), key)
    }

    pub fn find<T: Record>(&self, filter: impl Fn(&T) -> bool) -> Result<Vec<T>, KvError> {
        find_locked(&self.inner.state, filter)
    }
}

/// Typed accessor over one table.
pub struct KvStore<T: Record> {
    storage: Storage,
    _marker: PhantomData<T>,
}

impl<T: Record> Clone for KvStore<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> KvStore<T> {
    pub fn insert(&self, value: T) -> Result<(), KvError> {
        let mut inner = self.storage.inner.lock();
        insert_locked(&mut inner, value)
    }

    pub fn upsert(&self, value: T) -> Result<(), KvError> {
        let mut inner = self.storage.inner.lock();
        upsert_locked(&mut inner, value)
    }

    pub fn get(&self, key: &str) -> Result<T, KvError> {
        let inner = self.storage.inner.lock();
        get_locked(&inner.state, key)
    }

    pub fn find(&self, filter: impl Fn(&T) -> bool) -> Result<Vec<T>, KvError> {
        let inner = self.storage.inner.lock();
        find_locked(&inner.state, filter)
    }

    pub fn update(
        &self,
        key: &str,
        f: impl FnOnce(&mut T) -> Result<(), KvError>,
    ) -> Result<T, KvError> {
        let mut inner = self.storage.inner.lock();
        update_locked(&mut inner, key, f)
    }

    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut inner = self.storage.inner.lock();
        delete_locked(&mut inner, T::table(), key)
    }
}

fn insert_locked<T: Record>(inner: &mut Inner, value: T) -> Result<(), KvError> {
    let table = T::table();
    let key = value.key();
    if inner.state.contains(table, &key) {
        return Err(KvError::AlreadyExists);
    }
    let json = serde_json::to_value(&value)?;
    write_through(inner, table, &key, json)
}

fn upsert_locked<T: Record>(inner: &mut Inner, value: T) -> Result<(), KvError> {
    let table = T::table();
    let key = value.key();
    let json = serde_json::to_value(&value)?;
    write_through(inner, table, &key, json)
}

fn get_locked<T: Record>(state: &MaterializedState, key: &str) -> Result<T, KvError> {
    let raw = state.get_raw(T::table(), key).ok_or(KvError::NotFound)?;
    Ok(serde_json::from_value(raw.clone())?)
}

fn find_locked<T: Record>(
    state: &MaterializedState,
    filter: impl Fn(&T) -> bool,
) -> Result<Vec<T>, KvError> {
    let mut out = Vec::new();
    for raw in state.scan(T::table()) {
        let value: T = serde_json::from_value(raw.clone())?;
        if filter(&value) {
            out.push(value);
        }
    }
    Ok(out)
}

fn update_locked<T: Record>(
    inner: &mut Inner,
    key: &str,
    f: impl FnOnce(&mut T) -> Result<(), KvError>,
) -> Result<T, KvError> {
    let table = T::table();
    let raw = inner.state.get_raw(table, key).ok_or(KvError::NotFound)?;
    let mut value: T = serde_json::from_value(raw.clone())?;
    f(&mut value)?;
    let json = serde_json::to_value(&value)?;
    write_through(inner, table, key, json)?;
    Ok(value)
}

fn delete_locked(inner: &mut Inner, table: &str, key: &str) -> Result<(), KvError> {
    inner.wal.append(&WalOp::Delete {
        table: table.to_string(),
        key: key.to_string(),
    })?;
    inner.state.delete_raw(table, key);
    if inner.wal.needs_flush() {
        inner.wal.flush()?;
    }
    Ok(())
}

fn write_through(
    inner: &mut Inner,
    table: &str,
    key: &str,
    value: serde_json::Value,
) -> Result<(), KvError> {
    inner.wal.append(&WalOp::Put {
        table: table.to_string(),
        key: key.to_string(),
        value: value.clone(),
    })?;
    inner.state.put_raw(table, key, value);
    if inner.wal.needs_flush() {
        inner.wal.flush()?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
