// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for worker-produced `Document`s, read by the agent worker's
//! filter scan and written by the crawler/places workers.

use crate::kv::{KvError, KvStore, Storage};
use crate::record::Record;
use quaero_core::{Document, DocumentId, JobId};

impl Record for Document {
    fn table() -> &'static str {
        "documents"
    }

    fn key(&self) -> String {
        self.id.as_str().to_string()
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: KvStore<Document>,
}

impl DocumentStore {
    pub fn new(storage: &Storage) -> Self {
        Self {
            inner: storage.table(),
        }
    }

    pub fn insert(&self, document: Document) -> Result<(), KvError> {
        self.inner.insert(document)
    }

    pub fn get(&self, id: &DocumentId) -> Result<Document, KvError> {
        self.inner.get(id.as_str())
    }

    pub fn update(
        &self,
        id: &DocumentId,
        f: impl FnOnce(&mut Document) -> Result<(), KvError>,
    ) -> Result<Document, KvError> {
        self.inner.update(id.as_str(), f)
    }

    /// All documents saved directly by a job (not its descendants).
    pub fn list_by_job(&self, job_id: &JobId) -> Result<Vec<Document>, KvError> {
        self.inner.find(|d| &d.job_id == job_id)
    }

    /// All documents saved by any child of `parent_job_id`, used by the
    /// agent worker to enumerate a crawl step's output.
    pub fn list_by_parent_job(&self, parent_job_id: &JobId) -> Result<Vec<Document>, KvError> {
        self.inner
            .find(|d| d.parent_job_id.as_ref() == Some(parent_job_id))
    }

    /// Documents matching every `filter_`-style predicate (AND across keys,
    /// OR within a comma-separated value), scoped to one parent job's tree.
    pub fn find_matching(
        &self,
        parent_job_id: &JobId,
        filters: &[(String, String)],
    ) -> Result<Vec<Document>, KvError> {
        self.inner.find(|d| {
            d.parent_job_id.as_ref() == Some(parent_job_id)
                && filters.iter().all(|(path, value)| d.matches_filter(path, value))
        })
    }
}

#[cfg(test)]
#[path = "document_store_tests.rs"]
mod tests;
