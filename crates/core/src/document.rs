// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Documents: the content workers produce. A crawler saves one `Document`
//! per fetched page; a places worker saves one per query; an agent worker
//! reads existing documents and writes its result into `agent_metadata`.

use crate::ids::{DocumentId, JobId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A piece of content persisted by a worker, keyed by the job that produced
/// it. `source_url` is the crawler's page URL, the places query string, or
/// empty for synthetic documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub job_id: JobId,
    pub parent_job_id: Option<JobId>,
    pub source_url: String,
    pub title: String,
    pub body: String,
    /// Free-form structured metadata (e.g. a places worker's place records).
    pub metadata: serde_json::Value,
    /// Per-agent results, keyed by `agent_type`, set by the agent worker.
    #[serde(default)]
    pub agent_metadata: HashMap<String, serde_json::Value>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Document {
    pub fn new(
        id: DocumentId,
        job_id: JobId,
        parent_job_id: Option<JobId>,
        source_url: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        metadata: serde_json::Value,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            job_id,
            parent_job_id,
            source_url: source_url.into(),
            title: title.into(),
            body: body.into(),
            metadata,
            agent_metadata: HashMap::new(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Read a metadata path in dot-notation (`rule_classifier.category`),
    /// as used by `filter_category`-style predicates.
    pub fn metadata_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = &self.metadata;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Does this document match a `filter_`-style predicate, where `value`
    /// may be a comma-separated list of OR-ed alternatives?
    pub fn matches_filter(&self, path: &str, value: &str) -> bool {
        let Some(found) = self.metadata_path(path) else {
            return false;
        };
        let found_str = match found {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        crate::definition::JobDefinition::filter_values(value)
            .iter()
            .any(|alt| *alt == found_str)
    }
}
