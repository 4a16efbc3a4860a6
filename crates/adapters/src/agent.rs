// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent worker: reads one document, sends its body to an LLM client,
//! and stores the reply in the document's `agent_metadata`, keyed by
//! `agent_type`.

use crate::worker::{Worker, WorkerError};
use async_trait::async_trait;
use quaero_core::{DocumentId, QueueJob, WorkerKind};
use quaero_storage::DocumentStore;
use serde::Deserialize;

fn default_agent_type() -> String {
    "summary".to_string()
}

#[derive(Debug, Deserialize)]
struct AgentConfig {
    document_id: String,
    #[serde(default = "default_agent_type")]
    agent_type: String,
    /// Optional prefix prepended to the document body before it's sent to
    /// the LLM, e.g. "Summarize the following page:".
    #[serde(default)]
    prompt: String,
}

/// Production wiring supplies an HTTP-backed LLM client; tests supply a
/// fake that returns canned completions.
#[async_trait]
pub trait LlmClient: Send + Sync + 'static {
    async fn complete(&self, prompt: &str) -> Result<String, WorkerError>;
}

pub struct AgentWorker<C: LlmClient> {
    client: C,
    documents: DocumentStore,
}

impl<C: LlmClient> AgentWorker<C> {
    pub fn new(client: C, documents: DocumentStore) -> Self {
        Self { client, documents }
    }
}

#[async_trait]
impl<C: LlmClient> Worker for AgentWorker<C> {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Agent
    }

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        serde_json::from_value::<AgentConfig>(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    async fn execute(&self, job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        let config: AgentConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        let document_id = DocumentId::new(config.document_id.clone());
        let document = self
            .documents
            .get(&document_id)
            .map_err(|e| WorkerError::Dependency(e.to_string()))?;

        let prompt = if config.prompt.is_empty() {
            document.body.clone()
        } else {
            format!("{}\n\n{}", config.prompt, document.body)
        };
        let reply = self.client.complete(&prompt).await?;

        self.documents
            .update(&document_id, |doc| {
                doc.agent_metadata
                    .insert(config.agent_type.clone(), serde_json::json!(reply));
                Ok(())
            })
            .map_err(|e| WorkerError::Dependency(e.to_string()))?;

        Ok(serde_json::json!({
            "document_id": config.document_id,
            "agent_type": config.agent_type,
        }))
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
