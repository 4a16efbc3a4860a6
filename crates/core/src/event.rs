// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published on the event bus, the system's record of "what happened".

use crate::ids::JobId;
use crate::job::JobStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Every event kind the engine publishes. Tagged so the wire/log
/// representation carries an explicit `type` discriminant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "job:created")]
    JobCreated { job_id: JobId },
    #[serde(rename = "job:started")]
    JobStarted { job_id: JobId },
    /// A Step Manager fanned out a child job under a parent.
    #[serde(rename = "job:spawn")]
    JobSpawn { parent_id: JobId, child_id: JobId },
    /// Emitted by the Job Monitor after recomputing a parent's aggregates.
    #[serde(rename = "job:progress")]
    JobProgress {
        job_id: JobId,
        status: JobStatus,
        completed_children: u32,
        failed_children: u32,
        child_count: u32,
        document_count: u64,
    },
    #[serde(rename = "job:completed")]
    JobCompleted { job_id: JobId },
    #[serde(rename = "job:failed")]
    JobFailed { job_id: JobId, error: String },
    #[serde(rename = "job:cancelled")]
    JobCancelled { job_id: JobId },
    /// A worker persisted a document as part of executing a job. Published
    /// via `PublishSync` so the Job Monitor's `document_count` increment is
    /// visible before the worker's next progress snapshot.
    #[serde(rename = "document:saved")]
    DocumentSaved {
        job_id: JobId,
        parent_job_id: Option<JobId>,
        document_id: String,
        source_url: String,
    },
    #[serde(rename = "document:updated")]
    DocumentUpdated { job_id: JobId, document_id: String },
}

impl Event {
    /// The `type` tag string, for logging and the external wire schema.
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job:created",
            Event::JobStarted { .. } => "job:started",
            Event::JobSpawn { .. } => "job:spawn",
            Event::JobProgress { .. } => "job:progress",
            Event::JobCompleted { .. } => "job:completed",
            Event::JobFailed { .. } => "job:failed",
            Event::JobCancelled { .. } => "job:cancelled",
            Event::DocumentSaved { .. } => "document:saved",
            Event::DocumentUpdated { .. } => "document:updated",
        }
    }

    /// The job this event is about, where applicable.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobCreated { job_id }
            | Event::JobStarted { job_id }
            | Event::JobCompleted { job_id }
            | Event::JobFailed { job_id, .. }
            | Event::JobCancelled { job_id }
            | Event::JobProgress { job_id, .. }
            | Event::DocumentSaved { job_id, .. }
            | Event::DocumentUpdated { job_id, .. } => Some(job_id),
            Event::JobSpawn { parent_id, .. } => Some(parent_id),
        }
    }

    /// Short human-readable summary for structured log lines.
    pub fn log_summary(&self) -> String {
        match self {
            Event::JobCreated { job_id } => format!("job {job_id} created"),
            Event::JobStarted { job_id } => format!("job {job_id} started"),
            Event::JobSpawn {
                parent_id,
                child_id,
            } => format!("job {parent_id} spawned child {child_id}"),
            Event::JobProgress {
                job_id,
                completed_children,
                failed_children,
                child_count,
                ..
            } => format!(
                "job {job_id} progress {completed_children}/{child_count} ok, {failed_children} failed"
            ),
            Event::JobCompleted { job_id } => format!("job {job_id} completed"),
            Event::JobFailed { job_id, error } => format!("job {job_id} failed: {error}"),
            Event::JobCancelled { job_id } => format!("job {job_id} cancelled"),
            Event::DocumentSaved { job_id, document_id, .. } => {
                format!("job {job_id} saved document {document_id}")
            }
            Event::DocumentUpdated { job_id, document_id } => {
                format!("job {job_id} updated document {document_id}")
            }
        }
    }
}

/// An error raised by one [`EventHandler`]. Never propagated as a panic;
/// the event bus logs it and moves on to the next handler/event.
#[derive(Debug, thiserror::Error)]
#[error("event handler failed: {0}")]
pub struct EventHandlerError(pub String);

impl EventHandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A subscriber to events on the event bus. Implementors live in whichever
/// crate owns the side effect (persistence in `quaero-engine`'s monitor,
/// the websocket bridge in `quaero-adapters`); the trait itself is
/// I/O-agnostic so both can depend on it without a cyclic crate dependency.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(&self, event: &Event) -> Result<(), EventHandlerError>;
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
