// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Worker Interface: one `execute` entry point per [`WorkerKind`],
//! dispatched by `quaero-engine`'s Job Processor.

use async_trait::async_trait;
use quaero_core::{QueueJob, WorkerKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid job config: {0}")]
    InvalidConfig(String),
    #[error("external dependency failed: {0}")]
    Dependency(String),
}

/// A concrete job executor for one [`WorkerKind`]. Workers are generic over
/// their one real external dependency (an HTTP fetcher, an LLM client, a
/// places API client) the way the teacher's `Executor<S, A, N, C>` takes
/// its session/agent/notify adapters as type parameters: test code
/// substitutes fakes, production wiring substitutes real clients.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    fn kind(&self) -> WorkerKind;

    /// Reject a job whose `config` is missing fields this worker requires,
    /// before the Job Processor marks it `running`. The default accepts
    /// anything; workers with required config fields override this.
    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        let _ = job;
        Ok(())
    }

    /// Run the job to completion and return its result payload, which the
    /// Job Processor persists onto `QueueJobState::metadata_json` on
    /// success.
    async fn execute(&self, job: &QueueJob) -> Result<serde_json::Value, WorkerError>;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
