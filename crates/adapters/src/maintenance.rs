// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The maintenance worker: runs one storage-maintenance operation
//! (`vacuum`, `analyze`, or `reindex`). Has no external collaborator of its
//! own; it drives whatever storage-level maintenance hook is wired in.

use crate::worker::{Worker, WorkerError};
use async_trait::async_trait;
use quaero_core::{QueueJob, WorkerKind};
use serde::Deserialize;

const OPERATIONS: [&str; 3] = ["vacuum", "analyze", "reindex"];

#[derive(Debug, Deserialize)]
struct MaintenanceConfig {
    operation: String,
}

/// The storage-maintenance hook a maintenance worker drives. Production
/// wiring runs the real `quaero-storage` compaction/index-rebuild passes;
/// tests supply a fake that just records which operations ran.
#[async_trait]
pub trait MaintenanceClient: Send + Sync + 'static {
    async fn run(&self, operation: &str) -> Result<(), WorkerError>;
}

pub struct MaintenanceWorker<C: MaintenanceClient> {
    client: C,
}

impl<C: MaintenanceClient> MaintenanceWorker<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: MaintenanceClient> Worker for MaintenanceWorker<C> {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Maintenance
    }

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        let config: MaintenanceConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        if !OPERATIONS.contains(&config.operation.as_str()) {
            return Err(WorkerError::InvalidConfig(format!(
                "unknown maintenance operation {}",
                config.operation
            )));
        }
        Ok(())
    }

    async fn execute(&self, job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        let config: MaintenanceConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        self.client.run(&config.operation).await?;
        Ok(serde_json::json!({ "operation": config.operation }))
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
