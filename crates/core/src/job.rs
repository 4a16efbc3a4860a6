// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record types: the immutable `QueueJob`, its mutable `QueueJobState`,
//! and per-step log lines.

use crate::clock::Clock;
use crate::ids::{DefinitionId, JobId};
use crate::worker_kind::WorkerKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a `QueueJob` as tracked in its `QueueJobState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Policy the Job Monitor applies when deciding a parent's terminal status
/// after a mix of child outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnChildFailure {
    #[default]
    FailParent,
    CompleteWithErrors,
}

/// Whether a `QueueJob` is a Step Manager's non-dispatched aggregation
/// record, or an execution unit the Job Processor pulls off the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Created by a Step Manager to track a step's children; never enqueued.
    Orchestration,
    /// A unit of work dispatched to a registered `Worker`.
    #[default]
    Execution,
}

/// The immutable part of a job record: everything fixed at creation time.
/// Never mutated after `insert`; status/progress lives in [`QueueJobState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: JobId,
    /// `None` for a top-level parent job; `Some(parent)` for a child fanned
    /// out by a Step Manager.
    pub parent_id: Option<JobId>,
    pub definition_id: DefinitionId,
    pub kind: WorkerKind,
    /// Name of the step (from the `JobDefinition`) this job instance runs.
    pub step_name: String,
    pub phase: JobPhase,
    pub config: serde_json::Value,
    pub metadata: HashMap<String, String>,
    pub created_at_ms: u64,
}

impl QueueJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: JobId,
        parent_id: Option<JobId>,
        definition_id: DefinitionId,
        kind: WorkerKind,
        step_name: impl Into<String>,
        phase: JobPhase,
        config: serde_json::Value,
        metadata: HashMap<String, String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            parent_id,
            definition_id,
            kind,
            step_name: step_name.into(),
            phase,
            config,
            metadata,
            created_at_ms: clock.epoch_ms(),
        }
    }
}

/// The mutable, frequently-updated part of a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJobState {
    pub job_id: JobId,
    pub status: JobStatus,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub error: Option<String>,
    /// Free-form progress counter (e.g. documents processed so far).
    pub progress: u64,
    pub metadata_json: serde_json::Value,
    pub child_count: u32,
    pub completed_children: u32,
    pub failed_children: u32,
    pub on_child_failure: OnChildFailure,
    /// Documents saved so far by this job's subtree, incremented
    /// synchronously as `document_saved` events arrive.
    pub document_count: u64,
}

impl QueueJobState {
    pub fn new_pending(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            started_at_ms: None,
            finished_at_ms: None,
            error: None,
            progress: 0,
            metadata_json: serde_json::Value::Null,
            child_count: 0,
            completed_children: 0,
            failed_children: 0,
            on_child_failure: OnChildFailure::default(),
            document_count: 0,
        }
    }

    pub fn start(&mut self, clock: &impl Clock) {
        self.status = JobStatus::Running;
        self.started_at_ms = Some(clock.epoch_ms());
    }

    pub fn complete(&mut self, clock: &impl Clock) {
        self.status = JobStatus::Completed;
        self.finished_at_ms = Some(clock.epoch_ms());
    }

    pub fn fail(&mut self, error: impl Into<String>, clock: &impl Clock) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.finished_at_ms = Some(clock.epoch_ms());
    }

    pub fn cancel(&mut self, clock: &impl Clock) {
        self.status = JobStatus::Cancelled;
        self.finished_at_ms = Some(clock.epoch_ms());
    }

    /// Have all fanned-out children reached a terminal state?
    pub fn children_done(&self) -> bool {
        self.child_count > 0
            && self.completed_children + self.failed_children >= self.child_count
    }

    /// Decide the parent's terminal status once all children are done,
    /// honoring `on_child_failure`.
    pub fn terminal_status_for_children(&self) -> JobStatus {
        if self.failed_children == 0 {
            JobStatus::Completed
        } else {
            match self.on_child_failure {
                OnChildFailure::FailParent => JobStatus::Failed,
                OnChildFailure::CompleteWithErrors => JobStatus::Completed,
            }
        }
    }
}

/// Severity level of a [`StepLogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One line of a job step's log. `line_number` is strictly monotonic and
/// contiguous starting at 1, scoped to `(job_id, step_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepLogEntry {
    pub job_id: JobId,
    pub step_name: String,
    pub line_number: u64,
    pub level: LogLevel,
    pub timestamp_ms: u64,
    pub text: String,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
