// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job State Store & Step Log Aggregation: persistence for `QueueJob`,
//! `QueueJobState`, and per-step `StepLogEntry` lines.

use crate::kv::{KvError, KvStore, Storage};
use crate::record::Record;
use quaero_core::{JobId, JobStatus, LogLevel, QueueJob, QueueJobState, StepLogEntry};

impl Record for QueueJob {
    fn table() -> &'static str {
        "jobs"
    }

    fn key(&self) -> String {
        self.id.as_str().to_string()
    }
}

impl Record for QueueJobState {
    fn table() -> &'static str {
        "job_states"
    }

    fn key(&self) -> String {
        self.job_id.as_str().to_string()
    }
}

impl Record for StepLogEntry {
    fn table() -> &'static str {
        "step_logs"
    }

    fn key(&self) -> String {
        // Zero-padded line number so keys sort lexicographically in scan
        // order, matching log append order.
        format!("{}:{}:{:020}", self.job_id, self.step_name, self.line_number)
    }
}

/// A page of step log results, as returned to operators/CLI.
pub struct StepLogPage {
    pub entries: Vec<StepLogEntry>,
    /// Total entries matching `level_filter` (before pagination).
    pub total_count: usize,
    /// Total entries for the step regardless of `level_filter`.
    pub unfiltered_count: usize,
}

#[derive(Clone)]
pub struct JobStateStore {
    jobs: KvStore<QueueJob>,
    states: KvStore<QueueJobState>,
    logs: KvStore<StepLogEntry>,
}

impl JobStateStore {
    pub fn new(storage: &Storage) -> Self {
        Self {
            jobs: storage.table(),
            states: storage.table(),
            logs: storage.table(),
        }
    }

    /// Create a job and its initial pending state. Callers that fan out
    /// children must persist the parent's job+state before enqueuing any
    /// child, never the reverse.
    pub fn create_job(&self, job: QueueJob) -> Result<(), KvError> {
        let state = QueueJobState::new_pending(job.id.clone());
        self.jobs.insert(job)?;
        self.states.insert(state)
    }

    pub fn get_job(&self, id: &JobId) -> Result<QueueJob, KvError> {
        self.jobs.get(id.as_str())
    }

    pub fn get_state(&self, id: &JobId) -> Result<QueueJobState, KvError> {
        self.states.get(id.as_str())
    }

    pub fn list_by_parent(&self, parent_id: &JobId) -> Result<Vec<QueueJob>, KvError> {
        self.jobs
            .find(|j| j.parent_id.as_ref() == Some(parent_id))
    }

    pub fn list_by_status(&self, status: JobStatus) -> Result<Vec<QueueJobState>, KvError> {
        self.states.find(|s| s.status == status)
    }

    /// Every job whose state hasn't reached a terminal status yet, used by
    /// the Job Monitor's periodic reconciliation pass.
    pub fn list_non_terminal(&self) -> Result<Vec<QueueJobState>, KvError> {
        self.states.find(|s| !s.status.is_terminal())
    }

    pub fn update_state(
        &self,
        id: &JobId,
        f: impl FnOnce(&mut QueueJobState) -> Result<(), KvError>,
    ) -> Result<QueueJobState, KvError> {
        self.states.update(id.as_str(), f)
    }

    /// Append one log line, assigning the next contiguous `line_number` for
    /// `(job_id, step_name)`.
    pub fn append_step_log(
        &self,
        job_id: &JobId,
        step_name: &str,
        level: LogLevel,
        timestamp_ms: u64,
        text: impl Into<String>,
    ) -> Result<StepLogEntry, KvError> {
        let next_line = self
            .logs
            .find(|e: &StepLogEntry| e.job_id == *job_id && e.step_name == step_name)?
            .into_iter()
            .map(|e| e.line_number)
            .max()
            .unwrap_or(0)
            + 1;

        let entry = StepLogEntry {
            job_id: job_id.clone(),
            step_name: step_name.to_string(),
            line_number: next_line,
            level,
            timestamp_ms,
            text: text.into(),
        };
        self.logs.insert(entry.clone())?;
        Ok(entry)
    }

    /// Paginated step log retrieval with an optional minimum level filter.
    pub fn get_step_logs(
        &self,
        job_id: &JobId,
        step_name: &str,
        level_filter: Option<LogLevel>,
        offset: usize,
        limit: usize,
    ) -> Result<StepLogPage, KvError> {
        let mut all = self
            .logs
            .find(|e: &StepLogEntry| e.job_id == *job_id && e.step_name == step_name)?;
        all.sort_by_key(|e| e.line_number);
        let unfiltered_count = all.len();

        let filtered: Vec<StepLogEntry> = match level_filter {
            Some(min) => all.into_iter().filter(|e| e.level >= min).collect(),
            None => all,
        };
        let total_count = filtered.len();
        let entries = filtered.into_iter().skip(offset).take(limit).collect();

        Ok(StepLogPage {
            entries,
            total_count,
            unfiltered_count,
        })
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
