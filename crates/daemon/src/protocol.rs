// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request/response types exchanged between `quaero-cli` and the
//! daemon over the local socket, framed by [`crate::protocol_wire`].

use quaero_core::{JobDefinition, JobId, JobPhase, JobStatus, LogLevel};
use serde::{Deserialize, Serialize};

/// One request frame sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Validate and submit a job definition; the orchestrator creates the
    /// first eligible parent jobs immediately.
    SubmitDefinition { definition: JobDefinition },
    GetJob { job_id: JobId },
    ListJobs {
        status: Option<JobStatus>,
        parent_id: Option<JobId>,
    },
    GetLogs {
        job_id: JobId,
        step_name: String,
        level_filter: Option<LogLevel>,
        offset: usize,
        limit: usize,
    },
    KvGet { key: String },
    KvPut { key: String, value: serde_json::Value },
    Ping,
}

/// Daemon-side view of a job, flattening the immutable record and its
/// mutable state for a single response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub parent_id: Option<JobId>,
    pub step_name: String,
    pub phase: JobPhase,
    pub status: JobStatus,
    pub child_count: u32,
    pub completed_children: u32,
    pub failed_children: u32,
    pub document_count: u64,
    pub error: Option<String>,
}

/// A page of log lines, mirroring `quaero_storage::job_store::StepLogPage`
/// but over owned text lines rather than full `StepLogEntry` records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub lines: Vec<String>,
    pub total_count: usize,
    pub unfiltered_count: usize,
}

/// The taxonomy from the error-handling design: every daemon-surfaced
/// failure maps to one of these, never a raw error string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Busy,
    Fatal,
}

/// One response frame sent by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Job { job: JobSummary },
    Jobs { jobs: Vec<JobSummary> },
    Logs { page: LogPage },
    KvValue { key: String, value: serde_json::Value },
    Ack,
    Pong,
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
