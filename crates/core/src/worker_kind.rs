// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of job types the engine knows how to route and execute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which registered [`Worker`](crate::Worker) (and which Step
/// Manager) a job belongs to. Kept as a closed enum so a typo in a
/// definition's `step.type` is caught at parse time rather than surfacing as
/// a runtime "no worker registered" error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Crawler,
    Agent,
    Places,
    Maintenance,
    /// Synthetic kind used internally for the parent aggregation job the
    /// orchestrator creates for every step; never dispatched to a worker.
    ParentMonitor,
}

impl WorkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Crawler => "crawler",
            WorkerKind::Agent => "agent",
            WorkerKind::Places => "places",
            WorkerKind::Maintenance => "maintenance",
            WorkerKind::ParentMonitor => "parent_monitor",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown worker kind: {0}")]
pub struct UnknownWorkerKind(String);

impl FromStr for WorkerKind {
    type Err = UnknownWorkerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crawler" => Ok(WorkerKind::Crawler),
            "agent" => Ok(WorkerKind::Agent),
            "places" => Ok(WorkerKind::Places),
            "maintenance" => Ok(WorkerKind::Maintenance),
            "parent_monitor" => Ok(WorkerKind::ParentMonitor),
            other => Err(UnknownWorkerKind(other.to_string())),
        }
    }
}
