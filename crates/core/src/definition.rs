// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative job-definition domain types, parsed by `quaero-runbook` and
//! interpreted by the Job-Definition Orchestrator.

use crate::ids::DefinitionId;
use crate::job::OnChildFailure;
use crate::worker_kind::WorkerKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One step in a `JobDefinition`: what kind of worker runs it, how many
/// children to fan out, what filters narrow the work, and which prior steps
/// it depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkerKind,
    #[serde(default)]
    pub depends: Vec<String>,
    /// Number of child jobs to fan out. `0` means "use the Step Manager's
    /// default for this kind" (e.g. maintenance defaults to
    /// `{vacuum, analyze, reindex}`).
    #[serde(default)]
    pub count: u32,
    /// `filter_`-prefixed predicates, collected generically rather than
    /// declared per step kind. Values may be comma-separated OR lists.
    #[serde(default)]
    pub filters: HashMap<String, String>,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub on_child_failure: OnChildFailure,
}

/// A parsed, validated job definition: a DAG of steps identified by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Propagated onto every job and child job created from this
    /// definition, so downstream systems can attribute work to the caller
    /// that authorized it.
    pub auth_id: String,
    pub steps: Vec<StepSpec>,
}

fn default_true() -> bool {
    true
}

impl JobDefinition {
    /// Parse a `filter_` value into its OR-ed alternatives.
    pub fn filter_values<'a>(value: &'a str) -> Vec<&'a str> {
        value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
    }

    pub fn step(&self, name: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
