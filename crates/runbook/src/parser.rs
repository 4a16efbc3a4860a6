// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses a job definition from its HCL text form into [`JobDefinition`].
//!
//! Top-level attributes (`id`, `name`, `enabled`, `tags`, `auth_id`) sit
//! alongside repeated `step "name" { ... }` blocks; each step's `type` and
//! `depends` are typed, everything else falls into either a `filter_`-
//! prefixed predicate or the step's opaque `config`.

use crate::validate::{self, ValidationError};
use indexmap::IndexMap;
use quaero_core::{DefinitionId, JobDefinition, OnChildFailure, StepSpec, WorkerKind};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    id: String,
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    auth_id: String,
    #[serde(default)]
    step: IndexMap<String, RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    kind: WorkerKind,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    count: u32,
    #[serde(default)]
    on_child_failure: OnChildFailure,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

/// Parse one HCL document into a validated [`JobDefinition`].
///
/// Only parse-time structural checks run here (non-empty names, unknown
/// `depends` references, duplicate step names); the Job-Definition
/// Orchestrator re-validates for cycles at submission time since a
/// definition can also be built programmatically, bypassing this parser
/// entirely.
pub fn parse_definition(content: &str) -> Result<JobDefinition, ParseError> {
    let raw: RawDefinition = hcl::from_str(content)?;

    let steps = raw
        .step
        .into_iter()
        .map(|(name, raw_step)| build_step(name, raw_step))
        .collect();

    let definition = JobDefinition {
        id: DefinitionId::new(raw.id),
        name: raw.name,
        enabled: raw.enabled,
        tags: raw.tags,
        auth_id: raw.auth_id,
        steps,
    };

    validate::validate_structure(&definition)?;
    Ok(definition)
}

fn build_step(name: String, raw: RawStep) -> StepSpec {
    let mut filters = std::collections::HashMap::new();
    let mut config = serde_json::Map::new();
    for (key, value) in raw.extra {
        if let Some(filter_name) = key.strip_prefix("filter_") {
            filters.insert(filter_name.to_string(), stringify_filter_value(&value));
        } else {
            config.insert(key, value);
        }
    }

    StepSpec {
        name,
        kind: raw.kind,
        depends: raw.depends,
        count: raw.count,
        filters,
        config: Value::Object(config),
        on_child_failure: raw.on_child_failure,
    }
}

/// Render a filter's HCL value into the string form `JobDefinition::filter_values`
/// splits on commas. Arrays become comma-joined OR-lists; everything else
/// becomes its plain scalar text.
fn stringify_filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
