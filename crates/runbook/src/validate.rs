// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parse-time structural checks on a [`JobDefinition`]: the things a bad
//! HCL file can get wrong that typed deserialization alone won't catch.
//! Full cycle detection happens later, at submission time, in the
//! Job-Definition Orchestrator — a definition built programmatically never
//! passes through this parser, so the orchestrator can't rely on it.

use quaero_core::JobDefinition;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("definition id must not be empty")]
    EmptyId,

    #[error("step name must not be empty")]
    EmptyStepName,

    #[error("definition has no steps")]
    NoSteps,

    #[error("step '{0}' depends on itself")]
    SelfDependency(String),

    #[error("step '{step}' depends on unknown step '{depends_on}'")]
    UnknownDependency { step: String, depends_on: String },
}

pub fn validate_structure(definition: &JobDefinition) -> Result<(), ValidationError> {
    if definition.id.as_str().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if definition.steps.is_empty() {
        return Err(ValidationError::NoSteps);
    }

    let names: std::collections::HashSet<&str> =
        definition.steps.iter().map(|s| s.name.as_str()).collect();

    for step in &definition.steps {
        if step.name.is_empty() {
            return Err(ValidationError::EmptyStepName);
        }
        for dep in &step.depends {
            if dep == &step.name {
                return Err(ValidationError::SelfDependency(step.name.clone()));
            }
            if !names.contains(dep.as_str()) {
                return Err(ValidationError::UnknownDependency {
                    step: step.name.clone(),
                    depends_on: dep.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
