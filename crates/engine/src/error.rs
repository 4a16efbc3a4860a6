// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the orchestration engine: validation failures the
//! caller can fix, not-found lookups, and the storage errors the
//! underlying KV layer raises.

use quaero_core::WorkerKind;
use quaero_storage::KvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid job definition: {0}")]
    Validation(String),

    #[error("no step manager registered for worker kind {0}")]
    NoStepManager(WorkerKind),

    #[error("job definition {0} not found")]
    DefinitionNotFound(String),

    #[error("step {0} not found in definition")]
    StepNotFound(String),

    #[error(transparent)]
    Storage(#[from] KvError),

    #[error("event handler failed: {0}")]
    EventHandler(String),

    #[error("failed to serialize job payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<quaero_core::EventHandlerError> for EngineError {
    fn from(err: quaero_core::EventHandlerError) -> Self {
        EngineError::EventHandler(err.0)
    }
}
