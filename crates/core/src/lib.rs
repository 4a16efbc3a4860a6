// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quaero-core: domain types for the Quaero job orchestration engine.
//! No I/O lives here — persistence is `quaero-storage`, dispatch is
//! `quaero-engine`.

pub mod clock;
pub mod credential;
pub mod definition;
pub mod document;
pub mod event;
pub mod id;
pub mod ids;
pub mod job;
pub mod keyvalue;
pub mod queue;
pub mod time_fmt;
pub mod worker_kind;

pub use clock::{Clock, FakeClock, SystemClock};
pub use credential::Credential;
pub use definition::{JobDefinition, StepSpec};
pub use document::Document;
pub use event::{Event, EventHandler, EventHandlerError};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use ids::{CredentialId, DefinitionId, DocumentId, JobId, QueueMessageId};
pub use job::{
    JobPhase, JobStatus, LogLevel, OnChildFailure, QueueJob, QueueJobState, StepLogEntry,
};
pub use keyvalue::KeyValue;
pub use queue::{QueueMessage, DEFAULT_MAX_RECEIVE, DEFAULT_VISIBILITY_TIMEOUT_MS};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use worker_kind::WorkerKind;
