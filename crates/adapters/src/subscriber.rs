// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Event -> External Subscriber bridge: translates internal [`Event`]s
//! to the external wire schema, dropping kinds outside a configurable
//! whitelist and throttling high-volume kinds per job id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use quaero_core::{Clock, Event, EventHandler, EventHandlerError, JobId};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Where translated wire messages go once past the whitelist/throttle.
/// Production wiring fans this out over a WebSocket broadcast channel;
/// tests record what was sent.
pub trait ExternalSink: Send + Sync + 'static {
    fn send(&self, message: serde_json::Value);
}

/// Per-kind throttle: at most one emission per `(kind, job_id)` per window.
/// Kinds absent from this map are never throttled.
pub struct ThrottleConfig {
    windows: HashMap<&'static str, Duration>,
}

impl Default for ThrottleConfig {
    /// `job_spawn` and `job_progress` throttled; lifecycle terminals never are.
    fn default() -> Self {
        let mut windows = HashMap::new();
        windows.insert("job:spawn", Duration::from_millis(200));
        windows.insert("job:progress", Duration::from_millis(100));
        Self { windows }
    }
}

impl ThrottleConfig {
    pub fn window_for(&self, kind: &str) -> Option<Duration> {
        self.windows.get(kind).copied()
    }
}

pub struct ExternalSubscriber<S: ExternalSink, C: Clock> {
    sink: S,
    clock: C,
    whitelist: HashSet<&'static str>,
    throttle: ThrottleConfig,
    last_emit: Mutex<HashMap<(&'static str, JobId), Instant>>,
}

impl<S: ExternalSink, C: Clock> ExternalSubscriber<S, C> {
    pub fn new(sink: S, clock: C, whitelist: HashSet<&'static str>, throttle: ThrottleConfig) -> Self {
        Self {
            sink,
            clock,
            whitelist,
            throttle,
            last_emit: Mutex::new(HashMap::new()),
        }
    }

    /// The default whitelist: every job-lifecycle kind plus `document:saved`.
    pub fn default_whitelist() -> HashSet<&'static str> {
        [
            "job:created",
            "job:started",
            "job:spawn",
            "job:progress",
            "job:completed",
            "job:failed",
            "job:cancelled",
            "document:saved",
        ]
        .into_iter()
        .collect()
    }

    fn allowed(&self, event: &Event) -> bool {
        self.whitelist.contains(event.name())
    }

    fn throttled(&self, event: &Event) -> bool {
        let Some(job_id) = event.job_id().cloned() else {
            return false;
        };
        let Some(window) = self.throttle.window_for(event.name()) else {
            return false;
        };
        let now = self.clock.now();
        let mut last = self.last_emit.lock();
        let key = (event.name(), job_id);
        let skip = last
            .get(&key)
            .map(|prev| now.duration_since(*prev) < window)
            .unwrap_or(false);
        if !skip {
            last.insert(key, now);
        }
        skip
    }

    fn translate(&self, event: &Event) -> serde_json::Value {
        let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(Utc::now);
        let payload = match event {
            Event::JobCreated { job_id } => serde_json::json!({ "job_id": job_id }),
            Event::JobStarted { job_id } => {
                serde_json::json!({ "job_id": job_id, "timestamp": timestamp.to_rfc3339() })
            }
            Event::JobSpawn {
                parent_id,
                child_id,
            } => serde_json::json!({
                "parent_job_id": parent_id,
                "child_job_id": child_id,
            }),
            Event::JobProgress {
                job_id,
                status,
                completed_children,
                failed_children,
                child_count,
                document_count,
            } => serde_json::json!({
                "job_id": job_id,
                "status": status,
                "child_count": child_count,
                "completed_children": completed_children,
                "failed_children": failed_children,
                "document_count": document_count,
                "progress_text": format!("{completed_children}/{child_count} complete, {failed_children} failed"),
            }),
            Event::JobCompleted { job_id } => serde_json::json!({ "job_id": job_id, "status": "completed" }),
            Event::JobFailed { job_id, error } => {
                serde_json::json!({ "job_id": job_id, "status": "failed", "error": error })
            }
            Event::JobCancelled { job_id } => {
                serde_json::json!({ "job_id": job_id, "status": "cancelled" })
            }
            Event::DocumentSaved {
                job_id,
                parent_job_id,
                document_id,
                source_url,
            } => serde_json::json!({
                "job_id": job_id,
                "parent_job_id": parent_job_id,
                "document_id": document_id,
                "source_url": source_url,
                "timestamp": timestamp.to_rfc3339(),
            }),
            Event::DocumentUpdated { job_id, document_id } => {
                serde_json::json!({ "job_id": job_id, "document_id": document_id })
            }
        };
        serde_json::json!({
            "type": event.name(),
            "payload": payload,
            "timestamp": timestamp.to_rfc3339(),
        })
    }
}

#[async_trait]
impl<S: ExternalSink, C: Clock> EventHandler for ExternalSubscriber<S, C> {
    async fn handle(&self, event: &Event) -> Result<(), EventHandlerError> {
        if !self.allowed(event) || self.throttled(event) {
            return Ok(());
        }
        self.sink.send(self.translate(event));
        Ok(())
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
