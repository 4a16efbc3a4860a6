// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Monitor: aggregates child job outcomes onto their parent and
//! decides when a parent is done.
//!
//! Grounded in the teacher's `lifecycle::reconcile` background task — a
//! periodic pass that re-derives state from source records rather than
//! trusting incremental counters — generalized here into two entry points
//! that share one idempotent `reconcile`: an event-driven path (fast,
//! reacts the moment a child finishes) and a 30s periodic sweep (the
//! safety net for events a crashed or restarted process never saw).

use async_trait::async_trait;
use parking_lot::Mutex;
use quaero_core::{Clock, Event, EventHandler, EventHandlerError, JobId, JobStatus, QueueJobState};
use quaero_storage::JobStateStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::EngineError;
use crate::event_bus::EventBus;

pub struct JobMonitor<C: Clock> {
    jobs: JobStateStore,
    bus: EventBus,
    clock: C,
    last_progress_emit: Mutex<HashMap<JobId, Instant>>,
    progress_throttle: Duration,
}

impl<C: Clock> JobMonitor<C> {
    pub fn new(jobs: JobStateStore, bus: EventBus, clock: C) -> Self {
        Self {
            jobs,
            bus,
            clock,
            last_progress_emit: Mutex::new(HashMap::new()),
            progress_throttle: Duration::from_millis(100),
        }
    }

    /// Re-derive `parent_id`'s child aggregates from its children's current
    /// states and, if they've all reached a terminal status, transition the
    /// parent. Idempotent: safe to call repeatedly for the same parent.
    pub fn reconcile(&self, parent_id: &JobId) -> Result<(), EngineError> {
        let children = self.jobs.list_by_parent(parent_id)?;
        if children.is_empty() {
            return Ok(());
        }

        let mut completed = 0u32;
        let mut failed = 0u32;
        for child in &children {
            let state = self.jobs.get_state(&child.id)?;
            match state.status {
                JobStatus::Completed => completed += 1,
                JobStatus::Failed | JobStatus::Cancelled => failed += 1,
                JobStatus::Pending | JobStatus::Running => {}
            }
        }

        let parent_state = self.jobs.update_state(parent_id, |s| {
            s.completed_children = completed;
            s.failed_children = failed;
            Ok(())
        })?;

        if parent_state.status.is_terminal() {
            return Ok(());
        }

        if parent_state.children_done() {
            self.finish_parent(parent_id, &parent_state)
        } else {
            self.maybe_emit_progress(parent_id, &parent_state);
            Ok(())
        }
    }

    fn finish_parent(&self, parent_id: &JobId, state: &QueueJobState) -> Result<(), EngineError> {
        let terminal = state.terminal_status_for_children();
        self.jobs.update_state(parent_id, |s| {
            match terminal {
                JobStatus::Failed => s.fail("one or more child jobs failed", &self.clock),
                _ => s.complete(&self.clock),
            }
            Ok(())
        })?;
        match terminal {
            JobStatus::Failed => self.bus.publish(Event::JobFailed {
                job_id: parent_id.clone(),
                error: "one or more child jobs failed".to_string(),
            }),
            _ => self.bus.publish(Event::JobCompleted {
                job_id: parent_id.clone(),
            }),
        }
        Ok(())
    }

    fn maybe_emit_progress(&self, parent_id: &JobId, state: &QueueJobState) {
        let now = self.clock.now();
        let should_emit = {
            let mut last = self.last_progress_emit.lock();
            let emit = last
                .get(parent_id)
                .map(|prev| now.duration_since(*prev) >= self.progress_throttle)
                .unwrap_or(true);
            if emit {
                last.insert(parent_id.clone(), now);
            }
            emit
        };
        if should_emit {
            self.bus.publish(Event::JobProgress {
                job_id: parent_id.clone(),
                status: state.status,
                completed_children: state.completed_children,
                failed_children: state.failed_children,
                child_count: state.child_count,
                document_count: state.document_count,
            });
        }
    }

    /// Reconcile every non-terminal job that has at least one child, i.e.
    /// every known parent. Driven by the periodic sweep.
    fn reconcile_all(&self) -> Result<(), EngineError> {
        for state in self.jobs.list_non_terminal()? {
            if state.child_count > 0 {
                self.reconcile(&state.job_id)?;
            }
        }
        Ok(())
    }

    /// Spawn the 30s periodic reconciliation sweep. Stops once `shutdown`
    /// reports `true`.
    pub fn spawn_periodic_reconciliation(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }
                if let Err(err) = self.reconcile_all() {
                    tracing::error!(error = %err, "periodic reconciliation failed");
                }
            }
        })
    }
}

#[async_trait]
impl<C: Clock> EventHandler for JobMonitor<C> {
    async fn handle(&self, event: &Event) -> Result<(), EventHandlerError> {
        match event {
            Event::JobCompleted { job_id } | Event::JobFailed { job_id, .. } => {
                if let Ok(job) = self.jobs.get_job(job_id) {
                    if let Some(parent_id) = job.parent_id {
                        self.reconcile(&parent_id)
                            .map_err(|err| EventHandlerError::new(err.to_string()))?;
                    }
                }
                Ok(())
            }
            Event::DocumentSaved {
                parent_job_id: Some(parent_id),
                ..
            } => {
                let state = self
                    .jobs
                    .update_state(parent_id, |s| {
                        s.document_count += 1;
                        Ok(())
                    })
                    .map_err(|err| EventHandlerError::new(err.to_string()))?;
                self.bus.publish(Event::JobProgress {
                    job_id: parent_id.clone(),
                    status: state.status,
                    completed_children: state.completed_children,
                    failed_children: state.failed_children,
                    child_count: state.child_count,
                    document_count: state.document_count,
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
