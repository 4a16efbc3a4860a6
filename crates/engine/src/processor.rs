// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Processor: a pool of queue consumers dispatching `QueueJob`s to
//! registered [`Worker`]s.
//!
//! Grounded in the teacher's `Executor::execute` — a span-wrapped dispatch
//! that logs elapsed time and success/failure — generalized here to a
//! multi-consumer pool pulling from the durable queue instead of a single
//! in-process effect call. Each receive runs the worker's `execute` inside
//! its own `tokio::spawn`, the idiomatic way to turn a worker panic into an
//! ordinary `JoinError` instead of taking the whole pool down with it.

use quaero_adapters::Worker;
use quaero_core::{
    Clock, Document, DocumentId, Event, IdGen, JobId, JobPhase, LogLevel, QueueJob, WorkerKind,
};
use quaero_storage::{DocumentStore, JobStateStore, KvError, QueueManager};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::event_bus::EventBus;

/// The JSON convention a [`Worker`]'s result payload may follow. All fields
/// are optional; a worker that returns an unrelated shape simply contributes
/// no documents and spawns no children.
#[derive(Debug, Default, serde::Deserialize)]
struct WorkerOutcome {
    #[serde(default)]
    documents: Vec<DocumentDraft>,
    #[serde(default)]
    spawn_children: Vec<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct DocumentDraft {
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

pub struct JobProcessor<C: Clock, G: IdGen> {
    queue: QueueManager,
    jobs: JobStateStore,
    documents: DocumentStore,
    bus: EventBus,
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
    clock: C,
    ids: G,
    queue_name: String,
    visibility_timeout_ms: u64,
}

impl<C: Clock, G: IdGen + 'static> JobProcessor<C, G> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: QueueManager,
        jobs: JobStateStore,
        documents: DocumentStore,
        bus: EventBus,
        workers: HashMap<WorkerKind, Arc<dyn Worker>>,
        clock: C,
        ids: G,
        queue_name: impl Into<String>,
        visibility_timeout_ms: u64,
    ) -> Self {
        Self {
            queue,
            jobs,
            documents,
            bus,
            workers,
            clock,
            ids,
            queue_name: queue_name.into(),
            visibility_timeout_ms,
        }
    }

    /// Spawn `pool_size` consumer tasks. Each loops receiving from the
    /// queue until `shutdown` reports `true`, at which point it stops
    /// pulling new work but lets any job it's mid-execute finish first.
    pub fn spawn_pool(
        self: Arc<Self>,
        pool_size: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        (0..pool_size)
            .map(|worker_idx| {
                let this = Arc::clone(&self);
                let mut shutdown = shutdown.clone();
                tokio::spawn(async move {
                    loop {
                        if *shutdown.borrow() {
                            break;
                        }
                        match this.try_once(worker_idx).await {
                            Ok(true) => continue,
                            Ok(false) => {
                                tokio::select! {
                                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                                    _ = shutdown.changed() => {}
                                }
                            }
                            Err(err) => {
                                tracing::error!(worker_idx, error = %err, "processor loop error");
                                tokio::time::sleep(Duration::from_millis(200)).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Receive and fully process at most one message. Returns `Ok(false)`
    /// when the queue was empty.
    async fn try_once(&self, worker_idx: usize) -> Result<bool, KvError> {
        let now_ms = self.clock.epoch_ms();
        let Some(msg) = self.queue.receive(&self.queue_name, now_ms)? else {
            return Ok(false);
        };

        let job: QueueJob = match serde_json::from_value(msg.body.clone()) {
            Ok(job) => job,
            Err(err) => {
                tracing::error!(error = %err, "dropping malformed queue message");
                self.queue.delete(&msg.id)?;
                return Ok(true);
            }
        };

        tracing::info_span!("job_execute", worker_idx, job_id = %job.id, kind = %job.kind)
            .in_scope(|| tracing::info!("received job"));

        let Some(worker) = self.workers.get(&job.kind).cloned() else {
            let message = format!("no worker registered for kind {}", job.kind);
            self.finish_failed(&job, &message)?;
            self.queue.delete(&msg.id)?;
            return Ok(true);
        };

        if let Err(err) = worker.validate(&job) {
            self.finish_failed(&job, &err.to_string())?;
            self.queue.delete(&msg.id)?;
            return Ok(true);
        }

        self.jobs.update_state(&job.id, |s| {
            s.start(&self.clock);
            Ok(())
        })?;
        self.bus.publish(Event::JobStarted {
            job_id: job.id.clone(),
        });
        self.jobs.append_step_log(
            &job.id,
            &job.step_name,
            LogLevel::Info,
            self.clock.epoch_ms(),
            format!("job started: {} {}", job.kind, job.id),
        )?;

        let heartbeat = self.spawn_heartbeat(msg.id.clone());
        let worker_for_exec = Arc::clone(&worker);
        let job_for_exec = job.clone();
        let exec = tokio::spawn(async move { worker_for_exec.execute(&job_for_exec).await });
        let outcome = exec.await;
        heartbeat.abort();

        match outcome {
            Ok(Ok(payload)) => self.finish_completed(&job, payload).await?,
            Ok(Err(worker_err)) => self.finish_failed(&job, &worker_err.to_string())?,
            Err(join_err) if join_err.is_panic() => {
                self.finish_failed(&job, &format!("worker panicked: {join_err}"))?
            }
            Err(join_err) => self.finish_failed(&job, &join_err.to_string())?,
        }

        self.queue.delete(&msg.id)?;
        Ok(true)
    }

    fn spawn_heartbeat(&self, message_id: quaero_core::QueueMessageId) -> tokio::task::JoinHandle<()> {
        let queue = self.queue.clone();
        let clock = self.clock.clone();
        let interval = Duration::from_millis((self.visibility_timeout_ms / 2).max(1_000));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if queue.extend(&message_id, clock.epoch_ms()).is_err() {
                    // Message was already deleted (job finished); nothing
                    // left to extend.
                    return;
                }
            }
        })
    }

    fn finish_failed(&self, job: &QueueJob, message: &str) -> Result<(), KvError> {
        self.jobs.update_state(&job.id, |s| {
            s.fail(message, &self.clock);
            Ok(())
        })?;
        self.jobs.append_step_log(
            &job.id,
            &job.step_name,
            LogLevel::Error,
            self.clock.epoch_ms(),
            format!("job failed: {message}"),
        )?;
        self.bus.publish(Event::JobFailed {
            job_id: job.id.clone(),
            error: message.to_string(),
        });
        Ok(())
    }

    async fn finish_completed(
        &self,
        job: &QueueJob,
        payload: serde_json::Value,
    ) -> Result<(), KvError> {
        let outcome: WorkerOutcome = serde_json::from_value(payload.clone()).unwrap_or_default();

        for draft in outcome.documents {
            let doc = Document::new(
                DocumentId::new(self.ids.next()),
                job.id.clone(),
                job.parent_id.clone(),
                draft.source_url.clone(),
                draft.title,
                draft.body,
                draft.metadata,
                self.clock.epoch_ms(),
            );
            let document_id = doc.id.as_str().to_string();
            self.documents.insert(doc)?;
            let _ = self
                .bus
                .publish_sync(Event::DocumentSaved {
                    job_id: job.id.clone(),
                    parent_job_id: job.parent_id.clone(),
                    document_id,
                    source_url: draft.source_url,
                })
                .await;
        }

        if !outcome.spawn_children.is_empty() {
            if let Some(parent_id) = job.parent_id.clone() {
                for child_config in outcome.spawn_children {
                    let child_id = JobId::new(self.ids.next());
                    let child = QueueJob::new(
                        child_id.clone(),
                        Some(parent_id.clone()),
                        job.definition_id.clone(),
                        job.kind,
                        job.step_name.clone(),
                        JobPhase::Execution,
                        child_config,
                        job.metadata.clone(),
                        &self.clock,
                    );
                    self.jobs.create_job(child.clone())?;
                    self.jobs.update_state(&parent_id, |s| {
                        s.child_count += 1;
                        Ok(())
                    })?;
                    let now_nanos = self.clock.epoch_ms() as u128 * 1_000_000;
                    self.queue.enqueue(
                        &self.queue_name,
                        serde_json::to_value(&child)?,
                        now_nanos,
                        self.clock.epoch_ms(),
                    )?;
                    self.bus.publish(Event::JobSpawn {
                        parent_id: parent_id.clone(),
                        child_id,
                    });
                }
            } else {
                tracing::warn!(job_id = %job.id, "spawn_children ignored: job has no parent");
            }
        }

        self.jobs.update_state(&job.id, |s| {
            s.complete(&self.clock);
            s.metadata_json = payload.clone();
            Ok(())
        })?;
        self.jobs.append_step_log(
            &job.id,
            &job.step_name,
            LogLevel::Info,
            self.clock.epoch_ms(),
            "job completed",
        )?;
        self.bus.publish(Event::JobCompleted {
            job_id: job.id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
