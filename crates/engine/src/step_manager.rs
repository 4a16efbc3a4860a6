// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step Managers: turn one `StepSpec` into a parent aggregation job plus its
//! fanned-out children.
//!
//! Grounded in the teacher's `Executor<S, A, N, C>` adapter-genericity
//! pattern — one generic struct parameterized over the piece that actually
//! varies (here, how a step's children are planned) rather than four
//! hand-duplicated structs. `FanoutStepManager` owns the invariant every
//! kind shares (persist the parent before any child, never enqueue the
//! parent itself); each [`ChildPlanner`] owns only the per-kind fan-out
//! policy.

use async_trait::async_trait;
use quaero_core::{
    Clock, IdGen, JobDefinition, JobId, JobPhase, QueueJob, StepSpec, WorkerKind,
};
use quaero_storage::{DocumentStore, JobStateStore, QueueManager};
use std::collections::HashMap;

use crate::error::EngineError;

/// Per-kind policy for how a step's children are planned. The fan-out
/// mechanics (persistence order, the "always at least one child" invariant)
/// live in [`FanoutStepManager`], not here.
#[async_trait]
pub trait ChildPlanner: Send + Sync + 'static {
    fn kind(&self) -> WorkerKind;

    /// Build the per-child `config` payloads for this step. An empty
    /// result is valid (e.g. an agent step whose filter matched nothing);
    /// `FanoutStepManager` still guarantees at least one child is created.
    async fn plan_children(
        &self,
        step: &StepSpec,
        parent_metadata: &HashMap<String, String>,
    ) -> Result<Vec<serde_json::Value>, EngineError>;
}

/// Routes a `StepSpec` to its registered planner and persists the resulting
/// parent + children.
#[async_trait]
pub trait StepManager: Send + Sync + 'static {
    fn kind(&self) -> WorkerKind;

    async fn create_parent_job(
        &self,
        definition: &JobDefinition,
        step: &StepSpec,
        parent_metadata: HashMap<String, String>,
    ) -> Result<JobId, EngineError>;
}

pub struct FanoutStepManager<P: ChildPlanner, C: Clock, G: IdGen> {
    jobs: JobStateStore,
    queue: QueueManager,
    clock: C,
    ids: G,
    planner: P,
    queue_name: String,
}

impl<P: ChildPlanner, C: Clock, G: IdGen> FanoutStepManager<P, C, G> {
    pub fn new(
        jobs: JobStateStore,
        queue: QueueManager,
        clock: C,
        ids: G,
        planner: P,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            queue,
            clock,
            ids,
            planner,
            queue_name: queue_name.into(),
        }
    }
}

#[async_trait]
impl<P: ChildPlanner, C: Clock, G: IdGen> StepManager for FanoutStepManager<P, C, G> {
    fn kind(&self) -> WorkerKind {
        self.planner.kind()
    }

    async fn create_parent_job(
        &self,
        definition: &JobDefinition,
        step: &StepSpec,
        parent_metadata: HashMap<String, String>,
    ) -> Result<JobId, EngineError> {
        let mut child_configs = self.planner.plan_children(step, &parent_metadata).await?;
        if child_configs.is_empty() {
            child_configs.push(step.config.clone());
        }

        let parent_id = JobId::new(self.ids.next());
        let parent = QueueJob::new(
            parent_id.clone(),
            None,
            definition.id.clone(),
            WorkerKind::ParentMonitor,
            step.name.clone(),
            JobPhase::Orchestration,
            step.config.clone(),
            parent_metadata.clone(),
            &self.clock,
        );
        self.jobs.create_job(parent)?;
        self.jobs.update_state(&parent_id, |s| {
            s.child_count = child_configs.len() as u32;
            s.on_child_failure = step.on_child_failure;
            Ok(())
        })?;

        for config in child_configs {
            let child_id = JobId::new(self.ids.next());
            let child = QueueJob::new(
                child_id,
                Some(parent_id.clone()),
                definition.id.clone(),
                step.kind,
                step.name.clone(),
                JobPhase::Execution,
                config,
                parent_metadata.clone(),
                &self.clock,
            );
            self.jobs.create_job(child.clone())?;
            let now_nanos = self.clock.epoch_ms() as u128 * 1_000_000;
            self.queue.enqueue(
                &self.queue_name,
                serde_json::to_value(&child)?,
                now_nanos,
                self.clock.epoch_ms(),
            )?;
        }

        Ok(parent_id)
    }
}

/// One child per `start_urls` entry (or the step's single `url`). Falls
/// back to one child carrying the step's whole config when neither is set,
/// satisfied by `FanoutStepManager`'s empty-result guard.
pub struct CrawlerChildPlanner;

#[async_trait]
impl ChildPlanner for CrawlerChildPlanner {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Crawler
    }

    async fn plan_children(
        &self,
        step: &StepSpec,
        _parent_metadata: &HashMap<String, String>,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        if let Some(urls) = step.config.get("start_urls").and_then(|v| v.as_array()) {
            return Ok(urls
                .iter()
                .filter_map(|url| url.as_str())
                .map(|url| serde_json::json!({"url": url}))
                .collect());
        }
        if let Some(url) = step.config.get("url").and_then(|v| v.as_str()) {
            return Ok(vec![serde_json::json!({"url": url})]);
        }
        Ok(Vec::new())
    }
}

/// One child per document matching the step's `filter_` predicates, scanned
/// from the parent job of the step it `depends` on. With no resolvable
/// dependency, falls back (via the empty-result guard) to one child
/// carrying the step's own config.
pub struct AgentChildPlanner {
    documents: DocumentStore,
}

impl AgentChildPlanner {
    pub fn new(documents: DocumentStore) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl ChildPlanner for AgentChildPlanner {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Agent
    }

    async fn plan_children(
        &self,
        step: &StepSpec,
        parent_metadata: &HashMap<String, String>,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        let Some(dep_name) = step.depends.first() else {
            return Ok(Vec::new());
        };
        let Some(dep_parent_id) = parent_metadata.get(&format!("prior_step_job:{dep_name}"))
        else {
            return Ok(Vec::new());
        };
        let filters: Vec<(String, String)> = step
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let docs = self
            .documents
            .find_matching(&JobId::new(dep_parent_id.clone()), &filters)?;
        Ok(docs
            .into_iter()
            .map(|doc| {
                let mut config = step.config.clone();
                if let Some(obj) = config.as_object_mut() {
                    obj.insert(
                        "document_id".to_string(),
                        serde_json::Value::String(doc.id.as_str().to_string()),
                    );
                }
                config
            })
            .collect())
    }
}

/// One child per location query in the step config.
pub struct PlacesChildPlanner;

#[async_trait]
impl ChildPlanner for PlacesChildPlanner {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Places
    }

    async fn plan_children(
        &self,
        step: &StepSpec,
        _parent_metadata: &HashMap<String, String>,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        if let Some(queries) = step.config.get("queries").and_then(|v| v.as_array()) {
            return Ok(queries.iter().cloned().map(|q| serde_json::json!({"query": q})).collect());
        }
        Ok(Vec::new())
    }
}

/// Defaults to `{vacuum, analyze, reindex}` when the step doesn't specify a
/// `count` (the one kind with a meaningful built-in default fan-out).
pub struct MaintenanceChildPlanner;

#[async_trait]
impl ChildPlanner for MaintenanceChildPlanner {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Maintenance
    }

    async fn plan_children(
        &self,
        step: &StepSpec,
        _parent_metadata: &HashMap<String, String>,
    ) -> Result<Vec<serde_json::Value>, EngineError> {
        if step.count == 0 {
            return Ok(["vacuum", "analyze", "reindex"]
                .into_iter()
                .map(|op| serde_json::json!({"operation": op}))
                .collect());
        }
        Ok((0..step.count)
            .map(|_| step.config.clone())
            .collect())
    }
}

#[cfg(test)]
#[path = "step_manager_tests.rs"]
mod tests;
