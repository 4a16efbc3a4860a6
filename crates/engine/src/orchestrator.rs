// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job-Definition Orchestrator: resolves a `JobDefinition`'s step
//! dependencies and routes each step to its registered Step Manager.
//!
//! Steps with no `depends` are triggered immediately on `submit`. A step
//! with dependencies is triggered once every dependency's parent job has
//! reached a terminal status — driven by subscribing to `job:completed` and
//! `job:failed` the same way the Job Monitor does, so the two stay
//! consistent with each other without sharing mutable state directly.

use async_trait::async_trait;
use parking_lot::Mutex;
use quaero_core::{
    Clock, DefinitionId, Event, EventHandler, EventHandlerError, JobDefinition, JobId, StepSpec,
    WorkerKind,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::error::EngineError;
use crate::event_bus::EventBus;
use crate::step_manager::StepManager;

struct RunState {
    definition: JobDefinition,
    parent_metadata: HashMap<String, String>,
    /// Step name -> its parent job id, once triggered.
    step_job_ids: HashMap<String, JobId>,
    /// Step names currently mid-trigger, to avoid double-firing a step
    /// whose dependencies finish on two different event-bus workers at once.
    triggering: HashSet<String>,
    finished: HashSet<String>,
}

pub struct Orchestrator<C: Clock> {
    step_managers: HashMap<WorkerKind, Arc<dyn StepManager>>,
    bus: EventBus,
    clock: C,
    runs: Mutex<HashMap<DefinitionId, RunState>>,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(step_managers: HashMap<WorkerKind, Arc<dyn StepManager>>, bus: EventBus, clock: C) -> Self {
        Self {
            step_managers,
            bus,
            clock,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Validate, register, and trigger every step with no dependencies.
    /// Returns the parent job id of the first root step triggered; callers
    /// that need other steps' ids look them up via `JobStateStore::list_by_parent`
    /// chains or the definition's step names.
    pub async fn submit(&self, definition: JobDefinition) -> Result<JobId, EngineError> {
        validate(&definition)?;

        let mut parent_metadata = HashMap::new();
        parent_metadata.insert("auth_id".to_string(), definition.auth_id.clone());

        let root_steps: Vec<StepSpec> = definition
            .steps
            .iter()
            .filter(|s| s.depends.is_empty())
            .cloned()
            .collect();

        self.runs.lock().insert(
            definition.id.clone(),
            RunState {
                definition: definition.clone(),
                parent_metadata,
                step_job_ids: HashMap::new(),
                triggering: HashSet::new(),
                finished: HashSet::new(),
            },
        );

        let mut first_id = None;
        for step in &root_steps {
            let id = self.trigger_step(&definition.id, step).await?;
            first_id.get_or_insert(id);
        }
        first_id.ok_or_else(|| {
            EngineError::Validation("definition has no root step".to_string())
        })
    }

    async fn trigger_step(
        &self,
        definition_id: &DefinitionId,
        step: &StepSpec,
    ) -> Result<JobId, EngineError> {
        let manager = self
            .step_managers
            .get(&step.kind)
            .cloned()
            .ok_or(EngineError::NoStepManager(step.kind))?;

        let (definition, parent_metadata) = {
            let mut runs = self.runs.lock();
            let run = runs
                .get_mut(definition_id)
                .ok_or_else(|| EngineError::DefinitionNotFound(definition_id.as_str().to_string()))?;
            run.triggering.insert(step.name.clone());
            (run.definition.clone(), run.parent_metadata.clone())
        };

        let result = manager
            .create_parent_job(&definition, step, parent_metadata)
            .await;

        let mut runs = self.runs.lock();
        if let Some(run) = runs.get_mut(definition_id) {
            run.triggering.remove(&step.name);
            if let Ok(parent_id) = &result {
                run.step_job_ids.insert(step.name.clone(), parent_id.clone());
            }
        }
        drop(runs);

        let parent_id = result?;
        self.bus.publish(Event::JobCreated {
            job_id: parent_id.clone(),
        });
        Ok(parent_id)
    }

    /// Mark the step whose parent job id is `job_id` as finished, and
    /// return every step that's now ready to trigger (all its `depends`
    /// finished, not already triggered or triggering).
    fn advance(&self, job_id: &JobId) -> Vec<(DefinitionId, StepSpec)> {
        let mut runs = self.runs.lock();
        for (definition_id, run) in runs.iter_mut() {
            let step_name = run
                .step_job_ids
                .iter()
                .find(|(_, id)| *id == job_id)
                .map(|(name, _)| name.clone());
            let Some(step_name) = step_name else {
                continue;
            };
            run.finished.insert(step_name);

            let ready: Vec<StepSpec> = run
                .definition
                .steps
                .iter()
                .filter(|s| {
                    !run.step_job_ids.contains_key(&s.name)
                        && !run.triggering.contains(&s.name)
                        && s.depends.iter().all(|d| run.finished.contains(d))
                })
                .cloned()
                .collect();
            for step in &ready {
                run.triggering.insert(step.name.clone());
            }
            return ready.into_iter().map(|s| (definition_id.clone(), s)).collect();
        }
        Vec::new()
    }
}

#[async_trait]
impl<C: Clock> EventHandler for Orchestrator<C> {
    async fn handle(&self, event: &Event) -> Result<(), EventHandlerError> {
        let job_id = match event {
            Event::JobCompleted { job_id } => job_id,
            Event::JobFailed { job_id, .. } => job_id,
            _ => return Ok(()),
        };
        for (definition_id, step) in self.advance(job_id) {
            if let Err(err) = self.trigger_step(&definition_id, &step).await {
                tracing::error!(error = %err, step = %step.name, "failed to trigger dependent step");
            }
        }
        Ok(())
    }
}

fn validate(definition: &JobDefinition) -> Result<(), EngineError> {
    if definition.steps.is_empty() {
        return Err(EngineError::Validation("definition has no steps".to_string()));
    }
    let names: HashSet<&str> = definition.steps.iter().map(|s| s.name.as_str()).collect();
    if names.len() != definition.steps.len() {
        return Err(EngineError::Validation("duplicate step names".to_string()));
    }
    for step in &definition.steps {
        for dep in &step.depends {
            if !names.contains(dep.as_str()) {
                return Err(EngineError::Validation(format!(
                    "step {} depends on unknown step {dep}",
                    step.name
                )));
            }
        }
    }

    let mut indegree: HashMap<&str, usize> = definition
        .steps
        .iter()
        .map(|s| (s.name.as_str(), s.depends.len()))
        .collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in &definition.steps {
        for dep in &step.depends {
            dependents.entry(dep.as_str()).or_default().push(&step.name);
        }
    }
    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut visited = 0;
    while let Some(name) = queue.pop_front() {
        visited += 1;
        if let Some(next) = dependents.get(name) {
            for &n in next {
                if let Some(entry) = indegree.get_mut(n) {
                    *entry -= 1;
                    if *entry == 0 {
                        queue.push_back(n);
                    }
                }
            }
        }
    }
    if visited != definition.steps.len() {
        return Err(EngineError::Validation(
            "dependency cycle detected among steps".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
