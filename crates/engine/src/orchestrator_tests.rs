use super::*;
use parking_lot::Mutex as PlMutex;
use quaero_core::{FakeClock, OnChildFailure};

struct RecordingStepManager {
    kind: WorkerKind,
    calls: PlMutex<Vec<String>>,
}

impl RecordingStepManager {
    fn new(kind: WorkerKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            calls: PlMutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StepManager for RecordingStepManager {
    fn kind(&self) -> WorkerKind {
        self.kind
    }

    async fn create_parent_job(
        &self,
        _definition: &JobDefinition,
        step: &StepSpec,
        _parent_metadata: HashMap<String, String>,
    ) -> Result<JobId, EngineError> {
        let mut calls = self.calls.lock();
        calls.push(step.name.clone());
        Ok(JobId::new(format!("{}-parent", step.name)))
    }
}

fn step(name: &str, depends: &[&str]) -> StepSpec {
    StepSpec {
        name: name.to_string(),
        kind: WorkerKind::Crawler,
        depends: depends.iter().map(|s| s.to_string()).collect(),
        count: 0,
        filters: HashMap::new(),
        config: serde_json::json!({}),
        on_child_failure: OnChildFailure::default(),
    }
}

fn definition(steps: Vec<StepSpec>) -> JobDefinition {
    JobDefinition {
        id: DefinitionId::new("def1"),
        name: "d".to_string(),
        enabled: true,
        tags: vec![],
        auth_id: "auth1".to_string(),
        steps,
    }
}

fn orchestrator(manager: Arc<RecordingStepManager>) -> Orchestrator<FakeClock> {
    let mut managers: HashMap<WorkerKind, Arc<dyn StepManager>> = HashMap::new();
    managers.insert(WorkerKind::Crawler, manager);
    Orchestrator::new(managers, EventBus::new(), FakeClock::new())
}

#[tokio::test]
async fn submit_triggers_root_steps_but_not_dependents() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager.clone());
    let def = definition(vec![step("crawl", &[]), step("summarize", &["crawl"])]);

    orch.submit(def).await.unwrap();

    assert_eq!(manager.calls(), vec!["crawl".to_string()]);
}

#[tokio::test]
async fn completing_the_dependency_triggers_the_dependent_step() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager.clone());
    let def = definition(vec![step("crawl", &[]), step("summarize", &["crawl"])]);

    orch.submit(def).await.unwrap();
    orch.handle(&Event::JobCompleted {
        job_id: JobId::new("crawl-parent"),
    })
    .await
    .unwrap();

    assert_eq!(manager.calls(), vec!["crawl".to_string(), "summarize".to_string()]);
}

#[tokio::test]
async fn a_failed_dependency_still_unblocks_the_dependent_step() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager.clone());
    let def = definition(vec![step("crawl", &[]), step("summarize", &["crawl"])]);

    orch.submit(def).await.unwrap();
    orch.handle(&Event::JobFailed {
        job_id: JobId::new("crawl-parent"),
        error: "boom".to_string(),
    })
    .await
    .unwrap();

    assert_eq!(manager.calls(), vec!["crawl".to_string(), "summarize".to_string()]);
}

#[tokio::test]
async fn a_step_waits_for_every_dependency_before_triggering() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager.clone());
    let def = definition(vec![
        step("crawl_a", &[]),
        step("crawl_b", &[]),
        step("merge", &["crawl_a", "crawl_b"]),
    ]);

    orch.submit(def).await.unwrap();
    assert_eq!(manager.calls().len(), 2);

    orch.handle(&Event::JobCompleted {
        job_id: JobId::new("crawl_a-parent"),
    })
    .await
    .unwrap();
    assert_eq!(manager.calls().len(), 2, "merge must wait for crawl_b too");

    orch.handle(&Event::JobCompleted {
        job_id: JobId::new("crawl_b-parent"),
    })
    .await
    .unwrap();
    assert!(manager.calls().contains(&"merge".to_string()));
}

#[tokio::test]
async fn repeated_completion_events_do_not_double_trigger_a_step() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager.clone());
    let def = definition(vec![step("crawl", &[]), step("summarize", &["crawl"])]);

    orch.submit(def).await.unwrap();
    for _ in 0..3 {
        orch.handle(&Event::JobCompleted {
            job_id: JobId::new("crawl-parent"),
        })
        .await
        .unwrap();
    }

    assert_eq!(
        manager.calls().iter().filter(|n| *n == "summarize").count(),
        1
    );
}

#[tokio::test]
async fn submit_rejects_unknown_depends() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager);
    let def = definition(vec![step("summarize", &["missing"])]);

    let err = orch.submit(def).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn submit_rejects_a_dependency_cycle() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager);
    let def = definition(vec![step("a", &["b"]), step("b", &["a"])]);

    let err = orch.submit(def).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn submit_rejects_an_empty_definition() {
    let manager = RecordingStepManager::new(WorkerKind::Crawler);
    let orch = orchestrator(manager);
    let def = definition(vec![]);

    let err = orch.submit(def).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
