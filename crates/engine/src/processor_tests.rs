use super::*;
use crate::event_bus::EventBus;
use async_trait::async_trait;
use quaero_adapters::WorkerError;
use quaero_core::{DefinitionId, FakeClock, JobId, JobStatus, SequentialIdGen};
use quaero_storage::{JobStateStore, QueueManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;
use tokio::sync::watch;

struct ScriptedWorker {
    kind: WorkerKind,
    result: Box<dyn Fn() -> Result<serde_json::Value, WorkerError> + Send + Sync>,
    calls: AtomicUsize,
}

#[async_trait]
impl Worker for ScriptedWorker {
    fn kind(&self) -> WorkerKind {
        self.kind
    }

    async fn execute(&self, _job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }
}

struct PanicWorker;

#[async_trait]
impl Worker for PanicWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Crawler
    }

    async fn execute(&self, _job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        panic!("boom");
    }
}

fn harness() -> (
    tempfile::TempDir,
    QueueManager,
    JobStateStore,
    DocumentStore,
    EventBus,
) {
    let dir = tempdir().unwrap();
    let wal = quaero_storage::Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    let storage = quaero_storage::Storage::new(quaero_storage::MaterializedState::new(), wal);
    let queue = QueueManager::new(&storage).with_visibility_timeout_ms(60_000);
    let jobs = JobStateStore::new(&storage);
    let documents = DocumentStore::new(&storage);
    (dir, queue, jobs, documents, EventBus::new())
}

fn root_job(kind: WorkerKind) -> QueueJob {
    let clock = FakeClock::new();
    QueueJob::new(
        JobId::new("job-1"),
        None,
        DefinitionId::new("def"),
        kind,
        "step",
        JobPhase::Execution,
        serde_json::json!({}),
        HashMap::new(),
        &clock,
    )
}

fn enqueue(queue: &QueueManager, jobs: &JobStateStore, job: QueueJob) {
    jobs.create_job(job.clone()).unwrap();
    queue
        .enqueue("main", serde_json::to_value(&job).unwrap(), 1, 1)
        .unwrap();
}

#[tokio::test]
async fn processes_job_successfully_and_publishes_completed() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let job = root_job(WorkerKind::Crawler);
    enqueue(&queue, &jobs, job.clone());

    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(
        WorkerKind::Crawler,
        Arc::new(ScriptedWorker {
            kind: WorkerKind::Crawler,
            result: Box::new(|| Ok(serde_json::json!({"bytes": 10}))),
            calls: AtomicUsize::new(0),
        }),
    );

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents,
        bus,
        workers,
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    let processed = processor.try_once(0).await.unwrap();
    assert!(processed);
    let state = jobs.get_state(&job.id).unwrap();
    assert_eq!(state.status, JobStatus::Completed);
}

#[tokio::test]
async fn unregistered_kind_fails_job_and_acks_message() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let job = root_job(WorkerKind::Places);
    enqueue(&queue, &jobs, job.clone());

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents,
        bus,
        HashMap::new(),
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    processor.try_once(0).await.unwrap();
    let state = jobs.get_state(&job.id).unwrap();
    assert_eq!(state.status, JobStatus::Failed);
    assert!(state.error.unwrap().contains("no worker registered"));
}

struct RejectingWorker;

#[async_trait]
impl Worker for RejectingWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Crawler
    }

    fn validate(&self, _job: &QueueJob) -> Result<(), WorkerError> {
        Err(WorkerError::InvalidConfig("missing url".to_string()))
    }

    async fn execute(&self, _job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        unreachable!("validate should reject before execute runs")
    }
}

#[tokio::test]
async fn invalid_config_fails_job_without_executing() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let job = root_job(WorkerKind::Crawler);
    enqueue(&queue, &jobs, job.clone());

    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(WorkerKind::Crawler, Arc::new(RejectingWorker));

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents,
        bus,
        workers,
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    processor.try_once(0).await.unwrap();
    let state = jobs.get_state(&job.id).unwrap();
    assert_eq!(state.status, JobStatus::Failed);
    assert!(state.error.unwrap().contains("missing url"));
}

#[tokio::test]
async fn worker_panic_is_caught_and_job_marked_failed() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let job = root_job(WorkerKind::Crawler);
    enqueue(&queue, &jobs, job.clone());

    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(WorkerKind::Crawler, Arc::new(PanicWorker));

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents,
        bus,
        workers,
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    processor.try_once(0).await.unwrap();
    let state = jobs.get_state(&job.id).unwrap();
    assert_eq!(state.status, JobStatus::Failed);
    assert!(state.error.unwrap().contains("panicked"));
}

#[tokio::test]
async fn completed_job_persists_documents() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let job = root_job(WorkerKind::Crawler);
    enqueue(&queue, &jobs, job.clone());

    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(
        WorkerKind::Crawler,
        Arc::new(ScriptedWorker {
            kind: WorkerKind::Crawler,
            result: Box::new(|| {
                Ok(serde_json::json!({
                    "documents": [
                        {"source_url": "http://a", "title": "A", "body": "hi", "metadata": {}}
                    ]
                }))
            }),
            calls: AtomicUsize::new(0),
        }),
    );

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents.clone(),
        bus,
        workers,
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    processor.try_once(0).await.unwrap();
    let saved = documents.list_by_job(&job.id).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].source_url, "http://a");
}

#[tokio::test]
async fn spawn_children_enqueues_sibling_and_bumps_child_count() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let clock = FakeClock::new();
    let parent_id = JobId::new("parent");
    let parent = QueueJob::new(
        parent_id.clone(),
        None,
        DefinitionId::new("def"),
        WorkerKind::Crawler,
        "crawl",
        JobPhase::Orchestration,
        serde_json::json!({}),
        HashMap::new(),
        &clock,
    );
    jobs.create_job(parent).unwrap();
    jobs.update_state(&parent_id, |s| {
        s.child_count = 1;
        Ok(())
    })
    .unwrap();

    let child = QueueJob::new(
        JobId::new("child-1"),
        Some(parent_id.clone()),
        DefinitionId::new("def"),
        WorkerKind::Crawler,
        "crawl",
        JobPhase::Execution,
        serde_json::json!({}),
        HashMap::new(),
        &clock,
    );
    enqueue(&queue, &jobs, child.clone());

    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(
        WorkerKind::Crawler,
        Arc::new(ScriptedWorker {
            kind: WorkerKind::Crawler,
            result: Box::new(|| {
                Ok(serde_json::json!({
                    "spawn_children": [{"url": "http://discovered"}]
                }))
            }),
            calls: AtomicUsize::new(0),
        }),
    );

    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs.clone(),
        documents,
        bus,
        workers,
        clock,
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));

    processor.try_once(0).await.unwrap();

    let siblings = jobs.list_by_parent(&parent_id).unwrap();
    assert_eq!(siblings.len(), 2);
    let state = jobs.get_state(&parent_id).unwrap();
    assert_eq!(state.child_count, 2);
}

#[tokio::test]
async fn spawn_pool_stops_pulling_work_after_shutdown_signalled() {
    let (_dir, queue, jobs, documents, bus) = harness();
    let (tx, rx) = watch::channel(false);
    let processor = Arc::new(JobProcessor::new(
        queue,
        jobs,
        documents,
        bus,
        HashMap::new(),
        FakeClock::new(),
        SequentialIdGen::new("id"),
        "main",
        60_000,
    ));
    let handles = processor.spawn_pool(2, rx);
    tx.send(true).unwrap();
    for handle in handles {
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("worker loop should exit promptly after shutdown")
            .unwrap();
    }
}
