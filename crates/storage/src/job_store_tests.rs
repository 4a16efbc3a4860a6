use super::*;
use crate::state::MaterializedState;
use crate::wal::Wal;
use quaero_core::{DefinitionId, FakeClock, JobPhase, WorkerKind};
use std::collections::HashMap;
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, JobStateStore) {
    let dir = tempdir().unwrap();
    let wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    let storage = Storage::new(MaterializedState::new(), wal);
    (dir, JobStateStore::new(&storage))
}

fn job(id: &str, parent: Option<&str>) -> QueueJob {
    let clock = FakeClock::new();
    QueueJob::new(
        JobId::new(id),
        parent.map(JobId::new),
        DefinitionId::new("def1"),
        WorkerKind::Crawler,
        "crawl",
        JobPhase::Execution,
        serde_json::json!({}),
        HashMap::new(),
        &clock,
    )
}

#[test]
fn create_job_persists_job_and_pending_state() {
    let (_dir, store) = store();
    store.create_job(job("j1", None)).unwrap();
    let state = store.get_state(&JobId::new("j1")).unwrap();
    assert_eq!(state.status, JobStatus::Pending);
}

#[test]
fn list_by_parent_returns_only_children() {
    let (_dir, store) = store();
    store.create_job(job("parent", None)).unwrap();
    store.create_job(job("c1", Some("parent"))).unwrap();
    store.create_job(job("c2", Some("parent"))).unwrap();
    store.create_job(job("other", None)).unwrap();

    let children = store.list_by_parent(&JobId::new("parent")).unwrap();
    assert_eq!(children.len(), 2);
}

#[test]
fn append_step_log_assigns_contiguous_line_numbers() {
    let (_dir, store) = store();
    let job_id = JobId::new("j1");
    let e1 = store
        .append_step_log(&job_id, "crawl", LogLevel::Info, 1, "first")
        .unwrap();
    let e2 = store
        .append_step_log(&job_id, "crawl", LogLevel::Info, 2, "second")
        .unwrap();
    assert_eq!(e1.line_number, 1);
    assert_eq!(e2.line_number, 2);
}

#[test]
fn get_step_logs_filters_by_level_and_paginates() {
    let (_dir, store) = store();
    let job_id = JobId::new("j1");
    store
        .append_step_log(&job_id, "crawl", LogLevel::Info, 1, "info line")
        .unwrap();
    store
        .append_step_log(&job_id, "crawl", LogLevel::Warn, 2, "warn line")
        .unwrap();
    store
        .append_step_log(&job_id, "crawl", LogLevel::Error, 3, "error line")
        .unwrap();

    let page = store
        .get_step_logs(&job_id, "crawl", Some(LogLevel::Warn), 0, 10)
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(page.unfiltered_count, 3);

    let first_page = store
        .get_step_logs(&job_id, "crawl", None, 0, 1)
        .unwrap();
    assert_eq!(first_page.entries.len(), 1);
    assert_eq!(first_page.entries[0].line_number, 1);
}

#[test]
fn update_state_rejects_missing_job() {
    let (_dir, store) = store();
    let err = store
        .update_state(&JobId::new("missing"), |_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, KvError::NotFound));
}
