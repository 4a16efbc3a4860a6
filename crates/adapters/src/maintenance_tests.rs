use super::*;
use quaero_core::{FakeClock, JobId, JobPhase};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingClient {
    calls: AtomicUsize,
}

#[async_trait]
impl MaintenanceClient for CountingClient {
    async fn run(&self, _operation: &str) -> Result<(), WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn job(operation: &str) -> QueueJob {
    let clock = FakeClock::new();
    QueueJob::new(
        JobId::new("j1"),
        None,
        quaero_core::DefinitionId::new("d1"),
        WorkerKind::Maintenance,
        "maint",
        JobPhase::Execution,
        serde_json::json!({"operation": operation}),
        HashMap::new(),
        &clock,
    )
}

#[tokio::test]
async fn execute_runs_the_configured_operation() {
    let worker = MaintenanceWorker::new(CountingClient {
        calls: AtomicUsize::new(0),
    });
    let result = worker.execute(&job("vacuum")).await.unwrap();
    assert_eq!(result["operation"], "vacuum");
}

#[tokio::test]
async fn validate_rejects_unknown_operation() {
    let worker = MaintenanceWorker::new(CountingClient {
        calls: AtomicUsize::new(0),
    });
    let err = worker.validate(&job("drop_everything")).unwrap_err();
    assert!(matches!(err, WorkerError::InvalidConfig(_)));
}
