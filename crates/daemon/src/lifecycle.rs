// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup/shutdown: wires storage, the event bus, the four Step
//! Managers, the Job-Definition Orchestrator, the Job Processor pool, the
//! Job Monitor, and the external subscriber bridge together in the fixed
//! order the design notes require — storage, then event bus, then queue and
//! state stores, then monitor, then processor pool, then orchestrator —
//! and tears them down in reverse.

use crate::config::Config;
use crate::server::{self, Handlers};
use fs2::FileExt;
use quaero_adapters::{
    AgentWorker, CrawlerWorker, ExternalSubscriber, HttpCrawlFetcher, HttpLlmClient,
    HttpPlacesClient, MaintenanceWorker, PlacesWorker, StorageMaintenanceClient, ThrottleConfig,
    WebSocketSink, Worker,
};
use quaero_core::{SystemClock, UuidIdGen, WorkerKind};
use quaero_engine::{
    AgentChildPlanner, CrawlerChildPlanner, EventBus, FanoutStepManager, JobMonitor,
    MaintenanceChildPlanner, JobProcessor, Orchestrator, PlacesChildPlanner, StepManager,
};
use quaero_storage::recovery::RecoveryError;
use quaero_storage::{
    open_storage, Checkpointer, CredentialStore, DocumentStore, JobStateStore, KeyValueStore,
    QueueManager, Storage,
};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("daemon already running (lock held on {0})")]
    AlreadyRunning(std::path::PathBuf),
    #[error("failed to acquire lock file {path}: {source}")]
    Lock {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage recovery failed: {0}")]
    Recovery(#[from] RecoveryError),
    #[error("failed to bind socket {path}: {source}")]
    BindSocket {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to bind websocket address {addr}: {source}")]
    BindWebSocket {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Every background task the daemon spawned, plus the shutdown signal that
/// stops them. Held by the caller so it can await a clean drain on stop.
pub struct Daemon {
    storage: Storage,
    snapshot_path: std::path::PathBuf,
    _lock_file: File,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Daemon {
    /// Perform the full startup sequence: acquire the exclusive lock,
    /// replay durable state, wire every component, and spawn its
    /// background tasks. Returns once everything is accepting work.
    pub async fn start(config: Config) -> Result<Self, StartupError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|source| StartupError::CreateDir {
            path: config.data_dir.clone(),
            source,
        })?;
        if let Some(parent) = config.wal_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StartupError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let lock_file = acquire_lock(&config.lock_path)?;

        let storage = open_storage(&config.snapshot_path, &config.wal_path)?;

        let queue = QueueManager::new(&storage).with_visibility_timeout_ms(config.visibility_timeout_ms);
        let jobs = JobStateStore::new(&storage);
        let documents = DocumentStore::new(&storage);
        let _credentials = CredentialStore::new(&storage);
        let kv = KeyValueStore::new(&storage);

        let bus = EventBus::new();
        let clock = SystemClock;

        let monitor = Arc::new(JobMonitor::new(jobs.clone(), bus.clone(), clock.clone()));
        bus.subscribe("job:completed", monitor.clone());
        bus.subscribe("job:failed", monitor.clone());
        bus.subscribe("document:saved", monitor.clone());

        let step_managers = build_step_managers(&jobs, &queue, &documents, &config.queue_name, &clock);
        let orchestrator = Arc::new(Orchestrator::new(step_managers, bus.clone(), clock.clone()));
        bus.subscribe("job:completed", orchestrator.clone());
        bus.subscribe("job:failed", orchestrator.clone());

        let workers = build_workers(&config, &storage, &documents);
        let processor = Arc::new(JobProcessor::new(
            queue.clone(),
            jobs.clone(),
            documents.clone(),
            bus.clone(),
            workers,
            clock.clone(),
            UuidIdGen,
            config.queue_name.clone(),
            config.visibility_timeout_ms,
        ));

        let ws_sink = WebSocketSink::new(256);
        let external = Arc::new(ExternalSubscriber::new(
            ws_sink.clone(),
            clock.clone(),
            ExternalSubscriber::<WebSocketSink, SystemClock>::default_whitelist(),
            ThrottleConfig::default(),
        ));
        for kind in [
            "job:created",
            "job:started",
            "job:spawn",
            "job:progress",
            "job:completed",
            "job:failed",
            "job:cancelled",
            "document:saved",
            "document:updated",
        ] {
            bus.subscribe(kind, external.clone());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        tasks.extend(processor.spawn_pool(config.pool_size, shutdown_rx.clone()));
        tasks.push(
            monitor
                .clone()
                .spawn_periodic_reconciliation(Duration::from_millis(config.reaggregation_interval_ms), shutdown_rx.clone()),
        );
        tasks.push(spawn_flush_task(storage.clone(), shutdown_rx.clone()));

        let ws_listener = TcpListener::bind(&config.websocket_addr)
            .await
            .map_err(|source| StartupError::BindWebSocket {
                addr: config.websocket_addr.clone(),
                source,
            })?;
        tasks.push(tokio::spawn(quaero_adapters::websocket::serve(
            ws_listener,
            ws_sink,
            shutdown_rx.clone(),
        )));

        if config.socket_path.exists() {
            let _ = std::fs::remove_file(&config.socket_path);
        }
        let socket_listener =
            UnixListener::bind(&config.socket_path).map_err(|source| StartupError::BindSocket {
                path: config.socket_path.clone(),
                source,
            })?;
        let handlers = Arc::new(Handlers {
            jobs,
            kv,
            orchestrator,
            clock,
        });
        tasks.push(tokio::spawn(server::serve(socket_listener, handlers, shutdown_rx)));

        Ok(Self {
            storage,
            snapshot_path: config.snapshot_path,
            _lock_file: lock_file,
            shutdown_tx,
            tasks,
        })
    }

    /// Signal every background task to stop, wait for them to drain, and
    /// checkpoint the final state to disk so the next startup's WAL replay
    /// is bounded.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }

        let (state, seq) = self.storage.checkpoint_state();
        let checkpointer = Checkpointer::new(self.snapshot_path);
        match checkpointer.checkpoint_sync(seq, &state) {
            Ok(_) => {
                if let Err(err) = self.storage.truncate_wal_before(seq) {
                    tracing::warn!(error = %err, "failed to truncate wal after checkpoint");
                }
            }
            Err(err) => tracing::warn!(error = %err, "shutdown checkpoint failed"),
        }
    }
}

fn acquire_lock(lock_path: &std::path::Path) -> Result<File, StartupError> {
    let mut file = File::create(lock_path).map_err(|source| StartupError::Lock {
        path: lock_path.to_path_buf(),
        source,
    })?;
    file.try_lock_exclusive()
        .map_err(|_| StartupError::AlreadyRunning(lock_path.to_path_buf()))?;
    use std::io::Write;
    let _ = file.set_len(0);
    let _ = write!(file, "{}", std::process::id());
    Ok(file)
}

fn build_step_managers(
    jobs: &JobStateStore,
    queue: &QueueManager,
    documents: &DocumentStore,
    queue_name: &str,
    clock: &SystemClock,
) -> HashMap<WorkerKind, Arc<dyn StepManager>> {
    let mut managers: HashMap<WorkerKind, Arc<dyn StepManager>> = HashMap::new();
    managers.insert(
        WorkerKind::Crawler,
        Arc::new(FanoutStepManager::new(
            jobs.clone(),
            queue.clone(),
            clock.clone(),
            UuidIdGen,
            CrawlerChildPlanner,
            queue_name,
        )),
    );
    managers.insert(
        WorkerKind::Agent,
        Arc::new(FanoutStepManager::new(
            jobs.clone(),
            queue.clone(),
            clock.clone(),
            UuidIdGen,
            AgentChildPlanner::new(documents.clone()),
            queue_name,
        )),
    );
    managers.insert(
        WorkerKind::Places,
        Arc::new(FanoutStepManager::new(
            jobs.clone(),
            queue.clone(),
            clock.clone(),
            UuidIdGen,
            PlacesChildPlanner,
            queue_name,
        )),
    );
    managers.insert(
        WorkerKind::Maintenance,
        Arc::new(FanoutStepManager::new(
            jobs.clone(),
            queue.clone(),
            clock.clone(),
            UuidIdGen,
            MaintenanceChildPlanner,
            queue_name,
        )),
    );
    managers
}

fn build_workers(
    config: &Config,
    storage: &Storage,
    documents: &DocumentStore,
) -> HashMap<WorkerKind, Arc<dyn Worker>> {
    let mut workers: HashMap<WorkerKind, Arc<dyn Worker>> = HashMap::new();
    workers.insert(
        WorkerKind::Crawler,
        Arc::new(CrawlerWorker::new(HttpCrawlFetcher::default())),
    );
    workers.insert(
        WorkerKind::Agent,
        Arc::new(AgentWorker::new(
            HttpLlmClient::new(config.llm_endpoint.clone(), config.llm_api_key.clone()),
            documents.clone(),
        )),
    );
    workers.insert(
        WorkerKind::Places,
        Arc::new(PlacesWorker::new(HttpPlacesClient::new(
            config.places_base_url.clone(),
            config.places_api_key.clone(),
        ))),
    );
    workers.insert(
        WorkerKind::Maintenance,
        Arc::new(MaintenanceWorker::new(StorageMaintenanceClient::new(
            storage.clone(),
        ))),
    );
    workers
}

/// Periodically flush the WAL on its group-commit schedule, independent of
/// the less-frequent full checkpoint taken at shutdown.
fn spawn_flush_task(storage: Storage, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                _ = shutdown.changed() => {}
            }
            if let Err(err) = storage.maybe_flush() {
                tracing::warn!(error = %err, "wal flush failed");
            }
            if *shutdown.borrow() {
                break;
            }
        }
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
