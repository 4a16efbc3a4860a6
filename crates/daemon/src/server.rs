// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches requests from the local socket to the storage/engine layer
//! and accepts connections on a Unix domain socket.

use crate::protocol::{ErrorKind, JobSummary, LogPage, Request, Response};
use crate::protocol_wire::{read_request, write_response};
use quaero_core::{Clock, JobId, JobStatus, SystemClock};
use quaero_engine::{EngineError, Orchestrator};
use quaero_storage::{JobStateStore, KeyValueStore, KvError};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;

/// Routes one decoded [`Request`] to the store/engine it concerns.
pub struct Handlers {
    pub jobs: JobStateStore,
    pub kv: KeyValueStore,
    pub orchestrator: Arc<Orchestrator<SystemClock>>,
    pub clock: SystemClock,
}

impl Handlers {
    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,
            Request::SubmitDefinition { definition } => match self.orchestrator.submit(definition).await {
                Ok(job_id) => self.job_response(&job_id),
                Err(err) => engine_error_response(err),
            },
            Request::GetJob { job_id } => self.job_response(&job_id),
            Request::ListJobs { status, parent_id } => self.list_jobs(status, parent_id),
            Request::GetLogs {
                job_id,
                step_name,
                level_filter,
                offset,
                limit,
            } => self.get_logs(&job_id, &step_name, level_filter, offset, limit),
            Request::KvGet { key } => match self.kv.get(&key) {
                Ok(kv) => Response::KvValue {
                    key: kv.display_key,
                    value: kv.value,
                },
                Err(err) => kv_error_response(err),
            },
            Request::KvPut { key, value } => {
                match self.kv.set(&key, value, self.clock.epoch_ms()) {
                    Ok(()) => Response::Ack,
                    Err(err) => kv_error_response(err),
                }
            }
        }
    }

    fn job_response(&self, job_id: &JobId) -> Response {
        match self.summarize(job_id) {
            Ok(job) => Response::Job { job },
            Err(err) => kv_error_response(err),
        }
    }

    fn list_jobs(&self, status: Option<JobStatus>, parent_id: Option<JobId>) -> Response {
        let result: Result<Vec<JobSummary>, KvError> = (|| {
            let job_ids: Vec<JobId> = if let Some(parent_id) = &parent_id {
                self.jobs
                    .list_by_parent(parent_id)?
                    .into_iter()
                    .map(|j| j.id)
                    .collect()
            } else if let Some(status) = status {
                self.jobs
                    .list_by_status(status)?
                    .into_iter()
                    .map(|s| s.job_id)
                    .collect()
            } else {
                self.jobs
                    .list_non_terminal()?
                    .into_iter()
                    .map(|s| s.job_id)
                    .collect()
            };
            job_ids.iter().map(|id| self.summarize(id)).collect()
        })();

        match result {
            Ok(jobs) => Response::Jobs { jobs },
            Err(err) => kv_error_response(err),
        }
    }

    fn get_logs(
        &self,
        job_id: &JobId,
        step_name: &str,
        level_filter: Option<quaero_core::LogLevel>,
        offset: usize,
        limit: usize,
    ) -> Response {
        match self
            .jobs
            .get_step_logs(job_id, step_name, level_filter, offset, limit)
        {
            Ok(page) => Response::Logs {
                page: LogPage {
                    lines: page
                        .entries
                        .iter()
                        .map(|e| format!("[{:?}] {}", e.level, e.text))
                        .collect(),
                    total_count: page.total_count,
                    unfiltered_count: page.unfiltered_count,
                },
            },
            Err(err) => kv_error_response(err),
        }
    }

    fn summarize(&self, job_id: &JobId) -> Result<JobSummary, KvError> {
        let job = self.jobs.get_job(job_id)?;
        let state = self.jobs.get_state(job_id)?;
        Ok(JobSummary {
            job_id: job.id,
            parent_id: job.parent_id,
            step_name: job.step_name,
            phase: job.phase,
            status: state.status,
            child_count: state.child_count,
            completed_children: state.completed_children,
            failed_children: state.failed_children,
            document_count: state.document_count,
            error: state.error,
        })
    }
}

fn kv_error_response(err: KvError) -> Response {
    let kind = match err {
        KvError::NotFound => ErrorKind::NotFound,
        KvError::AlreadyExists => ErrorKind::Conflict,
        KvError::Busy => ErrorKind::Busy,
        KvError::Fatal(_) => ErrorKind::Fatal,
    };
    Response::error(kind, err.to_string())
}

fn engine_error_response(err: EngineError) -> Response {
    let kind = match &err {
        EngineError::Validation(_) => ErrorKind::Validation,
        EngineError::NoStepManager(_) | EngineError::DefinitionNotFound(_) | EngineError::StepNotFound(_) => {
            ErrorKind::NotFound
        }
        EngineError::Storage(kv_err) => {
            return kv_error_response(match kv_err {
                KvError::NotFound => KvError::NotFound,
                KvError::AlreadyExists => KvError::AlreadyExists,
                KvError::Busy => KvError::Busy,
                KvError::Fatal(msg) => KvError::Fatal(msg.clone()),
            })
        }
        EngineError::EventHandler(_) | EngineError::Serialization(_) => ErrorKind::Fatal,
    };
    Response::error(kind, err.to_string())
}

/// Accept connections on `listener`, handling each with a cloned `handlers`
/// on its own task, until `shutdown` reports `true`.
pub async fn serve(
    listener: UnixListener,
    handlers: Arc<Handlers>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let handlers = Arc::clone(&handlers);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, handlers).await {
                                tracing::debug!(error = %err, "socket connection closed");
                            }
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "socket accept failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    handlers: Arc<Handlers>,
) -> Result<(), crate::protocol_wire::WireError> {
    loop {
        let request = match read_request(&mut stream).await {
            Ok(request) => request,
            Err(crate::protocol_wire::WireError::Io(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let response = handlers.dispatch(request).await;
        write_response(&mut stream, &response).await?;
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
