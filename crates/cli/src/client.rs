// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `DaemonClient`: connects to the daemon's Unix socket, starting it in
//! the background on first use if it isn't already running.

use std::path::PathBuf;
use std::time::Duration;

use quaero_daemon::{read_response, write_request, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::daemon_process;
use crate::poll::{Poller, Tick};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not determine a state directory: set QUAERO_STATE_DIR or HOME")]
    NoStateDir,
    #[error("failed to start the daemon: {0}")]
    DaemonStartFailed(String),
    #[error("timed out waiting for the daemon to become ready")]
    StartupTimeout,
    #[error("i/o error talking to the daemon: {0}")]
    Io(#[from] std::io::Error),
    #[error("wire protocol error: {0}")]
    Wire(#[from] quaero_daemon::WireError),
}

/// Default time budget for the daemon to accept connections after a
/// background spawn, overridable via `QUAERO_TIMEOUT_CONNECT_MS`.
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Default time budget for a single IPC round-trip, overridable via
/// `QUAERO_TIMEOUT_IPC_MS`.
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(30))
}

/// Default time budget waiting for the daemon to exit on stop, overridable
/// via `QUAERO_TIMEOUT_EXIT_MS`.
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(10))
}

fn connect_poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

pub struct DaemonClient {
    stream: UnixStream,
}

impl DaemonClient {
    /// Connect to the running daemon, starting it in the background and
    /// waiting for the socket to come up if it isn't already running.
    pub async fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_process::daemon_socket()?;

        if let Ok(stream) = UnixStream::connect(&socket_path).await {
            return Ok(Self { stream });
        }

        if socket_path.exists() {
            daemon_process::cleanup_stale_socket()?;
        }

        daemon_process::start_daemon_background()?;
        Self::wait_for_socket(&socket_path).await
    }

    async fn wait_for_socket(socket_path: &PathBuf) -> Result<Self, ClientError> {
        let mut poller = Poller::new(connect_poll_interval(), Some(timeout_connect()));
        loop {
            if let Ok(stream) = UnixStream::connect(socket_path).await {
                return Ok(Self { stream });
            }
            match poller.tick().await {
                Tick::Ready => continue,
                Tick::Timeout => {
                    return Err(daemon_process::wrap_with_startup_error(
                        ClientError::StartupTimeout,
                    ))
                }
                Tick::Interrupted => return Err(ClientError::StartupTimeout),
            }
        }
    }

    /// Send one request and await its response, bounded by [`timeout_ipc`].
    pub async fn call(&mut self, request: Request) -> Result<Response, ClientError> {
        let result = tokio::time::timeout(timeout_ipc(), async {
            write_request(&mut self.stream, &request).await?;
            let response = read_response(&mut self.stream).await?;
            Ok::<Response, ClientError>(response)
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(ClientError::Io(std::io::Error::from(
                std::io::ErrorKind::TimedOut,
            ))),
        }
    }
}
