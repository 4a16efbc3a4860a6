// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quaero daemon` — start, stop, or check the background daemon directly.

use anyhow::Result;
use clap::{Args, Subcommand};
use quaero_daemon::Request;
use tokio::net::UnixStream;

use crate::daemon_process;
use crate::poll::{Poller, Tick};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon if it isn't already running
    Start,
    /// Stop the daemon
    Stop,
    /// Report whether the daemon is running
    Status,
}

pub async fn run(args: DaemonArgs) -> Result<()> {
    match args.command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop(),
        DaemonCommand::Status => status().await,
    }
}

async fn start() -> Result<()> {
    let socket_path = daemon_process::daemon_socket()?;
    if daemon_process::probe_socket(&socket_path) {
        println!("daemon already running");
        return Ok(());
    }

    daemon_process::cleanup_stale_socket()?;
    daemon_process::start_daemon_background()?;

    let mut poller = Poller::new(
        std::time::Duration::from_millis(50),
        Some(crate::client::timeout_connect()),
    );
    loop {
        if UnixStream::connect(&socket_path).await.is_ok() {
            println!("daemon started");
            return Ok(());
        }
        match poller.tick().await {
            Tick::Ready => continue,
            Tick::Timeout => {
                return Err(daemon_process::wrap_with_startup_error(
                    crate::client::ClientError::StartupTimeout,
                )
                .into())
            }
            Tick::Interrupted => {
                return Err(crate::client::ClientError::StartupTimeout.into())
            }
        }
    }
}

fn stop() -> Result<()> {
    daemon_process::stop_daemon_sync();
    println!("daemon stopped");
    Ok(())
}

async fn status() -> Result<()> {
    let socket_path = daemon_process::daemon_socket()?;
    let Ok(mut stream) = UnixStream::connect(&socket_path).await else {
        println!("daemon not running");
        return Ok(());
    };

    quaero_daemon::write_request(&mut stream, &Request::Ping).await?;
    match quaero_daemon::read_response(&mut stream).await {
        Ok(quaero_daemon::Response::Pong) => {
            println!("daemon running");
            Ok(())
        }
        _ => {
            println!("daemon not responding");
            Ok(())
        }
    }
}
