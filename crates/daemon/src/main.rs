// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quaero Daemon (quaero-daemon)
//!
//! Background process that owns durable job state and the event loop
//! driving the Job Processor pool, the Job Monitor, and the
//! Job-Definition Orchestrator. Started and supervised by the `quaero` CLI.

use quaero_daemon::{Config, Daemon};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("quaero-daemon {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("quaero-daemon {}", env!("CARGO_PKG_VERSION"));
                println!("Quaero Daemon - durable job orchestration background process");
                println!();
                println!("USAGE:");
                println!("    quaero-daemon");
                println!();
                println!("The daemon is typically started by the `quaero` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: quaero-daemon [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let data_dir = Config::resolve_data_dir()?;
    let config = Config::load(data_dir)?;

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("starting quaero daemon");

    let daemon = match Daemon::start(config).await {
        Ok(daemon) => daemon,
        Err(err) => {
            error!("failed to start daemon: {err}");
            return Err(err.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("daemon ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    daemon.stop().await;
    info!("daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// rotation failures are silently ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Prefix `daemon_process::read_startup_error` on the CLI side scans for,
/// so the CLI can tell a fresh-start failure from noise earlier in the log.
const STARTUP_MARKER_PREFIX: &str = "--- quaero-daemon: starting";

/// Append a startup marker before the tracing subscriber is installed, so
/// it's visible even if the daemon exits before logging is set up.
fn write_startup_marker(log_path: &std::path::Path) {
    use std::io::Write;
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = writeln!(file, "{STARTUP_MARKER_PREFIX} (pid: {}) ---", std::process::id());
    }
}

fn setup_logging(
    config: &quaero_daemon::Config,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config
            .log_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new(".")),
        config
            .log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
