// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quaero get` / `quaero list` / `quaero logs` — query job state.

use anyhow::{anyhow, Result};
use clap::Args;
use quaero_core::{JobId, JobStatus, LogLevel};
use quaero_daemon::{ErrorKind, JobSummary, Response};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct GetArgs {
    /// Job id
    pub job_id: String,
}

pub async fn get(args: GetArgs, format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    let response = client
        .call(quaero_daemon::Request::GetJob {
            job_id: JobId::new(args.job_id),
        })
        .await?;
    print_response(response, format)
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by job status (pending, running, completed, failed, cancelled)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by parent job id
    #[arg(long)]
    pub parent: Option<String>,
}

pub async fn list(args: ListArgs, format: OutputFormat) -> Result<()> {
    let status = args.status.as_deref().map(parse_status).transpose()?;
    let parent_id = args.parent.map(JobId::new);

    let mut client = DaemonClient::connect().await?;
    let response = client
        .call(quaero_daemon::Request::ListJobs { status, parent_id })
        .await?;

    match response {
        Response::Jobs { jobs } => {
            render_jobs(&jobs, format);
            Ok(())
        }
        Response::Error { kind, message } => Err(error_for(kind, message)),
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}

#[derive(Args)]
pub struct LogsArgs {
    /// Job id
    pub job_id: String,
    /// Step name within the job
    pub step_name: String,
    /// Only show lines at or above this level (debug, info, warn, error)
    #[arg(long)]
    pub level: Option<String>,
    /// Skip this many lines before the page
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Maximum number of lines to return
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

pub async fn logs(args: LogsArgs, format: OutputFormat) -> Result<()> {
    let level_filter = args.level.as_deref().map(parse_level).transpose()?;

    let mut client = DaemonClient::connect().await?;
    let response = client
        .call(quaero_daemon::Request::GetLogs {
            job_id: JobId::new(args.job_id),
            step_name: args.step_name,
            level_filter,
            offset: args.offset,
            limit: args.limit,
        })
        .await?;

    match response {
        Response::Logs { page } => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
                OutputFormat::Text => {
                    for line in &page.lines {
                        println!("{line}");
                    }
                    if page.lines.is_empty() {
                        eprintln!("no log entries");
                    }
                }
            }
            Ok(())
        }
        Response::Error { kind, message } => Err(error_for(kind, message)),
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}

fn parse_status(s: &str) -> Result<JobStatus> {
    match s.to_ascii_lowercase().as_str() {
        "pending" => Ok(JobStatus::Pending),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
        other => Err(anyhow!(
            "invalid status '{other}': expected one of pending, running, completed, failed, cancelled"
        )),
    }
}

fn parse_level(s: &str) -> Result<LogLevel> {
    match s.to_ascii_lowercase().as_str() {
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(anyhow!(
            "invalid level '{other}': expected one of debug, info, warn, error"
        )),
    }
}

fn render_jobs(jobs: &[JobSummary], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(jobs) {
                println!("{json}");
            }
        }
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("JOB"),
                Column::left("STEP"),
                Column::status("STATUS"),
                Column::left("PHASE"),
                Column::right("CHILDREN"),
                Column::muted("ERROR"),
            ]);
            for job in jobs {
                table.row(vec![
                    job.job_id.to_string(),
                    job.step_name.clone(),
                    format!("{:?}", job.status).to_lowercase(),
                    format!("{:?}", job.phase).to_lowercase(),
                    format!("{}/{}", job.completed_children, job.child_count),
                    job.error.clone().unwrap_or_default(),
                ]);
            }
            let mut stdout = std::io::stdout();
            table.render(&mut stdout);
        }
    }
}

/// Render a single-job/ack/pong/kv response uniformly across commands.
pub fn print_response(response: Response, format: OutputFormat) -> Result<()> {
    match response {
        Response::Job { job } => {
            render_jobs(std::slice::from_ref(&job), format);
            Ok(())
        }
        Response::Jobs { jobs } => {
            render_jobs(&jobs, format);
            Ok(())
        }
        Response::Ack => {
            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::json!({"result": "ack"}));
            } else {
                println!("ok");
            }
            Ok(())
        }
        Response::Pong => {
            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::json!({"result": "pong"}));
            } else {
                println!("pong");
            }
            Ok(())
        }
        Response::KvValue { key, value } => {
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"key": key, "value": value}));
                }
                OutputFormat::Text => println!("{value}"),
            }
            Ok(())
        }
        Response::Logs { page } => {
            for line in &page.lines {
                println!("{line}");
            }
            Ok(())
        }
        Response::Error { kind, message } => Err(error_for(kind, message)),
    }
}

fn error_for(kind: ErrorKind, message: String) -> anyhow::Error {
    anyhow!("{kind:?}: {message}")
}
