// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quaero submit` — validate and submit a job definition file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use quaero_core::JobDefinition;
use quaero_daemon::Request;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct SubmitArgs {
    /// Path to a JSON job definition file
    pub definition: PathBuf,
}

pub async fn run(args: SubmitArgs, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(&args.definition)
        .with_context(|| format!("reading {}", args.definition.display()))?;
    let definition: JobDefinition = serde_json::from_str(&content)
        .with_context(|| format!("parsing {} as a job definition", args.definition.display()))?;

    let mut client = DaemonClient::connect().await?;
    let response = client.call(Request::SubmitDefinition { definition }).await?;
    super::job::print_response(response, format)
}
