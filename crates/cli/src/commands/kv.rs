// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `quaero kv` — read or write a single key-value entry.

use anyhow::Result;
use clap::{Args, Subcommand};
use quaero_daemon::Request;

use crate::client::DaemonClient;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct KvArgs {
    #[command(subcommand)]
    pub command: KvCommand,
}

#[derive(Subcommand)]
pub enum KvCommand {
    /// Read a value by key
    Get { key: String },
    /// Write a value, replacing any existing value
    Put {
        key: String,
        /// JSON value, or a bare string if it doesn't parse as JSON
        value: String,
    },
}

pub async fn run(args: KvArgs, format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    let request = match args.command {
        KvCommand::Get { key } => Request::KvGet { key },
        KvCommand::Put { key, value } => {
            let value = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value));
            Request::KvPut { key, value }
        }
    };
    let response = client.call(request).await?;
    super::job::print_response(response, format)
}
