// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: defaults, overridable by a TOML file under the
//! data directory, overridable in turn by environment variables.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_VISIBILITY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RECEIVE: u32 = 3;
const DEFAULT_REAGGREGATION_INTERVAL_MS: u64 = 30_000;
const DEFAULT_QUEUE_NAME: &str = "jobs";
const DEFAULT_WEBSOCKET_ADDR: &str = "127.0.0.1:4787";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set QUAERO_STATE_DIR or HOME")]
    NoStateDir,

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon configuration. Every path is derived from `data_dir` unless
/// overridden explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub definitions_dir: PathBuf,
    pub queue_name: String,
    pub visibility_timeout_ms: u64,
    pub max_receive: u32,
    pub pool_size: usize,
    pub reaggregation_interval_ms: u64,
    /// Address the external-subscriber WebSocket bridge listens on.
    pub websocket_addr: String,
    /// HTTP endpoint the production agent worker posts prompts to.
    pub llm_endpoint: String,
    pub llm_api_key: Option<String>,
    /// HTTP endpoint the production places worker queries.
    pub places_base_url: String,
    pub places_api_key: Option<String>,
}

/// Partial overrides read from `<data_dir>/config.toml`. Every field is
/// optional; only present keys override the computed defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    visibility_timeout_ms: Option<u64>,
    max_receive: Option<u32>,
    pool_size: Option<usize>,
    reaggregation_interval_ms: Option<u64>,
    queue_name: Option<String>,
    websocket_addr: Option<String>,
    llm_endpoint: Option<String>,
    places_base_url: Option<String>,
}

impl Config {
    /// Resolve the data directory: `QUAERO_STATE_DIR` > `XDG_STATE_HOME/quaero` >
    /// `~/.local/state/quaero`.
    pub fn resolve_data_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(dir) = std::env::var("QUAERO_STATE_DIR") {
            return Ok(PathBuf::from(dir));
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return Ok(PathBuf::from(xdg).join("quaero"));
        }
        let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
        Ok(PathBuf::from(home).join(".local/state/quaero"))
    }

    /// Load configuration rooted at `data_dir`: start from defaults,
    /// overlay `<data_dir>/config.toml` if present, overlay environment
    /// variables last.
    pub fn load(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut config = Self::defaults(data_dir);

        let file_path = config.data_dir.join("config.toml");
        if let Ok(content) = std::fs::read_to_string(&file_path) {
            let overrides: ConfigFile =
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: file_path.clone(),
                    source,
                })?;
            config.apply_file(overrides);
        }

        config.apply_env();
        Ok(config)
    }

    fn defaults(data_dir: PathBuf) -> Self {
        Self {
            wal_path: data_dir.join("wal").join("events.wal"),
            snapshot_path: data_dir.join("snapshot.json"),
            socket_path: data_dir.join("daemon.sock"),
            lock_path: data_dir.join("daemon.pid"),
            log_path: data_dir.join("daemon.log"),
            definitions_dir: data_dir.join("definitions"),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            visibility_timeout_ms: DEFAULT_VISIBILITY_TIMEOUT_MS,
            max_receive: DEFAULT_MAX_RECEIVE,
            pool_size: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            reaggregation_interval_ms: DEFAULT_REAGGREGATION_INTERVAL_MS,
            websocket_addr: DEFAULT_WEBSOCKET_ADDR.to_string(),
            llm_endpoint: String::new(),
            llm_api_key: None,
            places_base_url: String::new(),
            places_api_key: None,
            data_dir,
        }
    }

    fn apply_file(&mut self, overrides: ConfigFile) {
        if let Some(v) = overrides.visibility_timeout_ms {
            self.visibility_timeout_ms = v;
        }
        if let Some(v) = overrides.max_receive {
            self.max_receive = v;
        }
        if let Some(v) = overrides.pool_size {
            self.pool_size = v;
        }
        if let Some(v) = overrides.reaggregation_interval_ms {
            self.reaggregation_interval_ms = v;
        }
        if let Some(v) = overrides.queue_name {
            self.queue_name = v;
        }
        if let Some(v) = overrides.websocket_addr {
            self.websocket_addr = v;
        }
        if let Some(v) = overrides.llm_endpoint {
            self.llm_endpoint = v;
        }
        if let Some(v) = overrides.places_base_url {
            self.places_base_url = v;
        }
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_u64("QUAERO_VISIBILITY_TIMEOUT_MS") {
            self.visibility_timeout_ms = v;
        }
        if let Some(v) = env_u32("QUAERO_MAX_RECEIVE") {
            self.max_receive = v;
        }
        if let Some(v) = env_usize("QUAERO_POOL_SIZE") {
            self.pool_size = v;
        }
        if let Some(v) = env_u64("QUAERO_REAGGREGATION_INTERVAL_MS") {
            self.reaggregation_interval_ms = v;
        }
        if let Ok(v) = std::env::var("QUAERO_QUEUE_NAME") {
            self.queue_name = v;
        }
        if let Ok(v) = std::env::var("QUAERO_WEBSOCKET_ADDR") {
            self.websocket_addr = v;
        }
        if let Ok(v) = std::env::var("QUAERO_LLM_ENDPOINT") {
            self.llm_endpoint = v;
        }
        if let Ok(v) = std::env::var("QUAERO_LLM_API_KEY") {
            self.llm_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("QUAERO_PLACES_BASE_URL") {
            self.places_base_url = v;
        }
        if let Ok(v) = std::env::var("QUAERO_PLACES_API_KEY") {
            self.places_api_key = Some(v);
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
