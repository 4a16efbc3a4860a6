// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production implementations of the four worker collaborator traits,
//! wired up by `quaero-daemon`. Test code uses fakes instead; these are the
//! only adapter types that ever touch the network or the storage layer
//! directly.

use crate::agent::LlmClient;
use crate::crawler::CrawlFetcher;
use crate::maintenance::MaintenanceClient;
use crate::places::{Place, PlacesClient};
use crate::worker::WorkerError;
use async_trait::async_trait;
use quaero_storage::Storage;
use serde::Deserialize;

/// Fetches a URL's body over HTTP(S).
pub struct HttpCrawlFetcher {
    client: reqwest::Client,
}

impl HttpCrawlFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpCrawlFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl CrawlFetcher for HttpCrawlFetcher {
    async fn fetch(&self, url: &str) -> Result<String, WorkerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|err| WorkerError::Dependency(err.to_string()))?;
        response
            .text()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))
    }
}

/// Posts a prompt to an HTTP LLM completion endpoint and expects back
/// `{"reply": "..."}`.
pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpLlmClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct LlmResponse {
    reply: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, WorkerError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "prompt": prompt }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))?
            .error_for_status()
            .map_err(|err| WorkerError::Dependency(err.to_string()))?;
        let body: LlmResponse = response
            .json()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))?;
        Ok(body.reply)
    }
}

/// Queries an HTTP places-search endpoint and expects back a JSON array of
/// place records shaped like [`Place`]. The API key, if any, is configured
/// once at construction rather than threaded through each search call.
pub struct HttpPlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPlacesClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PlacesClient for HttpPlacesClient {
    async fn search(
        &self,
        query: &str,
        location: &str,
        radius: Option<u32>,
    ) -> Result<Vec<Place>, WorkerError> {
        let mut request = self.client.get(&self.base_url).query(&[
            ("query", query),
            ("location", location),
        ]);
        if let Some(radius) = radius {
            request = request.query(&[("radius", radius)]);
        }
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))?
            .error_for_status()
            .map_err(|err| WorkerError::Dependency(err.to_string()))?;
        response
            .json::<Vec<Place>>()
            .await
            .map_err(|err| WorkerError::Dependency(err.to_string()))
    }
}

/// Runs maintenance operations against `quaero-storage` directly. `vacuum`
/// forces a WAL flush; there are no secondary indexes to `analyze` or
/// `reindex` yet, so those are logged no-ops.
pub struct StorageMaintenanceClient {
    storage: Storage,
}

impl StorageMaintenanceClient {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl MaintenanceClient for StorageMaintenanceClient {
    async fn run(&self, operation: &str) -> Result<(), WorkerError> {
        match operation {
            "vacuum" => self
                .storage
                .flush()
                .map_err(|err| WorkerError::Dependency(err.to_string())),
            "analyze" | "reindex" => {
                tracing::info!(operation, "no-op maintenance operation");
                Ok(())
            }
            other => Err(WorkerError::InvalidConfig(format!(
                "unknown maintenance operation: {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "production_tests.rs"]
mod tests;
