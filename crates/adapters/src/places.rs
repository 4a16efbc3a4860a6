// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The places worker: looks up a location query against a places API and
//! saves the result as a document with structured place records as
//! metadata plus a markdown body.

use crate::worker::{Worker, WorkerError};
use async_trait::async_trait;
use quaero_core::{QueueJob, WorkerKind};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PlacesConfig {
    query: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    radius: Option<u32>,
    #[serde(default)]
    api_key_ref: Option<String>,
}

/// One place record returned by a places search.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Place {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// The one real external dependency a places worker needs. Production
/// wiring supplies an HTTP-backed places API client; tests supply a fake.
#[async_trait]
pub trait PlacesClient: Send + Sync + 'static {
    async fn search(
        &self,
        query: &str,
        location: &str,
        radius: Option<u32>,
    ) -> Result<Vec<Place>, WorkerError>;
}

pub struct PlacesWorker<C: PlacesClient> {
    client: C,
}

impl<C: PlacesClient> PlacesWorker<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: PlacesClient> Worker for PlacesWorker<C> {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Places
    }

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        serde_json::from_value::<PlacesConfig>(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    async fn execute(&self, job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        let config: PlacesConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        let places = self
            .client
            .search(&config.query, &config.location, config.radius)
            .await?;

        let body = places
            .iter()
            .map(|p| format!("- **{}** — {}", p.name, p.address))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(serde_json::json!({
            "documents": [{
                "source_url": format!("places:{}", config.query),
                "title": config.query,
                "body": body,
                "metadata": { "places": places, "api_key_ref": config.api_key_ref },
            }]
        }))
    }
}

#[cfg(test)]
#[path = "places_tests.rs"]
mod tests;
