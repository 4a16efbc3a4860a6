// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The crawler worker: fetches a URL (or every URL in `start_urls`) and
//! hands each page back as a document for the Job Processor to persist.

use crate::worker::{Worker, WorkerError};
use async_trait::async_trait;
use quaero_core::{QueueJob, WorkerKind};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CrawlConfig {
    url: Option<String>,
    #[serde(default)]
    start_urls: Vec<String>,
}

impl CrawlConfig {
    fn urls(&self) -> Vec<String> {
        if !self.start_urls.is_empty() {
            return self.start_urls.clone();
        }
        self.url.iter().cloned().collect()
    }
}

/// The one real external dependency a crawler worker needs. Production
/// wiring supplies an HTTP-backed implementation; tests supply a fake.
#[async_trait]
pub trait CrawlFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<String, WorkerError>;
}

pub struct CrawlerWorker<F: CrawlFetcher> {
    fetcher: F,
}

impl<F: CrawlFetcher> CrawlerWorker<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: CrawlFetcher> Worker for CrawlerWorker<F> {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Crawler
    }

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError> {
        let config: CrawlConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        if config.urls().is_empty() {
            return Err(WorkerError::InvalidConfig(
                "config must set url or start_urls".to_string(),
            ));
        }
        Ok(())
    }

    async fn execute(&self, job: &QueueJob) -> Result<serde_json::Value, WorkerError> {
        let config: CrawlConfig = serde_json::from_value(job.config.clone())
            .map_err(|e| WorkerError::InvalidConfig(e.to_string()))?;
        let urls = config.urls();
        if urls.is_empty() {
            return Err(WorkerError::InvalidConfig(
                "config must set url or start_urls".to_string(),
            ));
        }

        let mut documents = Vec::with_capacity(urls.len());
        for url in &urls {
            let body = self.fetcher.fetch(url).await?;
            documents.push(serde_json::json!({
                "source_url": url,
                "title": url,
                "body": body,
                "metadata": {},
            }));
        }
        Ok(serde_json::json!({ "documents": documents }))
    }
}

#[cfg(test)]
#[path = "crawler_tests.rs"]
mod tests;
