use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::SearchResponse;
use tokio::sync::Mutex;

use crate::error::ManagerError;

/// Sends a serialized query to a servlet of the search engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, servlet: &str, query: &str) -> Result<SearchResponse>;
}

/// Placeholder used until a real transport is attached. Every request fails
/// with [`ManagerError::TransportNotConfigured`].
pub struct MissingTransport;

#[async_trait]
impl Transport for MissingTransport {
    async fn execute(&self, servlet: &str, _query: &str) -> Result<SearchResponse> {
        Err(ManagerError::TransportNotConfigured {
            servlet: servlet.to_string(),
        }
        .into())
    }
}

/// A request seen by a [`ReplayTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub servlet: String,
    pub query: String,
}

/// Answers every request with the same recorded payload.
#[derive(Clone)]
pub struct ReplayTransport {
    response: SearchResponse,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ReplayTransport {
    pub fn new(response: SearchResponse) -> Self {
        Self {
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let response = SearchResponse::from_json(raw).context("recorded response is not valid")?;
        Ok(Self::new(response))
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read recorded response '{}'", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in '{}'", path.display()))
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn execute(&self, servlet: &str, query: &str) -> Result<SearchResponse> {
        self.requests.lock().await.push(RecordedRequest {
            servlet: servlet.to_string(),
            query: query.to_string(),
        });
        Ok(self.response.clone())
    }
}
