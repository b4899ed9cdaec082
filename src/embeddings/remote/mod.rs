
use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{EMBEDDING_MODEL, Embedder};
use crate::http::{DEFAULT_TIMEOUT_SECONDS, RetryPolicy, build_agent};
use crate::{DocsError, Result};

/// Client for a running `/embed` service
#[derive(Debug, Clone)]
pub struct EmbedServiceClient {
    base_url: Url,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    model: String,
}

impl EmbedServiceClient {
    #[inline]
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.clone(),
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry: RetryPolicy::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.base_delay = delay;
        self
    }

    /// Check the service is up and serves the same model we embed queries with
    #[inline]
    pub fn health_check(&self) -> AnyResult<()> {
        let url = self
            .base_url
            .join("/health")
            .context("Failed to build health URL")?;

        debug!("Checking embedding service at {}", url);

        let response_text = self
            .retry
            .execute(&url, || {
                self.agent
                    .get(url.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to reach embedding service")?;

        let health: HealthResponse =
            serde_json::from_str(&response_text).context("Failed to parse health response")?;

        if health.model != EMBEDDING_MODEL {
            anyhow::bail!(
                "Embedding service runs model '{}' but '{}' is required",
                health.model,
                EMBEDDING_MODEL
            );
        }

        info!("Embedding service at {} is healthy", self.base_url);
        Ok(())
    }

    /// Embed a single text through `POST /embed`
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> AnyResult<Vec<f32>> {
        debug!("Requesting embedding for text (length: {})", text.len());

        let url = self
            .base_url
            .join("/embed")
            .context("Failed to build embedding URL")?;

        let request_json = serde_json::to_string(&EmbedRequest { text })
            .context("Failed to serialize embedding request")?;

        let response_text = self
            .retry
            .execute(&url, || {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate embedding")?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        debug!("Received embedding with {} dimensions", response.embedding.len());
        Ok(response.embedding)
    }
}

impl Embedder for EmbedServiceClient {
    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.generate_embedding(text)
                    .map_err(|e| DocsError::Embedding(format!("{e:#}")))
            })
            .collect()
    }
}
