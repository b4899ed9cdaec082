
use anyhow::{Context, Result as AnyResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{ChunkRecord, CollectionInfo, Metadata, QueryMatch, StoredRecord, VectorStore};
use crate::config::ChromaConfig;
use crate::docs::ChunkMetadata;
use crate::http::{DEFAULT_TIMEOUT_SECONDS, RetryPolicy, build_agent};
use crate::{DocsError, Result};

/// Client for Chroma's v2 REST API
#[derive(Debug, Clone)]
pub struct ChromaStore {
    base_url: Url,
    tenant: String,
    database: String,
    upsert_batch_size: usize,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
    get_or_create: bool,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a ChunkMetadata>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: [&'a [f32]; 1],
    n_results: usize,
    include: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Serialize)]
struct GetRequest {
    limit: usize,
    include: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Metadata>>>,
}

impl ChromaStore {
    #[inline]
    pub fn new(config: &ChromaConfig) -> Result<Self> {
        let base_url = config
            .chroma_url()
            .map_err(|e| DocsError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            upsert_batch_size: config.upsert_batch_size.max(1),
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry: RetryPolicy::default(),
        })
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

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check the server is reachable
    #[inline]
    pub fn heartbeat(&self) -> Result<()> {
        let url = self.url("/api/v2/heartbeat")?;
        self.get_text(&url)
            .context("Failed to reach Chroma")
            .map_err(store_error)?;
        debug!("Chroma heartbeat OK at {}", self.base_url);
        Ok(())
    }

    fn collections_path(&self) -> String {
        format!(
            "/api/v2/tenants/{}/databases/{}/collections",
            self.tenant, self.database
        )
    }

    fn collection_url(&self, collection_id: &str, action: &str) -> Result<Url> {
        self.url(&format!(
            "{}/{}/{}",
            self.collections_path(),
            collection_id,
            action
        ))
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DocsError::Config(format!("Failed to build Chroma URL {path}: {e}")))
    }

    fn get_text(&self, url: &Url) -> AnyResult<String> {
        self.retry.execute(url, || {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &Url, body: &B) -> AnyResult<T> {
        self.send_json(&self.retry, url, body)
    }

    // Writes are not resubmitted after a server error
    fn write_json<B: Serialize, T: DeserializeOwned>(&self, url: &Url, body: &B) -> AnyResult<T> {
        self.send_json(&self.retry.transport_only(), url, body)
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        retry: &RetryPolicy,
        url: &Url,
        body: &B,
    ) -> AnyResult<T> {
        let request_json = serde_json::to_string(body).context("Failed to serialize request")?;

        let response_text = retry.execute(url, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        serde_json::from_str(&response_text).context("Failed to parse Chroma response")
    }
}

fn store_error(error: anyhow::Error) -> DocsError {
    DocsError::VectorStore(format!("{error:#}"))
}

impl VectorStore for ChromaStore {
    fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let url = self.url(&self.collections_path())?;
        let response_text = self
            .get_text(&url)
            .context("Failed to list collections")
            .map_err(store_error)?;

        serde_json::from_str(&response_text)
            .context("Failed to parse collection list")
            .map_err(store_error)
    }

    fn ensure_collection(&self, name: &str, metadata: &Metadata) -> Result<CollectionInfo> {
        let url = self.url(&self.collections_path())?;
        let request = CreateCollectionRequest {
            name,
            metadata: (!metadata.is_empty()).then_some(metadata),
            get_or_create: true,
        };

        let collection: CollectionInfo = self
            .post_json(&url, &request)
            .with_context(|| format!("Failed to get or create collection '{name}'"))
            .map_err(store_error)?;

        debug!("Using collection {} ({})", collection.name, collection.id);
        Ok(collection)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let url = self.url(&format!("{}/{}", self.collections_path(), name))?;

        self.retry
            .transport_only()
            .execute(&url, || {
                self.agent
                    .delete(url.as_str())
                    .call()
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .with_context(|| format!("Failed to delete collection '{name}'"))
            .map_err(store_error)?;

        info!("Deleted collection {}", name);
        Ok(())
    }

    fn upsert(&self, collection: &CollectionInfo, records: &[ChunkRecord]) -> Result<()> {
        let url = self.collection_url(&collection.id, "upsert")?;

        for batch in records.chunks(self.upsert_batch_size) {
            let request = UpsertRequest {
                ids: batch.iter().map(|r| r.id.as_str()).collect(),
                embeddings: batch.iter().map(|r| r.embedding.as_slice()).collect(),
                documents: batch.iter().map(|r| r.document.as_str()).collect(),
                metadatas: batch.iter().map(|r| &r.metadata).collect(),
            };

            let _: serde_json::Value = self
                .write_json(&url, &request)
                .with_context(|| {
                    format!(
                        "Failed to upsert {} records into '{}'",
                        batch.len(),
                        collection.name
                    )
                })
                .map_err(store_error)?;

            debug!("Upserted {} records into {}", batch.len(), collection.name);
        }

        Ok(())
    }

    fn query(
        &self,
        collection: &CollectionInfo,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let url = self.collection_url(&collection.id, "query")?;
        let request = QueryRequest {
            query_embeddings: [embedding],
            n_results: k,
            include: ["documents", "metadatas", "distances"],
        };

        let response: QueryResponse = self
            .post_json(&url, &request)
            .with_context(|| format!("Failed to query collection '{}'", collection.name))
            .map_err(store_error)?;

        // One query embedding was sent, so only the first group matters
        let ids = response.ids.into_iter().next().unwrap_or_default();
        let mut documents = first_group(response.documents).into_iter();
        let mut metadatas = first_group(response.metadatas).into_iter();
        let mut distances = first_group(response.distances).into_iter();

        let matches = ids
            .into_iter()
            .map(|id| QueryMatch {
                record: StoredRecord {
                    id,
                    document: documents.next().flatten().unwrap_or_default(),
                    metadata: metadatas.next().flatten().unwrap_or_default(),
                },
                distance: distances.next().flatten().unwrap_or(f32::NAN),
            })
            .collect();

        Ok(matches)
    }

    fn count(&self, collection: &CollectionInfo) -> Result<usize> {
        let url = self.collection_url(&collection.id, "count")?;
        let response_text = self
            .get_text(&url)
            .with_context(|| format!("Failed to count collection '{}'", collection.name))
            .map_err(store_error)?;

        serde_json::from_str(response_text.trim())
            .context("Failed to parse collection count")
            .map_err(store_error)
    }

    fn peek(&self, collection: &CollectionInfo, limit: usize) -> Result<Vec<StoredRecord>> {
        let url = self.collection_url(&collection.id, "get")?;
        let request = GetRequest {
            limit,
            include: ["documents", "metadatas"],
        };

        let response: GetResponse = self
            .post_json(&url, &request)
            .with_context(|| format!("Failed to read collection '{}'", collection.name))
            .map_err(store_error)?;

        let mut documents = response.documents.unwrap_or_default().into_iter();
        let mut metadatas = response.metadatas.unwrap_or_default().into_iter();

        Ok(response
            .ids
            .into_iter()
            .map(|id| StoredRecord {
                id,
                document: documents.next().flatten().unwrap_or_default(),
                metadata: metadatas.next().flatten().unwrap_or_default(),
            })
            .collect())
    }
}

fn first_group<T>(groups: Option<Vec<Vec<T>>>) -> Vec<T> {
    groups
        .and_then(|groups| groups.into_iter().next())
        .unwrap_or_default()
}
