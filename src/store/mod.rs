// Vector store module
// Storage seam for chunk embeddings, backed by a Chroma server

pub mod chroma;

pub use chroma::ChromaStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Result;
use crate::docs::ChunkMetadata;

/// Default collection holding the k6 documentation
pub const DEFAULT_COLLECTION: &str = "k6_docs";

/// Collection metadata key recording which model produced its vectors
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";

pub type Metadata = BTreeMap<String, Value>;

/// A chunk and its vector, as written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl CollectionInfo {
    /// Model recorded when the collection was created, if any
    #[inline]
    pub fn embedding_model(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(EMBEDDING_MODEL_KEY))
            .and_then(Value::as_str)
    }
}

/// A stored chunk read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

/// A similarity search hit, lower distance is closer
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub record: StoredRecord,
    pub distance: f32,
}

impl StoredRecord {
    /// Value of a string metadata field
    #[inline]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Operations the ingestion and verification flows need from a vector database
pub trait VectorStore {
    fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Fetch the named collection, creating it with `metadata` when missing
    fn ensure_collection(&self, name: &str, metadata: &Metadata) -> Result<CollectionInfo>;

    fn delete_collection(&self, name: &str) -> Result<()>;

    fn upsert(&self, collection: &CollectionInfo, records: &[ChunkRecord]) -> Result<()>;

    /// The `k` records closest to `embedding`, closest first
    fn query(
        &self,
        collection: &CollectionInfo,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryMatch>>;

    fn count(&self, collection: &CollectionInfo) -> Result<usize>;

    /// Up to `limit` records in storage order
    fn peek(&self, collection: &CollectionInfo, limit: usize) -> Result<Vec<StoredRecord>>;

    #[inline]
    fn find_collection(&self, name: &str) -> Result<Option<CollectionInfo>> {
        Ok(self
            .list_collections()?
            .into_iter()
            .find(|collection| collection.name == name))
    }
}
