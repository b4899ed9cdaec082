// In-memory stand-ins for the embedding model and the vector database

use std::sync::Mutex;

use crate::embeddings::Embedder;
use crate::store::{
    ChunkRecord, CollectionInfo, Metadata, QueryMatch, StoredRecord, VectorStore,
};
use crate::{DocsError, Result};

/// Letter-frequency vectors: identical texts map to identical vectors
pub(crate) struct LetterEmbedder {
    pub model: &'static str,
    pub fail: bool,
}

impl Default for LetterEmbedder {
    fn default() -> Self {
        Self {
            model: crate::embeddings::EMBEDDING_MODEL,
            fail: false,
        }
    }
}

pub(crate) fn letter_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; 26];
    for byte in text.to_ascii_lowercase().bytes() {
        if byte.is_ascii_lowercase() {
            vector[usize::from(byte - b'a')] += 1.0;
        }
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

impl Embedder for LetterEmbedder {
    fn model_name(&self) -> &str {
        self.model
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.fail {
            return Err(DocsError::Embedding("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|text| letter_vector(text)).collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub collections: Mutex<Vec<(CollectionInfo, Vec<ChunkRecord>)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn records(&self, name: &str) -> Vec<ChunkRecord> {
        self.collections
            .lock()
            .expect("store lock")
            .iter()
            .find(|(info, _)| info.name == name)
            .map(|(_, records)| records.clone())
            .unwrap_or_default()
    }

    pub fn insert(&self, info: CollectionInfo, records: Vec<ChunkRecord>) {
        self.collections
            .lock()
            .expect("store lock")
            .push((info, records));
    }
}

fn stored(record: &ChunkRecord) -> StoredRecord {
    let metadata: Metadata = serde_json::to_value(&record.metadata)
        .ok()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();
    StoredRecord {
        id: record.id.clone(),
        document: record.document.clone(),
        metadata,
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorStore for MemoryStore {
    fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        Ok(self
            .collections
            .lock()
            .expect("store lock")
            .iter()
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn ensure_collection(&self, name: &str, metadata: &Metadata) -> Result<CollectionInfo> {
        if let Some(existing) = self.find_collection(name)? {
            return Ok(existing);
        }
        let info = CollectionInfo {
            id: format!("id-{name}"),
            name: name.to_string(),
            metadata: Some(metadata.clone()),
        };
        self.insert(info.clone(), Vec::new());
        Ok(info)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections
            .lock()
            .expect("store lock")
            .retain(|(info, _)| info.name != name);
        self.deleted
            .lock()
            .expect("store lock")
            .push(name.to_string());
        Ok(())
    }

    fn upsert(&self, collection: &CollectionInfo, records: &[ChunkRecord]) -> Result<()> {
        let mut collections = self.collections.lock().expect("store lock");
        let (_, stored) = collections
            .iter_mut()
            .find(|(info, _)| info.id == collection.id)
            .ok_or_else(|| DocsError::VectorStore(format!("no collection {}", collection.id)))?;
        for record in records {
            stored.retain(|existing| existing.id != record.id);
            stored.push(record.clone());
        }
        Ok(())
    }

    fn query(
        &self,
        collection: &CollectionInfo,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let mut matches: Vec<QueryMatch> = self
            .records(&collection.name)
            .iter()
            .map(|record| QueryMatch {
                record: stored(record),
                distance: squared_distance(&record.embedding, embedding),
            })
            .collect();
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(k);
        Ok(matches)
    }

    fn count(&self, collection: &CollectionInfo) -> Result<usize> {
        Ok(self.records(&collection.name).len())
    }

    fn peek(&self, collection: &CollectionInfo, limit: usize) -> Result<Vec<StoredRecord>> {
        Ok(self
            .records(&collection.name)
            .iter()
            .take(limit)
            .map(stored)
            .collect())
    }
}
