// Ingestion module
// Scans the documentation tree, chunks and embeds it, then loads the vectors into the store

#[cfg(test)]
mod tests;

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::docs::{ScanOptions, scan_documents};
use crate::embeddings::{Chunk, ChunkingConfig, Embedder, split_documents};
use crate::store::{
    ChunkRecord, CollectionInfo, DEFAULT_COLLECTION, EMBEDDING_MODEL_KEY, Metadata, VectorStore,
};
use crate::{DocsError, Result};

const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Summary of a finished ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Markdown files seen in included directories
    pub files_found: usize,
    pub documents: usize,
    pub skipped_empty: usize,
    pub chunks: usize,
    pub by_tool: BTreeMap<String, usize>,
    pub by_version: BTreeMap<String, usize>,
}

/// Batch pipeline from a docs root to a populated collection
pub struct Ingestor<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
    collection: String,
    chunking: ChunkingConfig,
    batch_size: usize,
    recreate: bool,
    scan: ScanOptions,
    show_progress: bool,
}

impl<'a> Ingestor<'a> {
    #[inline]
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self {
            embedder,
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            chunking: ChunkingConfig::default(),
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            recreate: true,
            scan: ScanOptions::default(),
            show_progress: console::user_attended_stderr(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Drop the existing collection before loading, so stale chunks disappear
    #[inline]
    #[must_use]
    pub fn with_recreate(mut self, recreate: bool) -> Self {
        self.recreate = recreate;
        self
    }

    /// Restrict k6 pages to one version directory; k6-studio is always kept
    #[inline]
    #[must_use]
    pub fn with_only_version(mut self, version: Option<String>) -> Self {
        self.scan.only_version = version;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run the whole pipeline against the documentation rooted at `root`
    #[inline]
    pub fn run(&self, root: &Path) -> Result<IngestStats> {
        let report = scan_documents(root, &self.scan)?;

        if report.documents.is_empty() {
            error!("No documents with content under {}", root.display());
            return Err(DocsError::NoDocuments(root.to_path_buf()));
        }

        info!("Chunking {} documents", report.documents.len());
        let chunks = split_documents(&report.documents, &self.chunking)?;
        if chunks.is_empty() {
            error!("Chunking {} produced nothing to index", root.display());
            return Err(DocsError::NoDocuments(root.to_path_buf()));
        }

        let stats = IngestStats {
            files_found: report.total_files,
            documents: report.documents.len(),
            skipped_empty: report.skipped_empty,
            chunks: chunks.len(),
            by_tool: count_by(&chunks, |chunk| &chunk.metadata.tool),
            by_version: count_by(&chunks, |chunk| &chunk.metadata.version),
        };

        info!("Created {} chunks", stats.chunks);
        for (tool, count) in &stats.by_tool {
            info!("  tool {}: {} chunks", tool, count);
        }
        for (version, count) in &stats.by_version {
            info!("  version {}: {} chunks", version, count);
        }

        let records = self.embed_chunks(chunks)?;

        let collection = self.prepare_collection()?;
        info!(
            "Storing {} chunks in collection {}",
            records.len(),
            collection.name
        );
        self.store.upsert(&collection, &records)?;

        info!("Ingestion into {} complete", collection.name);
        Ok(stats)
    }

    fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<ChunkRecord>> {
        let bar = if self.show_progress {
            ProgressBar::new(chunks.len() as u64).with_style(
                ProgressStyle::with_template(
                    "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} Embedding chunks",
                )
                .expect("style template is valid"),
            )
        } else {
            ProgressBar::hidden()
        };

        let mut records = Vec::with_capacity(chunks.len());

        for batch in &chunks.into_iter().chunks(self.batch_size) {
            let batch: Vec<Chunk> = batch.collect();
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();

            let embeddings = self.embedder.embed_batch(&texts)?;
            if embeddings.len() != batch.len() {
                return Err(DocsError::Embedding(format!(
                    "requested {} embeddings, received {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            debug!("Embedded batch of {} chunks", batch.len());
            bar.inc(batch.len() as u64);

            records.extend(
                batch
                    .into_iter()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| ChunkRecord {
                        id: chunk.id,
                        embedding,
                        document: chunk.text,
                        metadata: chunk.metadata,
                    }),
            );
        }

        bar.finish_and_clear();
        Ok(records)
    }

    fn prepare_collection(&self) -> Result<CollectionInfo> {
        let model = self.embedder.model_name();

        if let Some(existing) = self.store.find_collection(&self.collection)? {
            if self.recreate {
                info!("Deleting existing collection {}", self.collection);
                self.store.delete_collection(&self.collection)?;
            } else if existing.embedding_model().is_some_and(|recorded| recorded != model) {
                warn!(
                    "Collection {} was built with {:?}, adding vectors from {}",
                    self.collection,
                    existing.embedding_model(),
                    model
                );
            }
        }

        let metadata = Metadata::from([(
            EMBEDDING_MODEL_KEY.to_string(),
            Value::String(model.to_string()),
        )]);
        self.store.ensure_collection(&self.collection, &metadata)
    }
}

fn count_by<F>(chunks: &[Chunk], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&Chunk) -> &String,
{
    chunks.iter().map(key).cloned().counts().into_iter().collect()
}
