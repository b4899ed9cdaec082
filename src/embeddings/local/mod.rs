use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use super::{EMBEDDING_DIMENSION, EMBEDDING_MODEL, Embedder};
use crate::{DocsError, Result};

/// all-MiniLM-L6-v2 running in-process through ONNX Runtime
pub struct LocalEmbedder {
    // TextEmbedding::embed needs exclusive access
    model: Mutex<TextEmbedding>,
    batch_size: usize,
}

impl LocalEmbedder {
    /// Load the model, downloading it into `cache_dir` on first use
    #[inline]
    pub fn new(cache_dir: PathBuf, batch_size: usize) -> Result<Self> {
        debug!("Initializing {} with cache at {}", EMBEDDING_MODEL, cache_dir.display());

        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(true),
        )
        .map_err(|e| DocsError::Embedding(format!("failed to load {EMBEDDING_MODEL}: {e}")))?;

        Ok(Self {
            model: Mutex::new(model),
            batch_size: batch_size.max(1),
        })
    }
}

impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| DocsError::Embedding("embedding model lock poisoned".to_string()))?;

        let embeddings = model
            .embed(texts.to_vec(), Some(self.batch_size))
            .map_err(|e| DocsError::Embedding(e.to_string()))?;

        if let Some(first) = embeddings.first() {
            if first.len() != EMBEDDING_DIMENSION {
                return Err(DocsError::Embedding(format!(
                    "expected {EMBEDDING_DIMENSION} dimensions, model produced {}",
                    first.len()
                )));
            }
        }

        Ok(embeddings)
    }
}
