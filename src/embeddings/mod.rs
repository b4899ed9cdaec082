// Embeddings module
// Chunking plus the two ways of turning text into all-MiniLM-L6-v2 vectors

pub mod chunking;
pub mod local;
pub mod remote;

pub use chunking::{Chunk, ChunkingConfig, split_documents, split_text};
pub use local::LocalEmbedder;
pub use remote::EmbedServiceClient;

use tracing::info;

use crate::config::Config;
use crate::{DocsError, Result};

/// Model used at ingestion and query time. Vectors from different models are
/// not comparable, so every code path goes through this constant.
pub const EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Output size of [`EMBEDDING_MODEL`]
pub const EMBEDDING_DIMENSION: usize = 384;

/// Something that maps text to embedding vectors
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input text, in input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| DocsError::Embedding("model returned no embedding".to_string()))
    }
}

/// Build the embedder selected by the configuration: the `/embed` service
/// when a URL is configured, the in-process model otherwise.
#[inline]
pub fn embedder_from_config(config: &Config) -> Result<Box<dyn Embedder>> {
    if let Some(url) = &config.embedding.service_url {
        info!("Using embedding service at {}", url);
        return Ok(Box::new(EmbedServiceClient::new(url)));
    }

    info!("Loading embedding model {}", EMBEDDING_MODEL);
    let embedder = LocalEmbedder::new(config.model_cache_dir(), config.embedding.batch_size)?;
    Ok(Box::new(embedder))
}
