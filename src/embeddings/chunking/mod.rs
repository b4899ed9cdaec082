
use serde::{Deserialize, Serialize};
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::debug;
use uuid::Uuid;

use crate::docs::{ChunkMetadata, Document};
use crate::{DocsError, Result};

/// Character-based splitting parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub max_chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 200,
        }
    }
}

/// A span of a document ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    /// Position of this chunk within its parent document
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

fn build_splitter(config: &ChunkingConfig) -> Result<TextSplitter<Characters>> {
    let chunk_config = ChunkConfig::new(config.max_chunk_size)
        .with_overlap(config.overlap_size)
        .map_err(|e| DocsError::Chunking(e.to_string()))?;
    Ok(TextSplitter::new(chunk_config))
}

/// Split text into ordered, overlapping spans of at most `max_chunk_size` characters
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    let splitter = build_splitter(config)?;
    Ok(spans(&splitter, text))
}

fn spans(splitter: &TextSplitter<Characters>, text: &str) -> Vec<String> {
    splitter
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Split every document, copying the parent's metadata onto each chunk
#[inline]
pub fn split_documents(documents: &[Document], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let splitter = build_splitter(config)?;
    let mut chunks = Vec::new();

    for document in documents {
        let metadata = document.chunk_metadata();
        let before = chunks.len();

        chunks.extend(
            spans(&splitter, &document.content)
                .into_iter()
                .enumerate()
                .map(|(chunk_index, text)| Chunk {
                    id: Uuid::new_v4().to_string(),
                    text,
                    chunk_index,
                    metadata: metadata.clone(),
                }),
        );

        debug!(
            "Split {} into {} chunks",
            document.path.file_path,
            chunks.len() - before
        );
    }

    Ok(chunks)
}
