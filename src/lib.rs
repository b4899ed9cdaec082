use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocsError>;

#[derive(Error, Debug)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Documentation sources not found at {}", .0.display())]
    DocsRootMissing(PathBuf),

    #[error("No markdown documents with content found under {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("Clone error: {0}")]
    Clone(String),

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod docs;
pub mod embeddings;
mod http;
pub mod ingest;
pub mod server;
pub mod store;
#[cfg(test)]
mod testing;
pub mod verify;
