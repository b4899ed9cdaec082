// Documentation module
// Turns a checkout of the k6 documentation into metadata-rich documents

pub mod front_matter;
pub mod metadata;
pub mod scanner;
pub mod source;

use serde::{Deserialize, Serialize};

pub use front_matter::{FrontMatter, parse_front_matter, parse_front_matter_str};
pub use metadata::{PathMetadata, extract_metadata, is_version_segment, should_include_directory};
pub use scanner::{ScanOptions, ScanReport, scan_documents};
pub use source::{DocsSource, find_latest_version};

/// A markdown file that survived filtering, ready to be chunked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Labels derived from the file's location under the docs root
    pub path: PathMetadata,
    pub title: String,
    pub description: String,
    pub weight: String,
    /// Body text with the front matter removed
    pub content: String,
    /// Absolute location of the file on disk
    pub source: String,
}

impl Document {
    #[inline]
    pub fn new(path: PathMetadata, front_matter: FrontMatter, source: String) -> Self {
        Self {
            path,
            title: front_matter.title,
            description: front_matter.description,
            weight: front_matter.weight,
            content: front_matter.content,
            source,
        }
    }

    /// Metadata copied onto every chunk split from this document
    #[inline]
    pub fn chunk_metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            file_path: self.path.file_path.clone(),
            tool: self.path.tool.clone(),
            version: self.path.version.clone(),
            category: self.path.category.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            weight: self.weight.clone(),
            source: self.source.clone(),
        }
    }
}

/// Metadata stored next to each chunk in the vector database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub tool: String,
    pub version: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub weight: String,
    pub source: String,
}
