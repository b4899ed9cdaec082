
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::Document;
use super::front_matter::parse_front_matter;
use super::metadata::{TOOL_K6, TOOL_K6_STUDIO, extract_metadata, should_include_directory};
use crate::{DocsError, Result};

/// Restrictions applied while walking the documentation tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Keep only `k6/<version>` pages plus the k6-studio tree
    pub only_version: Option<String>,
}

/// Outcome of walking a documentation root
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub documents: Vec<Document>,
    /// Markdown files seen in included directories
    pub total_files: usize,
    /// Markdown files dropped because their body was empty
    pub skipped_empty: usize,
}

/// Walk `root` and load every markdown page worth indexing
#[inline]
pub fn scan_documents(root: &Path, options: &ScanOptions) -> Result<ScanReport> {
    if !root.is_dir() {
        return Err(DocsError::DocsRootMissing(root.to_path_buf()));
    }

    info!("Scanning documentation at {}", root.display());

    // The inclusion rules only look at the first two segments, so anything
    // deeper inherits the verdict of its ancestor.
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !entry.file_type().is_dir()
                || entry.depth() > 2
                || should_include_directory(entry.path(), root)
        });

    let mut report = ScanReport::default();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || entry.path().extension().is_none_or(|ext| ext != "md")
        {
            continue;
        }

        let path_metadata = extract_metadata(entry.path(), root);
        if let Some(version) = &options.only_version {
            let in_scope = path_metadata.tool == TOOL_K6_STUDIO
                || (path_metadata.tool == TOOL_K6 && &path_metadata.version == version);
            if !in_scope {
                continue;
            }
        }

        report.total_files += 1;

        let front_matter = parse_front_matter(entry.path());
        if front_matter.content.trim().is_empty() {
            debug!("Skipping {} with empty content", path_metadata.file_path);
            report.skipped_empty += 1;
            continue;
        }

        report.documents.push(Document::new(
            path_metadata,
            front_matter,
            entry.path().display().to_string(),
        ));
    }

    info!(
        "Found {} markdown files, processed {} with content",
        report.total_files,
        report.documents.len()
    );

    Ok(report)
}
