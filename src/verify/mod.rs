// Verification module
// Inspects a loaded collection and runs similarity searches against it


use anyhow::Context;
use console::style;
use dialoguer::{Input, Select};
use tracing::{debug, warn};

use crate::config::Config;
use crate::embeddings::{Embedder, embedder_from_config};
use crate::store::{ChromaStore, CollectionInfo, StoredRecord, VectorStore};
use crate::{DocsError, Result};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_SAMPLE_DOCUMENTS: usize = 3;
const SAMPLE_IDS: usize = 5;
const SAMPLE_PREVIEW_CHARS: usize = 200;
const RESULT_PREVIEW_CHARS: usize = 300;
const UNKNOWN_SOURCE: &str = "Unknown";

/// What the store holds, and what the target collection looks like
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub collections: Vec<CollectionInfo>,
    pub target: String,
    pub details: Option<CollectionDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDetails {
    pub info: CollectionInfo,
    pub count: usize,
    pub sample_ids: Vec<String>,
    pub samples: Vec<StoredRecord>,
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub rank: usize,
    pub distance: f32,
    pub source: String,
    pub file_path: Option<String>,
    pub preview: String,
}

/// Gather statistics for collection `name`, with up to `samples` sample documents
#[inline]
pub fn collection_stats(
    store: &dyn VectorStore,
    name: &str,
    samples: usize,
) -> Result<CollectionReport> {
    let collections = store.list_collections()?;

    let Some(info) = collections.iter().find(|c| c.name == name).cloned() else {
        return Ok(CollectionReport {
            collections,
            target: name.to_string(),
            details: None,
        });
    };

    let count = store.count(&info)?;
    let peeked = store.peek(&info, SAMPLE_IDS.max(samples))?;
    debug!("Peeked {} records from {}", peeked.len(), name);

    let sample_ids = peeked.iter().take(SAMPLE_IDS).map(|r| r.id.clone()).collect();
    let samples = peeked.into_iter().take(samples).collect();

    Ok(CollectionReport {
        collections,
        target: name.to_string(),
        details: Some(CollectionDetails {
            info,
            count,
            sample_ids,
            samples,
        }),
    })
}

/// Embed `query` and return the `k` closest chunks of collection `name`
#[inline]
pub fn search(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    name: &str,
    query: &str,
    k: usize,
) -> Result<Vec<SearchHit>> {
    let collection = store
        .find_collection(name)?
        .ok_or_else(|| DocsError::VectorStore(format!("Collection '{name}' not found")))?;

    if let Some(model) = collection.embedding_model() {
        if model != embedder.model_name() {
            warn!(
                "Collection {} was built with {}, querying with {}",
                name,
                model,
                embedder.model_name()
            );
        }
    }

    let embedding = embedder.embed(query)?;
    let matches = store.query(&collection, &embedding, k)?;

    Ok(matches
        .into_iter()
        .enumerate()
        .map(|(index, hit)| SearchHit {
            rank: index + 1,
            distance: hit.distance,
            source: hit
                .record
                .metadata_str("source")
                .unwrap_or(UNKNOWN_SOURCE)
                .to_string(),
            file_path: hit.record.metadata_str("file_path").map(str::to_string),
            preview: preview(&hit.record.document, RESULT_PREVIEW_CHARS),
        })
        .collect())
}

/// First `max_chars` characters of `text`, with `...` appended when truncated
#[inline]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", text.get(..cut).unwrap_or(text)),
        None => text.to_string(),
    }
}

/// Whether a search prompt answer ends the search loop
#[inline]
pub fn is_exit_command(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "quit" | "exit" | "q"
    )
}

#[inline]
pub fn print_report(report: &CollectionReport) {
    eprintln!("Available collections: {}", report.collections.len());
    for collection in &report.collections {
        eprintln!("  - {}", collection.name);
    }

    if report.collections.is_empty() {
        eprintln!(
            "{}",
            style("No collections found! Make sure ingestion ran successfully.").yellow()
        );
        return;
    }

    let Some(details) = &report.details else {
        eprintln!(
            "{}",
            style(format!("{} collection not found!", report.target)).red()
        );
        return;
    };

    eprintln!();
    eprintln!("{}", style(format!("{} collection statistics:", report.target)).bold());
    eprintln!("  - Total documents: {}", style(details.count).cyan());
    eprintln!("  - Sample IDs: {:?}", details.sample_ids);
    match details.info.embedding_model() {
        Some(model) => eprintln!("  - Embedding model: {}", style(model).cyan()),
        None => eprintln!("  - Embedding model: {}", style("not recorded").dim()),
    }

    if details.samples.is_empty() {
        return;
    }

    eprintln!();
    eprintln!("{}", style("Sample documents:").bold());
    for (index, record) in details.samples.iter().enumerate() {
        eprintln!("  Document {}:", index + 1);
        eprintln!("    ID: {}", record.id);
        eprintln!(
            "    Content preview: {}",
            preview(&record.document, SAMPLE_PREVIEW_CHARS)
        );
        eprintln!(
            "    Metadata: {}",
            serde_json::to_string(&record.metadata).unwrap_or_default()
        );
        eprintln!();
    }
}

#[inline]
pub fn print_hits(query: &str, hits: &[SearchHit]) {
    eprintln!();
    eprintln!("Found {} results for '{}':", hits.len(), style(query).cyan());
    for hit in hits {
        eprintln!();
        eprintln!(
            "  Result {} (distance: {:.4}):",
            hit.rank,
            style(hit.distance).cyan()
        );
        eprintln!("    Source: {}", hit.source);
        if let Some(file_path) = &hit.file_path {
            eprintln!("    Path: {}", style(file_path).dim());
        }
        eprintln!("    Content: {}", hit.preview);
    }
}

/// Statistics, then a search / statistics / quit menu until the user quits
#[inline]
pub fn run_interactive(config: &Config) -> Result<()> {
    let store = ChromaStore::new(&config.chroma)?;
    store.heartbeat()?;

    eprintln!("{}", style("=== Chroma Verification Tool ===").bold().cyan());
    eprintln!(
        "{}",
        style(format!("✅ Connected to Chroma at {}", store.base_url())).green()
    );
    eprintln!();

    let collection = config.chroma.collection.as_str();
    print_report(&collection_stats(&store, collection, DEFAULT_SAMPLE_DOCUMENTS)?);

    // Loaded on the first search
    let mut embedder: Option<Box<dyn Embedder>> = None;
    let options = &[
        "Search the documentation",
        "Show database statistics again",
        "Quit",
    ];

    loop {
        eprintln!();
        let choice = Select::new()
            .with_prompt("Options")
            .default(0)
            .items(options)
            .interact()
            .context("Failed to read menu choice")?;

        match choice {
            0 => {
                if embedder.is_none() {
                    embedder = Some(embedder_from_config(config)?);
                }
                if let Some(embedder) = &embedder {
                    search_loop(&store, embedder.as_ref(), collection)?;
                }
            }
            1 => print_report(&collection_stats(&store, collection, DEFAULT_SAMPLE_DOCUMENTS)?),
            _ => {
                eprintln!("Goodbye!");
                return Ok(());
            }
        }
    }
}

fn search_loop(store: &dyn VectorStore, embedder: &dyn Embedder, collection: &str) -> Result<()> {
    eprintln!();
    eprintln!("{}", style("=== Interactive Search ===").bold());
    eprintln!("Enter your search queries (type 'quit' to exit):");

    loop {
        let query: String = Input::new()
            .with_prompt("Search query")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read search query")?;

        let query = query.trim();
        if is_exit_command(query) {
            return Ok(());
        }
        if query.is_empty() {
            continue;
        }

        match search(store, embedder, collection, query, DEFAULT_TOP_K) {
            Ok(hits) => print_hits(query, &hits),
            Err(e) => eprintln!("{}", style(format!("Search failed: {e}")).red()),
        }
    }
}
