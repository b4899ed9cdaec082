use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::docs::{DocsSource, find_latest_version};
use crate::embeddings::{Embedder, LocalEmbedder, embedder_from_config};
use crate::ingest::{IngestStats, Ingestor};
use crate::store::ChromaStore;
use crate::verify::{collection_stats, print_hits, print_report, run_interactive, search};
use crate::{DocsError, Result};

/// Where to read the documentation from and how to load it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    pub docs_path: Option<PathBuf>,
    /// Clone the docs repository instead of reading a local checkout
    pub clone: bool,
    pub repo: Option<String>,
    /// Only index the newest `k6/vX.Y.x` directory, plus k6-studio
    pub latest_only: bool,
    pub recreate: bool,
}

fn docs_source(config: &Config, options: &IngestOptions) -> Result<DocsSource> {
    if options.clone {
        let repo = options.repo.as_deref().unwrap_or(&config.docs.repo_url);
        return DocsSource::clone_repository(repo, &config.docs.sources_subdir);
    }

    let path = options
        .docs_path
        .clone()
        .unwrap_or_else(|| config.docs.path.clone());
    DocsSource::local(path)
}

fn connect_store(config: &Config) -> Result<ChromaStore> {
    let store = ChromaStore::new(&config.chroma)?;
    store.heartbeat()?;
    info!("Connected to Chroma at {}", store.base_url());
    Ok(store)
}

/// Load the documentation into the configured collection
#[inline]
pub fn ingest(config: &Config, options: &IngestOptions) -> Result<IngestStats> {
    let source = docs_source(config, options)?;
    let root = source.root();

    let only_version = if options.latest_only {
        let latest = find_latest_version(&root.join("k6"))?;
        eprintln!("Indexing latest k6 version: {}", style(&latest).cyan());
        Some(latest)
    } else {
        None
    };

    let store = connect_store(config)?;
    let embedder = embedder_from_config(config)?;

    let stats = Ingestor::new(embedder.as_ref(), &store)
        .with_collection(config.chroma.collection.clone())
        .with_chunking(config.chunking.clone())
        .with_batch_size(config.embedding.batch_size)
        .with_recreate(options.recreate)
        .with_only_version(only_version)
        .run(root)?;

    print_ingest_summary(&config.chroma.collection, &stats);
    Ok(stats)
}

fn print_ingest_summary(collection: &str, stats: &IngestStats) {
    eprintln!();
    eprintln!("{}", style("✓ Ingestion complete").bold().green());
    eprintln!("  Markdown files: {}", style(stats.files_found).cyan());
    eprintln!("  Documents with content: {}", style(stats.documents).cyan());
    if stats.skipped_empty > 0 {
        eprintln!("  Skipped (empty): {}", style(stats.skipped_empty).dim());
    }
    eprintln!("  Chunks stored: {}", style(stats.chunks).cyan());
    eprintln!("  Collection: {}", style(collection).cyan());

    eprintln!("  By tool:");
    for (tool, count) in &stats.by_tool {
        eprintln!("    {}: {}", tool, count);
    }
    eprintln!("  By version:");
    for (version, count) in &stats.by_version {
        eprintln!("    {}: {}", version, count);
    }
}

/// Serve `POST /embed` with an in-process model
#[inline]
pub async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut server = config.server.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    server
        .validate()
        .map_err(|e| DocsError::Config(e.to_string()))?;
    let addr = server
        .socket_addr()
        .map_err(|e| DocsError::Config(e.to_string()))?;

    eprintln!("Loading embedding model...");
    let embedder: Arc<dyn Embedder> = Arc::new(LocalEmbedder::new(
        config.model_cache_dir(),
        config.embedding.batch_size,
    )?);

    eprintln!(
        "{}",
        style(format!("🌐 Embedding server listening on http://{addr}")).green()
    );
    eprintln!("Press Ctrl+C to stop the server");

    crate::server::serve(addr, embedder).await?;

    eprintln!("✅ Shutdown complete");
    Ok(())
}

/// Interactive statistics and search session
#[inline]
pub fn verify(config: &Config) -> Result<()> {
    run_interactive(config)
}

/// Print collection statistics with `samples` sample documents
#[inline]
pub fn stats(config: &Config, samples: usize) -> Result<()> {
    let store = connect_store(config)?;
    let report = collection_stats(&store, &config.chroma.collection, samples)?;
    print_report(&report);
    Ok(())
}

/// One-shot similarity search
#[inline]
pub fn search_docs(config: &Config, query: &str, k: usize) -> Result<()> {
    let store = connect_store(config)?;
    let embedder = embedder_from_config(config)?;
    let hits = search(&store, embedder.as_ref(), &config.chroma.collection, query, k)?;
    print_hits(query, &hits);
    Ok(())
}
