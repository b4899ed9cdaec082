use super::*;
use crate::testing::{LetterEmbedder, MemoryStore};
use std::fs;
use tempfile::TempDir;

fn write_page(root: &Path, relative: &str, title: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("page has a parent")).expect("can create dirs");
    fs::write(
        path,
        format!("---\ntitle: {title}\ndescription: About {title}\nweight: 100\n---\n\n{body}\n"),
    )
    .expect("can write page");
}

fn paragraph(topic: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("Paragraph {i} explains how {topic} behaves during a test run."))
        .collect::<Vec<_>>()
        .join(" ")
}

fn docs_tree() -> TempDir {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let root = temp_dir.path();

    write_page(
        root,
        "k6/v1.0.x/javascript-api/k6-http.md",
        "k6/http",
        &paragraph("the http module", 60),
    );
    write_page(root, "k6/v1.0.x/using-k6/checks.md", "Checks", "Checks validate responses.");
    write_page(root, "k6/next/examples/basic.md", "Basic", "A minimal script.");
    write_page(root, "k6/v0.40.x/_index.md", "Old", "Placeholder.");
    write_page(root, "k6-studio/introduction.md", "k6 Studio", "Record browser sessions.");
    write_page(root, "k6-studio/empty.md", "Empty", "");

    temp_dir
}

fn ingestor<'a>(embedder: &'a LetterEmbedder, store: &'a MemoryStore) -> Ingestor<'a> {
    Ingestor::new(embedder, store).with_progress(false)
}

#[test]
fn loads_every_chunk_with_metadata() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let stats = ingestor(&embedder, &store)
        .run(temp_dir.path())
        .expect("ingestion should succeed");

    assert_eq!(stats.files_found, 5);
    assert_eq!(stats.documents, 4);
    assert_eq!(stats.skipped_empty, 1);
    assert!(stats.chunks > stats.documents, "long page should split");

    let records = store.records(DEFAULT_COLLECTION);
    assert_eq!(records.len(), stats.chunks);
    assert_eq!(stats.by_tool.values().sum::<usize>(), stats.chunks);
    assert_eq!(stats.by_tool.get("k6-studio"), Some(&1));
    assert_eq!(stats.by_version.get("next"), Some(&1));
    assert_eq!(stats.by_version.get("current"), Some(&1));
    assert!(!stats.by_version.contains_key("v0.40.x"));

    let checks = records
        .iter()
        .find(|record| record.metadata.file_path == "k6/v1.0.x/using-k6/checks.md")
        .expect("checks page is stored");
    assert_eq!(checks.document, "Checks validate responses.");
    assert_eq!(checks.metadata.title, "Checks");
    assert_eq!(checks.metadata.description, "About Checks");
    assert_eq!(checks.metadata.weight, "100");
    assert_eq!(checks.metadata.category, "using-k6");
    assert_eq!(checks.embedding, crate::testing::letter_vector(&checks.document));
}

#[test]
fn chunks_of_one_document_share_labels() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    ingestor(&embedder, &store)
        .run(temp_dir.path())
        .expect("ingestion should succeed");

    let http: Vec<ChunkRecord> = store
        .records(DEFAULT_COLLECTION)
        .into_iter()
        .filter(|record| record.metadata.file_path.ends_with("k6-http.md"))
        .collect();

    assert!(http.len() > 1);
    for record in &http {
        assert_eq!(record.metadata.tool, "k6");
        assert_eq!(record.metadata.version, "v1.0.x");
        assert_eq!(record.metadata.category, "javascript-api");
    }
}

#[test]
fn collection_records_embedding_model() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    ingestor(&embedder, &store)
        .with_collection("scratch")
        .run(temp_dir.path())
        .expect("ingestion should succeed");

    let collection = store
        .find_collection("scratch")
        .expect("lookup should succeed")
        .expect("collection should exist");
    assert_eq!(collection.embedding_model(), Some("all-MiniLM-L6-v2"));
}

#[test]
fn no_documents_is_fatal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    write_page(temp_dir.path(), "k6/v0.40.x/_index.md", "Old", "Placeholder.");
    write_page(temp_dir.path(), "k6-studio/blank.md", "Blank", "  ");

    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();
    let result = ingestor(&embedder, &store).run(temp_dir.path());

    assert!(matches!(result, Err(DocsError::NoDocuments(_))));
    assert!(store.list_collections().expect("list").is_empty());
}

#[test]
fn missing_root_is_fatal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let result = ingestor(&embedder, &store).run(&temp_dir.path().join("sources"));
    assert!(matches!(result, Err(DocsError::DocsRootMissing(_))));
}

#[test]
fn recreate_replaces_existing_collection() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let first = ingestor(&embedder, &store)
        .run(temp_dir.path())
        .expect("first run should succeed");
    let second = ingestor(&embedder, &store)
        .run(temp_dir.path())
        .expect("second run should succeed");

    assert_eq!(first.chunks, second.chunks);
    assert_eq!(store.records(DEFAULT_COLLECTION).len(), second.chunks);
    assert_eq!(
        *store.deleted.lock().expect("store lock"),
        vec![DEFAULT_COLLECTION.to_string()]
    );
}

#[test]
fn without_recreate_records_accumulate() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let first = ingestor(&embedder, &store)
        .run(temp_dir.path())
        .expect("first run should succeed");
    ingestor(&embedder, &store)
        .with_recreate(false)
        .run(temp_dir.path())
        .expect("second run should succeed");

    // Chunk ids are random, so a second load adds rather than overwrites
    assert_eq!(store.records(DEFAULT_COLLECTION).len(), first.chunks * 2);
    assert!(store.deleted.lock().expect("store lock").is_empty());
}

#[test]
fn only_version_keeps_studio_pages() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let stats = ingestor(&embedder, &store)
        .with_only_version(Some("v1.0.x".to_string()))
        .run(temp_dir.path())
        .expect("ingestion should succeed");

    let versions: Vec<&String> = stats.by_version.keys().collect();
    assert_eq!(versions, vec!["current", "v1.0.x"]);
}

#[test]
fn embedding_failure_stores_nothing() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder {
        fail: true,
        ..LetterEmbedder::default()
    };
    let store = MemoryStore::default();

    let result = ingestor(&embedder, &store).run(temp_dir.path());

    assert!(matches!(result, Err(DocsError::Embedding(_))));
    assert!(store.list_collections().expect("list").is_empty());
}

#[test]
fn small_batches_embed_everything() {
    let temp_dir = docs_tree();
    let embedder = LetterEmbedder::default();
    let store = MemoryStore::default();

    let stats = ingestor(&embedder, &store)
        .with_batch_size(1)
        .run(temp_dir.path())
        .expect("ingestion should succeed");

    assert_eq!(store.records(DEFAULT_COLLECTION).len(), stats.chunks);
}
