use super::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const BASE: &str = "/home/user/Dev/grafana/k6-docs/docs/sources";

fn extract(relative: &str) -> PathMetadata {
    let base = PathBuf::from(BASE);
    extract_metadata(&base.join(relative), &base)
}

fn write_file(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("can create dirs");
    fs::write(path, "---\ntitle: test\n---\nbody").expect("can write file");
}

#[test]
fn versioned_k6_path() {
    let metadata = extract("k6/v1.0.x/javascript-api/k6.md");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "v1.0.x");
    assert_eq!(metadata.category, "javascript-api");
    assert_eq!(metadata.file_path, "k6/v1.0.x/javascript-api/k6.md");
}

#[test]
fn next_k6_path() {
    let metadata = extract("k6/next/examples/basic.md");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "next");
    assert_eq!(metadata.category, "examples");
}

#[test]
fn k6_studio_top_level_page() {
    let metadata = extract("k6-studio/introduction.md");
    assert_eq!(metadata.tool, "k6-studio");
    assert_eq!(metadata.version, "current");
    assert_eq!(metadata.category, "introduction");
}

#[test]
fn k6_studio_nested_page() {
    let metadata = extract("k6-studio/set-up/installation.md");
    assert_eq!(metadata.tool, "k6-studio");
    assert_eq!(metadata.version, "current");
    assert_eq!(metadata.category, "set-up");
}

#[test]
fn k6_studio_without_category() {
    let metadata = extract("k6-studio");
    assert_eq!(metadata.tool, "k6-studio");
    assert_eq!(metadata.version, "current");
    assert_eq!(metadata.category, "unknown");
}

#[test]
fn empty_path() {
    let base = PathBuf::from(BASE);
    let metadata = extract_metadata(&base, &base);
    assert_eq!(metadata.tool, "unknown");
    assert_eq!(metadata.version, "unknown");
    assert_eq!(metadata.category, "unknown");
    assert_eq!(metadata.file_path, "");

    let metadata = extract_metadata(Path::new(""), Path::new(""));
    assert_eq!(metadata.tool, "unknown");
}

#[test]
fn bare_next_tree() {
    let metadata = extract("next/using-k6/http-requests.md");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "next");
    assert_eq!(metadata.category, "using-k6");
}

#[test]
fn bare_version_tree() {
    let metadata = extract("v0.57.x/results-output/end-of-test.md");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "v0.57.x");
    assert_eq!(metadata.category, "results-output");
}

#[test]
fn k6_unversioned_segment_becomes_category() {
    let metadata = extract("k6/shared/javascript-api/k6-http.md");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "unknown");
    assert_eq!(metadata.category, "shared");
}

#[test]
fn k6_version_without_category() {
    let metadata = extract("k6/v1.1.x");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "v1.1.x");
    assert_eq!(metadata.category, "unknown");
}

#[test]
fn k6_root_only() {
    let metadata = extract("k6");
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "unknown");
    assert_eq!(metadata.category, "unknown");
}

#[test]
fn unrecognised_root() {
    let metadata = extract("grafana-cloud/k6/get-started.md");
    assert_eq!(metadata.tool, "unknown");
    assert_eq!(metadata.version, "unknown");
    assert_eq!(metadata.category, "unknown");
    assert_eq!(metadata.file_path, "grafana-cloud/k6/get-started.md");
}

#[test]
fn directory_segments_keep_their_suffix() {
    let metadata = extract("k6/v1.0.x/notes.md/page.md");
    assert_eq!(metadata.category, "notes.md");
}

#[test]
fn relative_input_paths() {
    let metadata = extract_metadata(Path::new("k6/next/examples/basic.md"), Path::new(""));
    assert_eq!(metadata.version, "next");
    assert_eq!(metadata.category, "examples");
}

#[test]
fn path_outside_base_is_unknown() {
    let metadata = extract_metadata(Path::new("/k6/v1.0.x/a/b.md"), Path::new("/docs"));
    assert_eq!(metadata.tool, "unknown");
    assert_eq!(metadata.version, "unknown");
    assert_eq!(metadata.category, "unknown");
    assert_eq!(metadata.file_path, "../k6/v1.0.x/a/b.md");
}

#[test]
fn parent_segments_climbing_out_of_base_are_unknown() {
    let metadata = extract_metadata(Path::new("/docs/../k6/v1.0.x/a/b.md"), Path::new("/docs"));
    assert_eq!(metadata.tool, "unknown");
    assert_eq!(metadata.file_path, "../k6/v1.0.x/a/b.md");

    let metadata = extract_metadata(Path::new("../k6/next/examples/basic.md"), Path::new(""));
    assert_eq!(metadata.tool, "unknown");
}

#[test]
fn parent_segments_staying_inside_base() {
    let metadata = extract_metadata(
        Path::new("/docs/k6/./drafts/../v1.0.x/using-k6/checks.md"),
        Path::new("/docs"),
    );
    assert_eq!(metadata.tool, "k6");
    assert_eq!(metadata.version, "v1.0.x");
    assert_eq!(metadata.category, "using-k6");
    assert_eq!(metadata.file_path, "k6/v1.0.x/using-k6/checks.md");
}

#[test]
fn sibling_of_base_is_unknown() {
    let metadata = extract_metadata(
        Path::new("/home/user/k6-docs/docs/other/k6-studio/intro.md"),
        Path::new("/home/user/k6-docs/docs/sources"),
    );
    assert_eq!(metadata.tool, "unknown");
    assert_eq!(metadata.file_path, "../other/k6-studio/intro.md");
}

#[test]
fn directory_outside_base_is_included() {
    assert!(should_include_directory(
        Path::new("/elsewhere/k6/v0.47.x"),
        Path::new("/docs")
    ));
}

#[test]
fn extraction_is_idempotent() {
    let first = extract("k6/v1.0.x/javascript-api/k6.md");
    let second = extract("k6/v1.0.x/javascript-api/k6.md");
    assert_eq!(first, second);
}

#[test]
fn version_pattern() {
    assert!(is_version_segment("v1.0.x"));
    assert!(is_version_segment("v0.47.x"));
    assert!(is_version_segment("v12.345.x"));

    assert!(!is_version_segment("v1.0"));
    assert!(!is_version_segment("1.0.x"));
    assert!(!is_version_segment("V1.0.x"));
    assert!(!is_version_segment("v1.0.X"));
    assert!(!is_version_segment("next"));
    assert!(!is_version_segment(""));
}

#[test]
fn version_parts() {
    assert_eq!(parse_version("v1.2.x"), Some((1, 2)));
    assert_eq!(parse_version("v0.57.x"), Some((0, 57)));
    assert_eq!(parse_version("v1.2.x-old"), None);
    assert_eq!(parse_version("next"), None);
}

#[test]
fn k6_studio_always_included() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();

    assert!(should_include_directory(&base.join("k6-studio"), base));
    assert!(should_include_directory(
        &base.join("k6-studio/set-up/nested"),
        base
    ));
}

#[test]
fn sparse_version_excluded() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();
    write_file(base, "k6/v0.47.x/_index.md");

    assert!(!should_include_directory(&base.join("k6/v0.47.x"), base));
}

#[test]
fn sparse_allow_listed_version_included() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();
    write_file(base, "k6/v1.2.x/_index.md");
    write_file(base, "k6/v0.50.x/_index.md");

    assert!(should_include_directory(&base.join("k6/v1.2.x"), base));
    assert!(should_include_directory(&base.join("k6/v0.50.x"), base));
}

#[test]
fn populated_version_included() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();
    write_file(base, "k6/v0.47.x/_index.md");
    write_file(base, "k6/v0.47.x/javascript-api/k6-http.md");

    assert!(should_include_directory(&base.join("k6/v0.47.x"), base));
    assert!(should_include_directory(
        &base.join("k6/v0.47.x/javascript-api"),
        base
    ));
}

#[test]
fn single_non_index_page_included() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();
    write_file(base, "k6/v0.40.x/get-started.md");

    assert!(should_include_directory(&base.join("k6/v0.40.x"), base));
}

#[test]
fn missing_version_excluded() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();

    assert!(!should_include_directory(&base.join("k6/v1.0.x"), base));
}

#[test]
fn other_directories_included() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path();

    assert!(should_include_directory(base, base));
    assert!(should_include_directory(&base.join("k6"), base));
    assert!(should_include_directory(&base.join("k6/next/examples"), base));
    assert!(should_include_directory(&base.join("shared"), base));
}
