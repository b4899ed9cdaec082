#[cfg(test)]
mod tests;

use fancy_regex::Regex;
use std::path::{Component, Path};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

pub const UNKNOWN: &str = "unknown";
pub const TOOL_K6: &str = "k6";
pub const TOOL_K6_STUDIO: &str = "k6-studio";
pub const VERSION_NEXT: &str = "next";
/// k6-studio is not versioned, its tree always describes the current release
pub const VERSION_CURRENT: &str = "current";
pub const INDEX_PAGE: &str = "_index.md";

/// Version trees kept even when they hold nothing but an index page
const ALLOWED_SPARSE_VERSIONS: [&str; 2] = ["v0.5", "v1."];

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+\.x").expect("valid regex"));

static VERSION_PARTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)\.(\d+)\.x$").expect("valid regex"));

/// Labels inferred from where a file lives in the documentation tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMetadata {
    /// Path relative to the documentation root, `/` separated
    pub file_path: String,
    pub tool: String,
    pub version: String,
    pub category: String,
}

impl PathMetadata {
    fn unknown(file_path: String) -> Self {
        Self {
            file_path,
            tool: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
        }
    }
}

/// Whether a path segment names a k6 release tree such as `v1.0.x`
#[inline]
pub fn is_version_segment(segment: &str) -> bool {
    VERSION_PATTERN.is_match(segment).unwrap_or(false)
}

/// Split an exact `vMAJOR.MINOR.x` segment into its numeric parts
#[inline]
pub fn parse_version(segment: &str) -> Option<(u32, u32)> {
    let captures = VERSION_PARTS.captures(segment).ok().flatten()?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Infer tool, version and category for a file from its location.
///
/// This only looks at the path strings, the file does not need to exist.
#[inline]
pub fn extract_metadata(file_path: &Path, base_path: &Path) -> PathMetadata {
    let segments = relative_segments(file_path, base_path);
    let mut metadata = PathMetadata::unknown(segments.join("/"));

    let Some(first) = segments.first() else {
        return metadata;
    };

    match first.as_str() {
        TOOL_K6 => {
            metadata.tool = TOOL_K6.to_string();

            if let Some(second) = segments.get(1) {
                if second == VERSION_NEXT {
                    metadata.version = VERSION_NEXT.to_string();
                } else if is_version_segment(second) {
                    metadata.version.clone_from(second);
                } else {
                    metadata.category = category_at(&segments, 1);
                }

                if metadata.version != UNKNOWN {
                    if segments.len() > 2 {
                        metadata.category = category_at(&segments, 2);
                    }
                } else {
                    metadata.category = category_at(&segments, 1);
                }
            }
        }
        TOOL_K6_STUDIO => {
            metadata.tool = TOOL_K6_STUDIO.to_string();
            metadata.version = VERSION_CURRENT.to_string();
            if segments.len() > 1 {
                metadata.category = category_at(&segments, 1);
            }
        }
        VERSION_NEXT => {
            metadata.tool = TOOL_K6.to_string();
            metadata.version = VERSION_NEXT.to_string();
            if segments.len() > 1 {
                metadata.category = category_at(&segments, 1);
            }
        }
        segment if is_version_segment(segment) => {
            metadata.tool = TOOL_K6.to_string();
            metadata.version = segment.to_string();
            if segments.len() > 1 {
                metadata.category = category_at(&segments, 1);
            }
        }
        _ => {}
    }

    debug!(
        "Extracted metadata for {}: tool={} version={} category={}",
        metadata.file_path, metadata.tool, metadata.version, metadata.category
    );

    metadata
}

/// Decide whether the files directly inside `dir_path` are worth indexing.
///
/// Versioned k6 trees that contain only a stub index page are skipped unless
/// the version is on the allow-list. Everything else is included.
#[inline]
pub fn should_include_directory(dir_path: &Path, base_path: &Path) -> bool {
    let segments = relative_segments(dir_path, base_path);

    if segments.first().is_some_and(|s| s == TOOL_K6_STUDIO) {
        return true;
    }

    if segments.len() >= 2 && segments[0] == TOOL_K6 && is_version_segment(&segments[1]) {
        let version = &segments[1];
        let version_dir = base_path.join(TOOL_K6).join(version);
        if !version_dir.exists() {
            debug!("Version directory {} does not exist", version_dir.display());
            return false;
        }

        return has_substantial_content(&version_dir) || is_allow_listed(version);
    }

    true
}

fn is_allow_listed(version: &str) -> bool {
    ALLOWED_SPARSE_VERSIONS.iter().any(|v| version.contains(v))
}

fn has_substantial_content(version_dir: &Path) -> bool {
    let markdown_files: Vec<String> = WalkDir::new(version_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    markdown_files.len() > 1 || markdown_files.iter().any(|name| name != INDEX_PAGE)
}

const PARENT: &str = "..";

/// Segments of `path` relative to `base_path`, computed lexically. A path
/// outside the base starts with `..` segments, which no tool matches.
fn relative_segments(path: &Path, base_path: &Path) -> Vec<String> {
    let (mut anchor, mut segments) = normalize(path);
    let (mut base_anchor, mut base_segments) = normalize(base_path);

    if anchor != base_anchor {
        if let (Ok(absolute), Ok(absolute_base)) =
            (std::path::absolute(path), std::path::absolute(base_path))
        {
            (anchor, segments) = normalize(&absolute);
            (base_anchor, base_segments) = normalize(&absolute_base);
        }
    }

    if anchor != base_anchor {
        // Different drives, there is no relative path between them
        return std::iter::once(PARENT.to_string()).chain(segments).collect();
    }

    let common = segments
        .iter()
        .zip(&base_segments)
        .take_while(|(a, b)| a == b)
        .count();

    std::iter::repeat_n(PARENT.to_string(), base_segments.len() - common)
        .chain(segments.into_iter().skip(common))
        .collect()
}

/// Split a path into its root (prefix and root dir) and its segments, with
/// `.` dropped and `..` folded into the preceding segment where possible
fn normalize(path: &Path) -> (String, Vec<String>) {
    let mut anchor = String::new();
    let mut segments: Vec<String> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => anchor.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => anchor.push('/'),
            Component::CurDir => {}
            Component::ParentDir => {
                if segments.last().is_some_and(|s| s != PARENT) {
                    segments.pop();
                } else if anchor.is_empty() {
                    segments.push(PARENT.to_string());
                }
            }
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
        }
    }

    (anchor, segments)
}

/// The segment at `index` as a category. A trailing file segment loses its
/// `.md` extension so `k6-studio/introduction.md` is categorised `introduction`.
fn category_at(segments: &[String], index: usize) -> String {
    let Some(segment) = segments.get(index) else {
        return UNKNOWN.to_string();
    };

    if index + 1 == segments.len() {
        segment.strip_suffix(".md").unwrap_or(segment).to_string()
    } else {
        segment.clone()
    }
}
