
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::metadata::parse_version;
use crate::{DocsError, Result};

/// Where the documentation tree to ingest lives
#[derive(Debug)]
pub enum DocsSource {
    /// A tree already present on disk
    Local(PathBuf),
    /// A shallow clone living in a temporary directory for the lifetime of
    /// this value
    Cloned { root: PathBuf, checkout: Checkout },
}

/// Temporary checkout directory, removed on drop
#[derive(Debug)]
pub struct Checkout {
    dir: Option<TempDir>,
}

impl Checkout {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("k6-docs-").tempdir()?;
        debug!("Created temporary checkout at {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or_else(|| Path::new(""), TempDir::path)
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed temporary checkout {}", path.display()),
                Err(e) => warn!(
                    "Failed to clean up temporary directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
}

impl DocsSource {
    /// Use an existing documentation root
    #[inline]
    pub fn local(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(DocsError::DocsRootMissing(path));
        }
        info!("Using k6-docs at {}", path.display());
        Ok(Self::Local(path))
    }

    /// Shallow-clone `repo_url` and use `<checkout>/<sources_subdir>` as root.
    ///
    /// The checkout is removed again if anything fails along the way.
    #[inline]
    pub fn clone_repository(repo_url: &str, sources_subdir: &Path) -> Result<Self> {
        let checkout = Checkout::create()?;

        info!("Cloning documentation repository {}", repo_url);
        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--quiet", repo_url])
            .arg(checkout.path())
            .output()
            .map_err(|e| DocsError::Clone(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocsError::Clone(format!(
                "git clone of {repo_url} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let root = checkout.path().join(sources_subdir);
        if !root.is_dir() {
            return Err(DocsError::DocsRootMissing(root));
        }

        Ok(Self::Cloned { root, checkout })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        match self {
            Self::Local(root) | Self::Cloned { root, .. } => root,
        }
    }
}

/// Newest `vMAJOR.MINOR.x` directory directly inside `k6_dir`
#[inline]
pub fn find_latest_version(k6_dir: &Path) -> Result<String> {
    let entries = fs::read_dir(k6_dir).map_err(|e| {
        DocsError::Config(format!(
            "failed to read docs directory {}: {e}",
            k6_dir.display()
        ))
    })?;

    let mut latest: Option<((u32, u32), String)> = None;
    for entry in entries.filter_map(|entry| entry.ok()) {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(version) = parse_version(&name) else {
            continue;
        };

        if latest.as_ref().is_none_or(|(best, _)| version > *best) {
            latest = Some((version, name));
        }
    }

    latest.map(|(_, name)| name).ok_or_else(|| {
        DocsError::Config(format!(
            "no version directories found in {}",
            k6_dir.display()
        ))
    })
}
