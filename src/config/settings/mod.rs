
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::embeddings::EMBEDDING_MODEL;
use crate::embeddings::chunking::ChunkingConfig;
use crate::store::DEFAULT_COLLECTION;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "k6-docs-index";

/// Full Chroma URL, overrides protocol, host and port
pub const ENV_CHROMA_URL: &str = "K6_DOCS_CHROMA_URL";
pub const ENV_COLLECTION: &str = "K6_DOCS_COLLECTION";
pub const ENV_DOCS_PATH: &str = "K6_DOCS_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chroma: ChromaConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChromaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub collection: String,
    pub tenant: String,
    pub database: String,
    pub upsert_batch_size: usize,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8000,
            collection: DEFAULT_COLLECTION.to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            upsert_batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
    /// Embed through a running `/embed` service instead of loading the model locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<Url>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EMBEDDING_MODEL.to_string(),
            batch_size: 32,
            service_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocsConfig {
    /// Local `docs/sources` directory of a k6-docs checkout
    pub path: PathBuf,
    pub repo_url: String,
    /// Location of the sources inside a fresh clone of `repo_url`
    pub sources_subdir: PathBuf,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            path: dirs::home_dir()
                .unwrap_or_default()
                .join("Dev/grafana/k6-docs/docs/sources"),
            repo_url: "https://github.com/grafana/k6-docs.git".to_string(),
            sources_subdir: PathBuf::from("docs/sources"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(usize),
    #[error("Invalid upsert batch size: {0} (must be between 1 and 5000)")]
    InvalidUpsertBatchSize(usize),
    #[error("Unsupported embedding model: {0} (only {EMBEDDING_MODEL} is supported)")]
    UnsupportedModel(String),
    #[error("Invalid collection name: '{0}' (must be 3 to 63 characters)")]
    InvalidCollection(String),
    #[error("Invalid {0}: cannot be empty")]
    EmptyField(&'static str),
    #[error("Invalid max chunk size: {0} (must be between 100 and 8192)")]
    InvalidMaxChunkSize(usize),
    #[error("Overlap size ({0}) must be smaller than max chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid server host: {0} (must be an IP address)")]
    InvalidHost(String),
    #[error("Invalid sources directory: {0} (must be a relative path)")]
    InvalidSourcesSubdir(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load from the platform config directory, then apply environment overrides
    #[inline]
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Self::config_dir()?)?;
        config
            .apply_overrides(|key| std::env::var(key).ok())
            .context("Invalid environment override")?;
        config
            .validate()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// Load `config.toml` from `config_dir`, falling back to defaults when it is absent
    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::with_base_dir(config_dir.as_ref()));
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Defaults rooted at `base_dir`
    #[inline]
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Apply `K6_DOCS_*` overrides read through `lookup`
    #[inline]
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CHROMA_URL) {
            self.chroma.set_url(&raw)?;
        }
        if let Some(collection) = lookup(ENV_COLLECTION) {
            self.chroma.collection = collection;
        }
        if let Some(path) = lookup(ENV_DOCS_PATH) {
            self.docs.path = PathBuf::from(path);
        }
        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chroma.validate()?;
        self.embedding.validate()?;
        self.validate_chunking_config()?;
        self.docs.validate()?;
        self.server.validate()?;
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(100..=8192).contains(&config.max_chunk_size) {
            return Err(ConfigError::InvalidMaxChunkSize(config.max_chunk_size));
        }

        if config.overlap_size >= config.max_chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                config.overlap_size,
                config.max_chunk_size,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// Where the embedding model files are downloaded to
    #[inline]
    pub fn model_cache_dir(&self) -> PathBuf {
        self.base_dir.join("models")
    }

    #[inline]
    pub fn chroma_url(&self) -> Result<Url, ConfigError> {
        self.chroma.chroma_url()
    }
}

impl ChromaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.chroma_url()?;

        // Chroma's own naming rule
        let length = self.collection.chars().count();
        if !(3..=63).contains(&length) {
            return Err(ConfigError::InvalidCollection(self.collection.clone()));
        }

        if self.tenant.trim().is_empty() {
            return Err(ConfigError::EmptyField("tenant"));
        }

        if self.database.trim().is_empty() {
            return Err(ConfigError::EmptyField("database"));
        }

        if !(1..=5000).contains(&self.upsert_batch_size) {
            return Err(ConfigError::InvalidUpsertBatchSize(self.upsert_batch_size));
        }

        Ok(())
    }

    pub fn chroma_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    /// Take protocol, host and port from a full URL such as `http://chroma:8000`
    pub fn set_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        let url = Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;

        let protocol = url.scheme().to_string();
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidUrl(raw.to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ConfigError::InvalidUrl(raw.to_string()))?;

        self.protocol = protocol;
        self.host = host;
        self.port = port;
        Ok(())
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = ChromaConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.chroma_url()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_collection(&mut self, collection: String) -> Result<(), ConfigError> {
        if !(3..=63).contains(&collection.chars().count()) {
            return Err(ConfigError::InvalidCollection(collection));
        }
        self.collection = collection;
        Ok(())
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Vectors from another model would not be comparable with the stored ones
        if self.model != EMBEDDING_MODEL {
            return Err(ConfigError::UnsupportedModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if let Some(url) = &self.service_url {
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
            }
        }

        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }
}

impl DocsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repo_url.trim().is_empty() {
            return Err(ConfigError::EmptyField("repository URL"));
        }

        if self.sources_subdir.is_absolute() {
            return Err(ConfigError::InvalidSourcesSubdir(
                self.sources_subdir.display().to_string(),
            ));
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
