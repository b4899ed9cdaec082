// Configuration management module
// TOML settings for Chroma, the embedding model, chunking, docs location and the embed server

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ChromaConfig, Config, ConfigError, DocsConfig, EmbeddingConfig, ServerConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
