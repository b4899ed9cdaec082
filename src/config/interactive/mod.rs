
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

use super::{ChromaConfig, Config, ConfigError};
use crate::store::ChromaStore;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 k6 Docs Index Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Chroma Configuration").bold().yellow());
    eprintln!("Configure the Chroma server that stores the documentation vectors.");
    eprintln!();

    configure_chroma(&mut config.chroma)?;

    eprintln!();
    eprintln!("{}", style("Documentation Source").bold().yellow());
    configure_docs(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_chroma_connection(&config.chroma) {
        eprintln!("{}", style("✓ Chroma connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Chroma").yellow()
        );
        eprintln!("You can continue, but make sure Chroma is running before ingesting.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Chroma Settings:").bold().yellow());
    match config.chroma_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Collection: {}", style(&config.chroma.collection).cyan());
    eprintln!(
        "  Tenant/Database: {}/{}",
        style(&config.chroma.tenant).cyan(),
        style(&config.chroma.database).cyan()
    );
    eprintln!(
        "  Upsert Batch Size: {}",
        style(config.chroma.upsert_batch_size).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());
    match &config.embedding.service_url {
        Some(url) => eprintln!("  Service: {}", style(url).cyan()),
        None => eprintln!(
            "  Service: {} (cache at {})",
            style("in-process").cyan(),
            style(config.model_cache_dir().display()).dim()
        ),
    }

    eprintln!();
    eprintln!("{}", style("Chunking Settings:").bold().yellow());
    eprintln!(
        "  Max Chunk Size: {}",
        style(config.chunking.max_chunk_size).cyan()
    );
    eprintln!("  Overlap: {}", style(config.chunking.overlap_size).cyan());

    eprintln!();
    eprintln!("{}", style("Documentation:").bold().yellow());
    eprintln!("  Path: {}", style(config.docs.path.display()).cyan());
    eprintln!("  Repository: {}", style(&config.docs.repo_url).cyan());

    eprintln!();
    eprintln!("{}", style("Embed Server:").bold().yellow());
    eprintln!(
        "  Bind: {}",
        style(format!("{}:{}", config.server.host, config.server.port)).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().or_else(|_| {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        Ok(Config::with_base_dir(&Config::config_dir()?))
    })
}

fn configure_chroma(chroma: &mut ChromaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == chroma.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Chroma protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Chroma host")
        .default(chroma.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ChromaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..ChromaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Chroma port")
        .default(chroma.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let collection: String = Input::new()
        .with_prompt("Collection name")
        .default(chroma.collection.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if (3..=63).contains(&input.chars().count()) {
                Ok(())
            } else {
                Err("Collection name must be 3 to 63 characters")
            }
        })
        .interact_text()?;

    chroma.set_protocol(protocol)?;
    chroma.set_host(host)?;
    chroma.set_port(port)?;
    chroma.set_collection(collection)?;

    Ok(())
}

fn configure_docs(config: &mut Config) -> Result<()> {
    let path: String = Input::new()
        .with_prompt("Local docs/sources directory")
        .default(config.docs.path.display().to_string())
        .interact_text()?;

    let path = PathBuf::from(path);
    if !path.is_dir() {
        eprintln!(
            "{}",
            style("⚠ Directory does not exist yet; use 'ingest --clone' to fetch the docs")
                .yellow()
        );
    }
    config.docs.path = path;

    Ok(())
}

fn test_chroma_connection(chroma: &ChromaConfig) -> bool {
    ChromaStore::new(chroma)
        .map(|store| {
            store
                .with_timeout(std::time::Duration::from_secs(5))
                .with_retry_attempts(1)
        })
        .and_then(|store| store.heartbeat())
        .is_ok()
}
