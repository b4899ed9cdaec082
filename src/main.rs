use clap::{Parser, Subcommand};
use k6_docs_index::Result;
use k6_docs_index::commands::{IngestOptions, ingest, search_docs, serve, stats, verify};
use k6_docs_index::config::{Config, run_interactive_config, show_config};
use k6_docs_index::verify::{DEFAULT_SAMPLE_DOCUMENTS, DEFAULT_TOP_K};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "k6-docs-index")]
#[command(about = "Index the k6 documentation into Chroma and query it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the Chroma connection and documentation location
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chunk, embed and store the documentation
    Ingest {
        /// Local docs/sources directory, overrides the configured path
        #[arg(long, conflicts_with = "clone")]
        docs_path: Option<PathBuf>,
        /// Shallow-clone the documentation repository into a temporary directory
        #[arg(long)]
        clone: bool,
        /// Repository to clone, overrides the configured URL
        #[arg(long, requires = "clone")]
        repo: Option<String>,
        /// Only index the newest k6 version, plus k6-studio
        #[arg(long)]
        latest_only: bool,
        /// Add to the existing collection instead of recreating it
        #[arg(long)]
        no_recreate: bool,
    },
    /// Start the embedding HTTP server
    Serve {
        /// Address to bind, overrides the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect the collection and search it interactively
    Verify,
    /// Show collection statistics
    Stats {
        /// Number of sample documents to show
        #[arg(long, default_value_t = DEFAULT_SAMPLE_DOCUMENTS)]
        samples: usize,
    },
    /// Search the indexed documentation
    Search {
        /// Natural-language query
        query: String,
        /// Number of results
        #[arg(short, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest {
            docs_path,
            clone,
            repo,
            latest_only,
            no_recreate,
        } => {
            let options = IngestOptions {
                docs_path,
                clone,
                repo,
                latest_only,
                recreate: !no_recreate,
            };
            ingest(&Config::load()?, &options)?;
        }
        Commands::Serve { host, port } => {
            serve(&Config::load()?, host, port).await?;
        }
        Commands::Verify => {
            verify(&Config::load()?)?;
        }
        Commands::Stats { samples } => {
            stats(&Config::load()?, samples)?;
        }
        Commands::Search { query, k } => {
            search_docs(&Config::load()?, &query, k)?;
        }
    }

    Ok(())
}
