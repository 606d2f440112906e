//! # UDL RAG CLI (`udl`)
//!
//! Command-line access to the guideline store: build or load the embedded
//! corpus, run searches, and inspect or reset the embedding cache.
//!
//! ## Usage
//!
//! ```bash
//! udl --config ./config/udl.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `udl init` | Load the cache or embed the corpus, then print stats |
//! | `udl search "<query>"` | Print prompt-ready guideline results |
//! | `udl stats` | Print store stats without initializing |
//! | `udl status` | Attempt initialization and report the outcome |
//! | `udl chunk` | Chunk the corpus and report counts, without embedding |
//! | `udl cache clear` | Delete the embedding cache |
//! | `udl cache rebuild` | Delete and regenerate the embedding cache |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use udl_rag::cache::{CacheStore, FileCache};
use udl_rag::chunk::chunk_corpus;
use udl_rag::config::{self, Config};
use udl_rag::corpus::Corpus;
use udl_rag::{logging, search_guidelines_with_timeout, VectorStore};

/// UDL RAG CLI: retrieval over the Universal Design for Learning guidelines.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/udl.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "udl",
    about = "Retrieval over the Universal Design for Learning guidelines",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/udl.toml`. When the file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/udl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the guideline store.
    ///
    /// Adopts the embedding cache when it is current, otherwise chunks and
    /// embeds the corpus and writes a fresh cache.
    Init,

    /// Search the guidelines and print prompt-ready results.
    ///
    /// Retrieval errors are logged and replaced by a fallback message, so
    /// this command succeeds even when the embedding service is down.
    Search {
        /// The search query string.
        query: String,

        /// Number of results to return. Defaults to `[retrieval] top_k`.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print chunk count, embedding dimensions, and cache presence.
    ///
    /// Reports the in-process state only, so a fresh process shows zero
    /// chunks until something initializes the store.
    Stats,

    /// Attempt initialization and print whether it succeeded.
    Status,

    /// Chunk the corpus and print counts without embedding anything.
    Chunk,

    /// Manage the embedding cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Cache management subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Delete the cache file.
    Clear,
    /// Delete the cache file and re-embed the corpus.
    Rebuild,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_or_default(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            let store = VectorStore::from_config(&cfg)?;
            store.initialize().await?;
            print_json(&store.get_stats().await)?;
        }
        Commands::Search { query, top_k } => {
            let top_k = top_k.unwrap_or(cfg.retrieval.top_k);
            if top_k == 0 {
                bail!("--top-k must be >= 1");
            }
            let store = VectorStore::from_config(&cfg)?;
            let text = search_guidelines_with_timeout(
                &store,
                &query,
                top_k,
                Duration::from_secs(cfg.retrieval.timeout_secs),
            )
            .await;
            println!("{}", text);
        }
        Commands::Stats => {
            let store = VectorStore::from_config(&cfg)?;
            print_json(&store.get_stats().await)?;
        }
        Commands::Status => {
            let store = VectorStore::from_config(&cfg)?;
            print_json(&store.status().await)?;
        }
        Commands::Chunk => run_chunk(&cfg)?,
        Commands::Cache { action } => match action {
            CacheAction::Clear => {
                let cache = FileCache::new(cfg.cache.path.clone());
                if cache.clear().await? {
                    println!("Removed {}", cfg.cache.path.display());
                } else {
                    println!("No cache at {}", cfg.cache.path.display());
                }
            }
            CacheAction::Rebuild => {
                let store = VectorStore::from_config(&cfg)?;
                store.rebuild().await?;
                print_json(&store.get_stats().await)?;
            }
        },
    }

    Ok(())
}

fn run_chunk(cfg: &Config) -> anyhow::Result<()> {
    let docs = Corpus::File(cfg.corpus.path.clone()).load()?;
    let chunks = chunk_corpus(&docs, &cfg.chunking);

    println!("documents: {}", docs.len());
    println!("chunks: {}", chunks.len());
    if !chunks.is_empty() {
        let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        println!("avg chunk chars: {}", total / chunks.len());
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
