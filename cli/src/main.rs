#![forbid(unsafe_code)]
//! chunkvault command-line tool.
//!
//! Exposes:
//! - `ingest <pairs.jsonl>`: append `{"text", "vector"}` records to the store
//! - `search --vector 0.1,0.2,..`: top-k chunks nearest to a query vector
//! - `info`: dimension and entry count of the persisted store
//!
//! Store location and shape come from `CHUNKVAULT_*` environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod env_utils;
mod input;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "chunkvault")]
#[command(about = "Exact vector search over embedded text chunks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append chunk/vector pairs from a JSON Lines file and save the store
    Ingest {
        /// One `{"text": "...", "vector": [..]}` object per line
        input: PathBuf,
    },
    /// Print the chunks nearest to a query vector
    Search {
        /// Comma-separated query components
        #[arg(long, conflicts_with = "vector_file", required_unless_present = "vector_file")]
        vector: Option<String>,

        /// JSON file holding the query as an array of numbers
        #[arg(long)]
        vector_file: Option<PathBuf>,

        /// Number of results (defaults to CHUNKVAULT_TOP_K)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Print dimension and entry count of the persisted store
    Info,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(
        index = %config.index_path.display(),
        chunks = %config.chunks_path.display(),
        dimension = config.dimension,
        strict_finite = config.strict_finite,
        "configuration loaded"
    );

    match cli.command {
        Command::Ingest { input } => {
            let batch = input::read_pairs_file(&input)?;
            tracing::info!(records = batch.len(), input = %input.display(), "parsed pairs file");
            let summary = commands::ingest(&config, batch)?;
            println!("added={} total={}", summary.added, summary.total);
        }
        Command::Search {
            vector,
            vector_file,
            k,
        } => {
            let query = match (vector, vector_file) {
                (Some(raw), _) => input::parse_vector_list(&raw).context("invalid --vector")?,
                (None, Some(path)) => input::read_vector_file(&path)?,
                (None, None) => anyhow::bail!("either --vector or --vector-file is required"),
            };
            let k = k.unwrap_or(config.top_k);
            let hits = commands::search(&config, &query, k)?;
            print!("{}", commands::render_hits(&hits, config.preview_chars));
        }
        Command::Info => {
            let info = commands::info(&config)?;
            println!("dimension={} entries={}", info.dimension, info.entries);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to initialize tracing subscriber: {error}");
    }
}
