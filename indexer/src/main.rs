use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use minisearch_core::index::build_from_store;
use minisearch_core::persist::{save_index, IndexFormat};
use minisearch_core::DocumentStore;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index from crawled documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read every stored document and write the index file
    Build {
        /// Document store directory written by the crawler
        #[arg(long, default_value = "./search_engine.db")]
        db: String,
        /// Output index file (.bin for bincode, anything else JSON)
        #[arg(long, default_value = "./inverted_index.json")]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { db, output } => build_index(&db, &output),
    }
}

fn build_index(db: &str, output: &str) -> Result<()> {
    let start = Instant::now();
    let store = DocumentStore::open(db)?;
    tracing::info!(db, documents = store.len(), "building inverted index");

    let index = build_from_store(&store)?;
    let out = Path::new(output);
    save_index(out, &index).with_context(|| format!("writing index to {output}"))?;

    tracing::info!(
        output,
        format = ?IndexFormat::from_path(out),
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        took_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}
