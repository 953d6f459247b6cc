use anyhow::Result;
use axum::Router;
use clap::{Parser, Subcommand};
use minisearch_core::SearchEngine;
use minisearch_server::{build_app, repl::run_repl};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Query the inverted index")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive search prompt; type `exit` to quit
    Repl {
        #[arg(long, default_value = "./search_engine.db")]
        db: PathBuf,
        #[arg(long, default_value = "./inverted_index.json")]
        index: PathBuf,
    },
    /// Serve searches over HTTP
    Serve {
        #[arg(long, default_value = "./search_engine.db")]
        db: PathBuf,
        #[arg(long, default_value = "./inverted_index.json")]
        index: PathBuf,
        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    match args.command {
        Command::Repl { db, index } => {
            let engine = SearchEngine::open(&db, &index)?;
            let stdin = io::stdin();
            run_repl(&engine, stdin.lock(), io::stdout())?;
        }
        Command::Serve { db, index, host, port } => {
            let engine = Arc::new(SearchEngine::open(&db, &index)?);
            let app: Router = build_app(engine);
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
    }
    Ok(())
}
