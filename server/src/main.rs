use anyhow::Result;
use axum::Router;
use clap::Parser;
use cinefind_server::{build_app, SearchState};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index file produced by cinefind-indexer
    #[arg(long, default_value = "index.txt")]
    index: String,
    /// Document metadata store
    #[arg(long, default_value = "docs.json")]
    docs: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let state = SearchState::load(&args.index, &args.docs)?;
    let app: Router = build_app(Arc::new(RwLock::new(state)));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
