#![forbid(unsafe_code)]
//! Explorer API server

use blockex::api::run_api_server;
use blockex::config::load_config;
use blockex::explorer::Explorer;
use blockex::rpc::HttpNodeClient;
use blockex::store::SqliteStore;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockex-server", version, about = "Block explorer read API")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the API port from the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blockex=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let db_path = std::path::Path::new(&config.database.path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let store = SqliteStore::open(&config.database.path)?;
    let node = HttpNodeClient::new(&config.rpc)?;
    tracing::info!(
        database = %config.database.path,
        rpc = %config.rpc.url,
        "Starting blockex"
    );

    let explorer = Arc::new(Explorer::new(Arc::new(store), Arc::new(node)));

    let ip: IpAddr = config.api.bind.parse()?;
    let port = cli.port.unwrap_or(config.api.port);
    run_api_server(explorer, SocketAddr::new(ip, port)).await
}
