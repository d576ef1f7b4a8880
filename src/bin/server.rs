//! Vapor HTTP Server Binary
//!
//! Serves the action catalog as a JSON API for browser front ends.
//!
//! ## Usage
//!
//! ```bash
//! # Start server with settings from vapor.toml
//! cargo run --bin vapor-server
//!
//! # Override the bind address
//! cargo run --bin vapor-server -- --host 0.0.0.0 --port 9090
//! ```

use std::path::PathBuf;

use clap::Parser;

use vapor::backend::default_provider;
use vapor::logging::init_tracing;
use vapor::server::{start_http_server, AppState};
use vapor::{Catalog, Config};

#[derive(Parser)]
#[command(name = "vapor-server")]
#[command(version)]
#[command(about = "JSON API for the Vapor game store")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Bind host, overrides http.host
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides http.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    println!("Vapor Server");
    println!("============");
    println!();

    let mut config = Config::resolve(cli.config.as_deref())?;

    // Initialize tracing using config as fallback when env vars are not set
    init_tracing(&config.logging);

    if let Some(host) = cli.host {
        config.http.host = host;
    }
    if let Some(port) = cli.port {
        config.http.port = port;
    }

    let catalog = Catalog::game_store();
    catalog.verify()?;

    let provider = default_provider(&config.database)?;
    println!("Database: {}", config.database.address());
    println!("Actions:  {}", catalog.len());
    println!();

    let state = AppState::new(catalog, provider);
    start_http_server(state, &config.http).await
}
