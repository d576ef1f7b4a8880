//! # Vapor Console
//!
//! Interactive command-line client for the Vapor game store.
//!
//! ## Usage
//!
//! ```bash
//! # Reads vapor.toml / vapor.local.toml / VAPOR_* from the environment
//! cargo run --bin vapor
//!
//! # Explicit configuration file
//! cargo run --bin vapor -- --config ./cli.toml
//! ```
//!
//! Then enter an action token (`help` lists them), `exit` to quit.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use vapor::backend::default_provider;
use vapor::console::{EditorPrompter, Session, SessionEnd};
use vapor::logging::init_tracing;
use vapor::{Catalog, Config, ConfigError, VaporError, VaporResult};

#[derive(Parser)]
#[command(name = "vapor")]
#[command(version)]
#[command(about = "Menu-driven client for the Vapor game store")]
struct Cli {
    /// Configuration file (TOML). Defaults to vapor.toml in the working directory.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(SessionEnd::Exited | SessionEnd::EndOfInput) => ExitCode::SUCCESS,
        Ok(SessionEnd::ConnectionLost) => ExitCode::FAILURE,
        Err(VaporError::Config(e @ ConfigError::Connect { .. })) => {
            println!("Database error occurred, exiting.");
            println!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> VaporResult<SessionEnd> {
    let config = Config::resolve(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let catalog = Catalog::game_store();
    catalog.verify()?;

    let provider = default_provider(&config.database)?;
    let connection = provider.connect().await?;
    let prompter = EditorPrompter::new(&catalog)?;

    let end = Session::new(&catalog, prompter, io::stdout(), connection)
        .run()
        .await?;
    Ok(end)
}
