//! Shrink Images gateway.
//!
//! ```text
//!     Client ──TLS──▶ request id / trace / timeout
//!                        │
//!                        ├─ /            → redirect to homepage (404 JSON elsewhere)
//!                        │
//!                        └─ /v1/ping, /v1/shrink
//!                              → recovery → user agent → API key → methods → legal headers
//!                              → shrink: params → (upload | fetcher) → optimizer → attachment
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use shrinkimages::lifecycle;
use shrinkimages::meta;
use shrinkimages::security::api_key::generate_api_key;

#[derive(Parser)]
#[command(name = "shrinkimages", version = meta::VERSION)]
#[command(about = "Image optimization gateway", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Start,
    /// Generate a new API key
    GenerateKey,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            if let Err(e) = lifecycle::start(&cli.config).await {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
        Commands::GenerateKey => println!("{}", generate_api_key(&mut rand::thread_rng())),
    }

    ExitCode::SUCCESS
}
