//! Wishlist CLI - Database migrations and reporting tools.
//!
//! # Usage
//!
//! ```bash
//! # Run wishlist and session migrations
//! wishlist-cli migrate
//!
//! # Count active wishlist items per variant
//! wishlist-cli counts variant_01 variant_02
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `counts` - Print wishlist counts per variant

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wishlist-cli")]
#[command(author, version, about = "Wishlist CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (wishlist tables and session store)
    Migrate,
    /// Print how many active wishlists contain each variant
    Counts {
        /// Product variant IDs
        #[arg(required = true)]
        variant_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Counts { variant_ids } => commands::counts::run(&variant_ids).await?,
    }
    Ok(())
}
