//! Stockroom CLI
//!
//! Usage: stockroom [OPTIONS] <COMMAND>

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(version, about = "Track inventory items by location and status", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: <config dir>/stockroom/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    pub memory: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the location tree
    Locations,
    /// List items
    List {
        /// Only items with this location id at any level
        #[arg(long, conflicts_with = "search")]
        section: Option<String>,
        /// Name search; every word must match
        #[arg(long)]
        search: Option<String>,
        /// Only low-stock items
        #[arg(long)]
        low_stock: bool,
        /// Only items with an order placed
        #[arg(long)]
        ordered: bool,
    },
    /// Add an item
    Add {
        name: String,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Set or clear a status flag
    Status {
        id: String,
        /// lowStock or orderPlaced
        kind: String,
        /// Clear the flag instead of setting it
        #[arg(long)]
        off: bool,
    },
    /// Exchange an item's sales and storage locations
    Swap { id: String },
    /// Change an item's locations
    Move {
        id: String,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// Set an item's memo; omit the text to clear it
    Memo { id: String, text: Option<String> },
    /// Delete an item
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Print every snapshot as the inventory changes
    Watch,
    /// Seed data import
    Seed {
        #[command(subcommand)]
        cmd: SeedCommands,
    },
    /// Normalize legacy location documents
    Migrate,
    /// Add random test items
    Generate {
        count: usize,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the HTTP server
    Serve {
        /// Listen address (default from config or STOCKROOM_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SeedCommands {
    /// Convert a product CSV export to seed JSON
    Convert { csv: PathBuf, json: PathBuf },
    /// Upload seed JSON into the store
    Upload {
        json: PathBuf,
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

/// Location levels given on the command line.
#[derive(clap::Args, Debug, Default)]
pub struct LocationArgs {
    #[arg(long)]
    pub main: Option<String>,
    #[arg(long)]
    pub sub: Option<String>,
    #[arg(long = "final")]
    pub final_: Option<String>,
    #[arg(long)]
    pub storage_main: Option<String>,
    #[arg(long)]
    pub storage_sub: Option<String>,
    #[arg(long)]
    pub storage_final: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = commands::run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
