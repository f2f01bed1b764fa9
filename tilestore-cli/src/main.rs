//! TileStore CLI - cache maintenance commands.
//!
//! This binary provides command-line access to the tile cache for
//! operators: statistics, full clears, expiry sweeps, and manual
//! eviction passes.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tilestore::cache::CacheConfig;
use tilestore::config::parse_size;
use tilestore::logging;

mod commands;

#[derive(Parser)]
#[command(name = "tilestore")]
#[command(version = tilestore::VERSION)]
#[command(about = "Manage the on-disk raster tile cache", long_about = None)]
struct Cli {
    /// Cache directory (defaults to the platform cache directory)
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Cache size budget, e.g. "8GB" or "500MB"
    #[arg(long, default_value = "8GB", value_parser = parse_size)]
    max_size: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show cache statistics
    Stats,
    /// Delete every cached tile
    Clear,
    /// Delete tiles already past their TTL and prune empty directories
    Sweep,
    /// Evict oldest tiles if the cache is over its size budget
    Evict,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log output is flushed on exit
    let _logging = match logging::init_logging(logging::default_log_dir(), logging::default_log_file())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let directory = cli
        .directory
        .unwrap_or_else(|| CacheConfig::default().directory);

    let result = match cli.command {
        Command::Stats => commands::cache::stats(&directory, cli.max_size).await,
        Command::Clear => commands::cache::clear(&directory).await,
        Command::Sweep => commands::cache::sweep(&directory).await,
        Command::Evict => commands::cache::evict(&directory, cli.max_size).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
