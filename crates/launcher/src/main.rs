//! Launcher CLI - drive the launcher's image loader and kickstart settings
//! from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Load covers through the image cache and write them out as PNG
//! launcher load sha1:3a1f... --cover --output ./covers
//!
//! # Where a cached variant lives
//! launcher cache path 3a1f... --size 752x572
//!
//! # Kickstart ROM selection
//! launcher kickstart show
//! launcher kickstart choose ~/roms/kick40068.A1200
//!
//! # View configuration
//! launcher config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Launcher - image cache and kickstart settings tools.
#[derive(Parser, Debug)]
#[command(name = "launcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load images through the background loader
    Load(cli::load::LoadArgs),

    /// Inspect and fill the on-disk image cache
    Cache(cli::cache::CacheArgs),

    /// Show or change the kickstart ROM selection
    Kickstart(cli::kickstart::KickstartArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match launcher_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `launcher config path`."
            );
            launcher_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Launcher v{}", launcher_core::VERSION);

    match cli.command {
        Commands::Load(args) => cli::load::execute(args, config).await,
        Commands::Cache(args) => cli::cache::execute(args, config).await,
        Commands::Kickstart(args) => cli::kickstart::execute(args, config),
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
