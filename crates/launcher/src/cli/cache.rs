//! The `launcher cache` command for the on-disk image cache.

use clap::{Args, Subcommand};
use launcher_core::{Config, HttpFetcher, ImageCache};
use std::sync::Arc;

use super::parse_size;

/// Arguments for the `cache` command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Which rendering of a hash to address.
#[derive(Args, Debug, Clone, Copy)]
pub struct VariantArgs {
    /// Requested size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size, conflicts_with = "cover")]
    pub size: Option<(u32, u32)>,

    /// Cover thumbnail variant
    #[arg(long)]
    pub cover: bool,
}

/// Subcommands for the image cache.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print the cache root, or the cache file for a hash
    Path {
        /// SHA-1 of the image
        hash: Option<String>,

        #[command(flatten)]
        variant: VariantArgs,
    },

    /// Download a hash into the cache if missing and print its path
    Fetch {
        /// SHA-1 of the image
        hash: String,

        #[command(flatten)]
        variant: VariantArgs,
    },
}

/// Execute the cache command.
pub async fn execute(args: CacheArgs, config: Config) -> anyhow::Result<()> {
    let cache = ImageCache::new(
        config.image_cache_dir(),
        &config.images,
        Arc::new(HttpFetcher::new()),
    );

    match args.command {
        CacheCommand::Path { hash: None, .. } => {
            println!("{}", cache.root().display());
        }

        CacheCommand::Path {
            hash: Some(hash),
            variant,
        } => {
            let variant = cache.variant_for(variant.size, variant.cover);
            let path = cache.cache_path(&hash, &variant)?;
            println!("{}", path.display());
        }

        CacheCommand::Fetch { hash, variant } => {
            let variant = cache.variant_for(variant.size, variant.cover);
            let path = cache.resolve(&hash, &variant).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
