//! `gogarden image` subcommands

use super::CommandContext;
use crate::output::{JsonFormatter, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use colored::*;
use gogarden_core::ImageUri;

#[derive(Debug, Subcommand)]
pub enum ImageCommand {
    /// Print the local file for a URL, or the URL itself while it downloads
    Resolve {
        /// Remote image URL
        url: String,

        /// Return immediately instead of waiting for the background download
        #[arg(long)]
        no_wait: bool,
    },

    /// Download an image into the cache and print its path
    Fetch {
        /// Remote image URL
        url: String,
    },

    /// Queue images for background download
    Preload {
        /// Remote image URLs; entries that are not http(s) are skipped
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show cache statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete expired files and trim the cache to its size budget
    Cleanup {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Forget the cached copy of one URL
    Invalidate {
        /// Remote image URL
        url: String,
    },

    /// Delete every cached image
    Clear,
}

pub async fn execute(context: &CommandContext, command: ImageCommand) -> Result<()> {
    let cache = context.open_cache(context.downloader()?)?;

    match command {
        ImageCommand::Resolve { url, no_wait } => {
            cache.initialize().await;
            let Some(uri) = cache.get_image_uri(&url).await else {
                anyhow::bail!("No image URL given");
            };
            println!("{uri}");

            if let ImageUri::Remote(_) = uri
                && !no_wait
            {
                cache.wait_for_preloads().await;
                match cache.is_cached(&url).await {
                    Some(path) => eprintln!("Cached for next time: {}", path.display()),
                    None => eprintln!("{}", "Download did not complete".yellow()),
                }
            }
        }
        ImageCommand::Fetch { url } => {
            cache.initialize().await;
            match cache.cache_image(&url).await {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("Failed to cache {url}"),
            }
        }
        ImageCommand::Preload { urls } => {
            cache.initialize().await;
            let queued = cache.preload_images(&urls).await;
            eprintln!("Queued {queued} of {} images", urls.len());
            cache.wait_for_preloads().await;

            let mut cached = 0;
            for url in &urls {
                if cache.is_cached(url).await.is_some() {
                    cached += 1;
                }
            }
            println!("{cached}/{} images cached", urls.len());
        }
        ImageCommand::Stats { format } => {
            let stats = cache.get_cache_stats().await;
            match format {
                OutputFormat::Text => print!("{}", context.text().stats(&stats, cache.cache_dir())),
                OutputFormat::Json => {
                    println!("{}", JsonFormatter::new(true).stats(&stats, cache.cache_dir())?)
                }
            }
        }
        ImageCommand::Cleanup { format } => {
            let report = cache.cleanup_old_files().await;
            match format {
                OutputFormat::Text => print!("{}", context.text().cleanup(&report)),
                OutputFormat::Json => println!("{}", JsonFormatter::new(true).cleanup(&report)?),
            }
        }
        ImageCommand::Invalidate { url } => {
            if cache.invalidate(&url).await {
                eprintln!("{}", format!("Removed cached copy of {url}").green());
            } else {
                eprintln!("{url} was not cached");
            }
        }
        ImageCommand::Clear => {
            if !cache.clear_cache().await {
                anyhow::bail!("Failed to clear {}", cache.cache_dir().display());
            }
            eprintln!(
                "{}",
                format!("Cleared {}", cache.cache_dir().display()).green()
            );
        }
    }

    Ok(())
}
