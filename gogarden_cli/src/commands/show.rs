//! `gogarden show`: resolve a plant's images with fallback

use super::CommandContext;
use crate::output::{JsonFormatter, OutputFormat};
use anyhow::Result;
use clap::Args;
use gogarden_core::{DecodingLoader, FallbackController, ImageSubject, Season, TokioFileStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SeasonArg {
    Cool,
    Warm,
}

impl From<SeasonArg> for Season {
    fn from(arg: SeasonArg) -> Self {
        match arg {
            SeasonArg::Cool => Season::Cool,
            SeasonArg::Warm => Season::Warm,
        }
    }
}

/// Try each candidate image in order until one decodes
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Plant name shown on the placeholder
    #[arg(short, long)]
    pub name: String,

    /// Growing season, picks the placeholder glyph
    #[arg(short, long, value_enum, default_value = "warm")]
    pub season: SeasonArg,

    /// Candidate image URLs in priority order
    pub urls: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub async fn execute(context: &CommandContext, command: ShowCommand) -> Result<()> {
    let downloader = context.downloader()?;
    let loader = DecodingLoader::new(Arc::new(TokioFileStore::new()), downloader.client().clone());
    let cache = context.open_cache(downloader)?;
    cache.initialize().await;

    let subject = ImageSubject::new(command.name, command.season.into(), command.urls);
    let mut controller = FallbackController::new(subject);
    let resolution = controller.resolve(&cache, &loader).await;
    log::debug!("Tried candidates {:?}", controller.attempts());

    match command.format {
        OutputFormat::Text => print!("{}", context.text().resolution(&resolution)),
        OutputFormat::Json => println!("{}", JsonFormatter::new(true).resolution(&resolution)?),
    }

    // Remote candidates were queued for caching; let them land before exit
    cache.wait_for_preloads().await;
    Ok(())
}
