//! Command implementations behind the `gogarden` binary
//!
//! Each submodule owns one clap subcommand tree and an `execute` entry
//! point taking the loaded [`CommandContext`].

pub mod history;
pub mod image;
pub mod show;

pub use history::HistoryCommand;
pub use image::ImageCommand;
pub use show::ShowCommand;

use crate::config::AppConfig;
use crate::output::TextFormatter;
use crate::terminal;
use anyhow::{Context, Result};
use gogarden_core::{HttpDownloader, IdentificationHistory, ImageCacheManager, TokioFileStore};
use std::sync::Arc;

/// Loaded configuration plus the decisions derived from it
pub struct CommandContext {
    pub config: AppConfig,
    pub use_color: bool,
}

impl CommandContext {
    pub fn new(config: AppConfig) -> Self {
        let use_color = terminal::should_colorize(config.output.color_enabled);
        Self { config, use_color }
    }

    pub fn text(&self) -> TextFormatter {
        TextFormatter::new(self.use_color)
    }

    pub fn downloader(&self) -> Result<HttpDownloader> {
        HttpDownloader::with_config(self.config.network.downloader_config())
            .context("Failed to create HTTP client")
    }

    /// Cache manager over the configured directory and policy
    pub fn open_cache(&self, downloader: HttpDownloader) -> Result<ImageCacheManager> {
        let cache_dir = self.config.cache.resolved_directory();
        log::debug!("Opening image cache at {}", cache_dir.display());

        ImageCacheManager::new(
            cache_dir,
            self.config.cache.policy(),
            Arc::new(TokioFileStore::new()),
            Arc::new(downloader),
        )
        .context("Invalid cache configuration")
    }

    pub fn open_history(&self) -> IdentificationHistory {
        let path = self.config.history.resolved_path();
        log::debug!("Using identification history at {}", path.display());

        IdentificationHistory::new(Arc::new(TokioFileStore::new()), path)
            .with_capacity(self.config.history.max_entries)
    }
}
