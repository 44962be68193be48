//! Centralized path management for the gogarden CLI
//!
//! Data, cache and configuration locations used across every command.

use gogarden_core::history::HISTORY_FILE_NAME;
use gogarden_core::image_cache::CACHE_DIR_NAME;
use std::path::PathBuf;

/// The name of the application directory used across all platforms
pub const APP_DATA_DIR: &str = "gogarden";

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the base data directory for the application
///
/// `~/.local/share/gogarden` on Linux, the platform data directory
/// elsewhere. Falls back to `.gogarden` in the current directory.
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DATA_DIR))
        .unwrap_or_else(|| PathBuf::from(".gogarden"))
}

/// Returns the directory holding cached plant images
///
/// Lives under the platform cache directory so the OS may reclaim it.
pub fn get_cache_dir() -> PathBuf {
    gogarden_core::default_cache_dir()
        .unwrap_or_else(|| PathBuf::from(".gogarden").join(CACHE_DIR_NAME))
}

/// Returns the path of the identification history file
pub fn get_history_path() -> PathBuf {
    get_data_dir().join(HISTORY_FILE_NAME)
}

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DATA_DIR))
        .unwrap_or_else(|| PathBuf::from(".gogarden"))
}

pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_ends_with_image_folder() {
        let cache_dir = get_cache_dir();
        assert!(cache_dir.ends_with(CACHE_DIR_NAME));
        assert!(cache_dir.to_string_lossy().contains(APP_DATA_DIR));
    }

    #[test]
    fn test_history_lives_in_data_dir() {
        let history = get_history_path();
        assert_eq!(history.parent(), Some(get_data_dir().as_path()));
        assert!(history.ends_with(HISTORY_FILE_NAME));
    }

    #[test]
    fn test_config_path_in_config_dir() {
        assert_eq!(get_config_path(), get_config_dir().join(CONFIG_FILE));
    }
}
