use crate::paths;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gogarden_core::history::DEFAULT_HISTORY_CAPACITY;
use gogarden_core::image_cache::policy::{
    DEFAULT_MAX_CACHE_AGE, DEFAULT_MAX_CACHE_SIZE, DEFAULT_PRELOAD_THROTTLE,
};
use gogarden_core::providers::http::DEFAULT_USER_AGENT;
use gogarden_core::{CachePolicy, HttpDownloaderConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Keys accepted by `config set`
pub const KNOWN_KEYS: &[&str] = &[
    "cache.directory",
    "cache.max_age_days",
    "cache.max_size_mb",
    "cache.preload_throttle_ms",
    "network.timeout_seconds",
    "network.user_agent",
    "history.path",
    "history.max_entries",
    "output.color_enabled",
];

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CacheConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub max_age_days: u64,
    pub max_size_mb: u64,
    pub preload_throttle_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NetworkConfig {
    /// Zero leaves the transport default in place
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct HistoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_entries: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub color_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_age_days: DEFAULT_MAX_CACHE_AGE.as_secs() / SECONDS_PER_DAY,
            max_size_mb: DEFAULT_MAX_CACHE_SIZE / BYTES_PER_MB,
            preload_throttle_ms: DEFAULT_PRELOAD_THROTTLE.as_millis() as u64,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_entries: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Configured cache directory, or the platform default
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(paths::get_cache_dir)
    }

    pub fn policy(&self) -> CachePolicy {
        CachePolicy::default()
            .with_max_age(Duration::from_secs(
                self.max_age_days.saturating_mul(SECONDS_PER_DAY),
            ))
            .with_max_size_bytes(self.max_size_mb.saturating_mul(BYTES_PER_MB))
            .with_preload_throttle(Duration::from_millis(self.preload_throttle_ms))
    }
}

impl NetworkConfig {
    pub fn downloader_config(&self) -> HttpDownloaderConfig {
        HttpDownloaderConfig {
            timeout: (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds)),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl HistoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(paths::get_history_path)
    }
}

/// Configuration manager that handles XDG-compliant paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    fn default_config_path() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("gogarden/config.toml");
        }

        paths::get_config_path()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment = figment.merge(Env::prefixed("GOGARDEN_").split("__"));

        figment.extract().context("Failed to load configuration")
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        let value: toml::Value = toml::from_str(&toml_string)?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{key}' not set"))?;
                }
                _ => anyhow::bail!("Invalid key path: {key}"),
            }
        }

        match current {
            toml::Value::String(s) => Ok(s.clone()),
            toml::Value::Integer(i) => Ok(i.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            _ => anyhow::bail!("Value at '{key}' is not a simple type"),
        }
    }

    /// Set a configuration value by key (dot notation)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.validate_config_value(key, value)?;
        let parsed_value = self.parse_config_value(key, value)?;

        let mut config = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let Some((section, field)) = key.split_once('.') else {
            anyhow::bail!("Invalid key path: {key}");
        };

        let toml::Value::Table(root) = &mut config else {
            anyhow::bail!("Configuration file is not a table");
        };
        let section_value = root
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        let toml::Value::Table(section_table) = section_value else {
            anyhow::bail!("Invalid key path: expected table at '{section}'");
        };
        section_table.insert(field.to_string(), parsed_value);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&self.config_path, toml_string)?;

        Ok(())
    }

    /// List all effective configuration values, sorted by key
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        let value: toml::Value = toml::from_str(&toml_string)?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            toml::Value::String(s) => items.push((prefix, s.clone())),
            toml::Value::Integer(i) => items.push((prefix, i.to_string())),
            toml::Value::Float(f) => items.push((prefix, f.to_string())),
            toml::Value::Boolean(b) => items.push((prefix, b.to_string())),
            _ => {}
        }
    }

    fn validate_config_value(&self, key: &str, value: &str) -> Result<()> {
        match key {
            "cache.max_age_days" | "cache.max_size_mb" => {
                let number: u64 = value
                    .parse()
                    .with_context(|| format!("{key} must be a positive integer"))?;
                if number == 0 {
                    anyhow::bail!("{key} must be greater than 0");
                }
            }
            "history.max_entries" => {
                let entries: usize = value
                    .parse()
                    .context("max_entries must be a positive integer")?;
                if entries == 0 {
                    anyhow::bail!("max_entries must be greater than 0");
                }
            }
            "cache.preload_throttle_ms" | "network.timeout_seconds" => {
                let _: u64 = value
                    .parse()
                    .with_context(|| format!("{key} must be a non-negative integer"))?;
            }
            "network.user_agent" => {
                if value.trim().is_empty() {
                    anyhow::bail!("user_agent must not be empty");
                }
            }
            "cache.directory" | "history.path" => {
                if value.trim().is_empty() {
                    anyhow::bail!("{key} must not be empty");
                }
            }
            "output.color_enabled" => {
                let _: bool = value.parse().context("Value must be 'true' or 'false'")?;
            }
            _ => anyhow::bail!(
                "Unknown configuration key '{key}'. Known keys: {}",
                KNOWN_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    fn parse_config_value(&self, key: &str, value: &str) -> Result<toml::Value> {
        match key {
            k if k.ends_with("_days")
                || k.ends_with("_mb")
                || k.ends_with("_ms")
                || k.ends_with("_seconds")
                || k.ends_with("_entries") =>
            {
                let num: i64 = value.parse().context("Expected integer value")?;
                Ok(toml::Value::Integer(num))
            }
            k if k.ends_with("_enabled") => {
                let bool_val: bool = value
                    .parse()
                    .context("Expected boolean value (true/false)")?;
                Ok(toml::Value::Boolean(bool_val))
            }
            _ => Ok(toml::Value::String(value.to_string())),
        }
    }
}

/// Load the configuration from the default location
pub fn get_config() -> Result<AppConfig> {
    ConfigManager::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_core_policy() {
        let config = AppConfig::default();
        assert_eq!(config.cache.max_age_days, 7);
        assert_eq!(config.cache.max_size_mb, 50);
        assert_eq!(config.cache.preload_throttle_ms, 100);
        assert_eq!(config.cache.policy(), CachePolicy::default());
        assert_eq!(config.history.max_entries, 50);
        assert!(config.network.downloader_config().timeout.is_none());
    }

    #[test]
    fn test_set_then_load_round_trips_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        manager.set("cache.max_size_mb", "10").unwrap();
        manager.set("cache.directory", "/tmp/plants").unwrap();
        manager.set("output.color_enabled", "false").unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.cache.max_size_mb, 10);
        assert_eq!(config.cache.policy().max_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cache.resolved_directory(), PathBuf::from("/tmp/plants"));
        assert!(!config.output.color_enabled);
        assert_eq!(manager.get("cache.max_size_mb").unwrap(), "10");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        assert!(manager.set("cache.max_age_days", "0").is_err());
        assert!(manager.set("cache.max_size_mb", "lots").is_err());
        assert!(manager.set("output.color_enabled", "maybe").is_err());
        assert!(manager.set("network.user_agent", "  ").is_err());
        assert!(manager.set("cache.bogus", "1").is_err());
        assert!(!temp_dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_unset_optional_key_reports_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        let err = manager.get("history.path").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_list_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        let items = manager.list().unwrap();
        let keys: Vec<_> = items.iter().map(|(k, _)| k.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(keys.contains(&"cache.max_age_days".to_string()));
    }
}
