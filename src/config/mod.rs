use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, AppResult};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
    /// Seconds to wait for a new connection before failing
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a pooled connection before failing
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Query behaviour of the forum repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    /// When set, topic listings leave out topics that were moved away from a forum
    #[serde(default = "default_ignore_moved_topics")]
    pub ignore_moved_topics: bool,
    #[serde(default = "default_topics_per_page")]
    pub topics_per_page: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_acquire_timeout_secs() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

fn default_ignore_moved_topics() -> bool {
    DEFAULT_IGNORE_MOVED_TOPICS
}

fn default_topics_per_page() -> u64 {
    DEFAULT_TOPICS_PER_PAGE
}

fn default_cache_enabled() -> bool {
    DEFAULT_CACHE_ENABLED
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
            connect_timeout_secs: default_connect_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            ignore_moved_topics: default_ignore_moved_topics(),
            topics_per_page: default_topics_per_page(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Load from the file named by `CONFIG_FILE`, or `config.toml`
    pub fn load() -> AppResult<Self> {
        let config_file = Self::config_path(std::env::var(CONFIG_FILE_ENV).ok());
        info!("Loading configuration from: {}", config_file);
        Self::load_from_file(&config_file)
    }

    fn config_path(from_env: Option<String>) -> String {
        from_env
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }

    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents).map_err(|e| {
                AppError::configuration(format!("Failed to parse {config_file}: {e}"))
            })
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config).map_err(|e| {
                AppError::configuration(format!("Failed to serialize default config: {e}"))
            })?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_prefers_environment() {
        assert_eq!(
            Config::config_path(Some("/etc/forum-store.toml".to_string())),
            "/etc/forum-store.toml"
        );
        assert_eq!(Config::config_path(None), DEFAULT_CONFIG_FILE);
        assert_eq!(Config::config_path(Some("  ".to_string())), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert!(!config.forum.ignore_moved_topics);
        assert!(path.exists());

        // Second load reads the file that was just written
        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.cache.capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[forum]\nignore_moved_topics = true\n\n[database]\nurl = \"sqlite::memory:\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(path.to_str().unwrap()).unwrap();
        assert!(config.forum.ignore_moved_topics);
        assert_eq!(config.forum.topics_per_page, DEFAULT_TOPICS_PER_PAGE);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[forum\nbroken").unwrap();

        let err = Config::load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
