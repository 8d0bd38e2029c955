/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Configuration file
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./forum-store.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

// Forum query defaults
pub const DEFAULT_IGNORE_MOVED_TOPICS: bool = false;
pub const DEFAULT_TOPICS_PER_PAGE: u64 = 15;

// Query cache defaults
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;
