//! Cache configuration and policies

use std::time::Duration;

/// Configuration for the audio cache manager.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum cache size in bytes (default: 100 MB)
    pub max_cache_size_bytes: u64,

    /// Fraction of the size cap eviction shrinks the cache to once the cap is
    /// exceeded (default: 0.8)
    pub eviction_watermark: f64,

    /// Entries not accessed for longer than this are expired at startup
    /// (default: 7 days)
    pub max_entry_age: Duration,

    /// Base directory for cache files (relative to the host cache dir)
    pub cache_directory: String,

    /// File name of the persisted index snapshot
    pub index_file_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size_bytes: 100 * 1024 * 1024, // 100 MB
            eviction_watermark: 0.8,
            max_entry_age: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            cache_directory: "voice_cache".to_string(),
            index_file_name: "index.json".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum cache size.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_cache_size_bytes = bytes;
        self
    }

    /// Set the eviction watermark fraction.
    pub fn with_eviction_watermark(mut self, watermark: f64) -> Self {
        self.eviction_watermark = watermark;
        self
    }

    /// Set the age after which unused entries expire.
    pub fn with_max_entry_age(mut self, age: Duration) -> Self {
        self.max_entry_age = age;
        self
    }

    /// Set cache directory name.
    pub fn with_cache_directory(mut self, dir: impl Into<String>) -> Self {
        self.cache_directory = dir.into();
        self
    }

    /// Set the index snapshot file name.
    pub fn with_index_file_name(mut self, name: impl Into<String>) -> Self {
        self.index_file_name = name.into();
        self
    }

    /// Byte total eviction shrinks the cache to.
    pub fn eviction_target_bytes(&self) -> u64 {
        (self.max_cache_size_bytes as f64 * self.eviction_watermark) as u64
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_cache_size_bytes == 0 {
            return Err("max_cache_size_bytes must be greater than 0".to_string());
        }

        if !(self.eviction_watermark > 0.0 && self.eviction_watermark <= 1.0) {
            return Err("eviction_watermark must be within (0.0, 1.0]".to_string());
        }

        if self.max_entry_age.is_zero() {
            return Err("max_entry_age must be greater than 0".to_string());
        }

        if self.cache_directory.is_empty() {
            return Err("cache_directory cannot be empty".to_string());
        }

        if self.index_file_name.is_empty() {
            return Err("index_file_name cannot be empty".to_string());
        }

        Ok(())
    }
}
