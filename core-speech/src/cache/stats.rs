//! Cache statistics and monitoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about the audio cache. Pure read; computing them has no side
/// effects on the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Number of cached artifacts
    pub item_count: usize,

    /// Total bytes used by cached artifacts
    pub total_bytes: u64,

    /// Configured maximum cache size in bytes
    pub max_bytes: u64,

    /// Creation time of the oldest entry
    pub oldest_created_at: Option<DateTime<Utc>>,

    /// Creation time of the newest entry
    pub newest_created_at: Option<DateTime<Utc>>,
}

impl CacheStatistics {
    /// Cache usage as a fraction of the configured cap.
    pub fn usage_fraction(&self) -> f64 {
        if self.max_bytes == 0 {
            return 0.0;
        }
        self.total_bytes as f64 / self.max_bytes as f64
    }

    /// Returns `true` if the cache exceeds its configured cap.
    pub fn is_over_capacity(&self) -> bool {
        self.total_bytes > self.max_bytes
    }

    /// Human-readable usage string for the storage settings screen.
    pub fn usage_string(&self) -> String {
        format!(
            "{} / {}",
            format_bytes(self.total_bytes),
            format_bytes(self.max_bytes)
        )
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_fraction() {
        let stats = CacheStatistics {
            item_count: 10,
            total_bytes: 50 * 1024 * 1024,
            max_bytes: 100 * 1024 * 1024,
            oldest_created_at: None,
            newest_created_at: None,
        };

        assert_eq!(stats.usage_fraction(), 0.5);
        assert!(!stats.is_over_capacity());

        let over = CacheStatistics {
            total_bytes: 120,
            max_bytes: 100,
            ..Default::default()
        };
        assert!(over.is_over_capacity());
        assert!(over.usage_fraction() > 1.0);
    }

    #[test]
    fn test_zero_capacity_is_not_divided() {
        let stats = CacheStatistics::default();
        assert_eq!(stats.usage_fraction(), 0.0);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.0 GB");
    }
}
