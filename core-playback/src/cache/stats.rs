//! Cache statistics

use serde::{Deserialize, Serialize};

/// Approximate size charged per cached track, in megabytes.
///
/// Cached remote tracks are never stored by the core, so their footprint is
/// a flat estimate rather than a measurement.
pub const PER_TRACK_ESTIMATE_MB: u64 = 5;

/// Point-in-time view of cache usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries in the cached set
    pub cached_tracks: usize,

    /// `cached_tracks * PER_TRACK_ESTIMATE_MB`
    pub approx_cache_mb: u64,

    /// Imported local tracks
    pub local_tracks: usize,

    /// Exact byte total of local tracks
    pub local_bytes: u64,

    /// Budget from the settings, in megabytes
    pub max_size_mb: f64,

    /// Unix epoch milliseconds when the stats were taken
    pub calculated_at: i64,
}

impl CacheStats {
    /// Approximate cache plus exact local storage, in megabytes.
    pub fn total_mb(&self) -> f64 {
        self.approx_cache_mb as f64 + self.local_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Usage as a percentage of the budget.
    pub fn usage_percentage(&self) -> f64 {
        if self.max_size_mb <= 0.0 {
            return 0.0;
        }

        (self.total_mb() / self.max_size_mb) * 100.0
    }

    /// Returns true if usage is above 90% of the budget.
    pub fn is_near_capacity(&self) -> bool {
        self.usage_percentage() > 90.0
    }

    /// Returns true if usage exceeds the budget.
    pub fn is_over_budget(&self) -> bool {
        self.total_mb() > self.max_size_mb
    }

    /// Human-readable local storage size.
    pub fn local_size_string(&self) -> String {
        format_bytes(self.local_bytes)
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
    fn test_usage_percentage() {
        let stats = CacheStats {
            cached_tracks: 100,
            approx_cache_mb: 500,
            local_tracks: 2,
            local_bytes: 12 * 1024 * 1024,
            max_size_mb: 1024.0,
            calculated_at: 0,
        };

        assert_eq!(stats.total_mb(), 512.0);
        assert_eq!(stats.usage_percentage(), 50.0);
        assert!(!stats.is_near_capacity());
        assert!(!stats.is_over_budget());
    }

    #[test]
    fn test_over_budget() {
        let stats = CacheStats {
            approx_cache_mb: 2100,
            max_size_mb: 2048.0,
            ..Default::default()
        };
        assert!(stats.is_near_capacity());
        assert!(stats.is_over_budget());

        let no_budget = CacheStats::default();
        assert_eq!(no_budget.usage_percentage(), 0.0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
