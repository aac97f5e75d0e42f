//! Cache settings and partial updates

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SIZE_GB: f64 = 2.0;
pub const DEFAULT_CLEAN_OLDER_THAN_DAYS: u32 = 30;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn default_max_size_gb() -> f64 {
    DEFAULT_MAX_SIZE_GB
}

fn default_auto_clean() -> bool {
    true
}

fn default_clean_older_than_days() -> u32 {
    DEFAULT_CLEAN_OLDER_THAN_DAYS
}

/// User-facing cache settings.
///
/// Changes take effect on the next size check or clean run. The budget is
/// advisory: nothing is evicted for size, only for age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    /// Budget in gigabytes (default: 2)
    #[serde(rename = "maxSizeGB", default = "default_max_size_gb")]
    pub max_size_gb: f64,

    /// Run age-based cleanup at startup (default: true)
    #[serde(default = "default_auto_clean")]
    pub auto_clean: bool,

    /// Only cache on unmetered networks. Advisory, the core never checks it.
    #[serde(default)]
    pub wifi_only: bool,

    /// Age threshold for cleanup (default: 30)
    #[serde(default = "default_clean_older_than_days")]
    pub clean_older_than_days: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size_gb: DEFAULT_MAX_SIZE_GB,
            auto_clean: true,
            wifi_only: false,
            clean_older_than_days: DEFAULT_CLEAN_OLDER_THAN_DAYS,
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size_gb(mut self, gb: f64) -> Self {
        self.max_size_gb = gb;
        self
    }

    pub fn with_auto_clean(mut self, enabled: bool) -> Self {
        self.auto_clean = enabled;
        self
    }

    pub fn with_wifi_only(mut self, enabled: bool) -> Self {
        self.wifi_only = enabled;
        self
    }

    pub fn with_clean_older_than_days(mut self, days: u32) -> Self {
        self.clean_older_than_days = days;
        self
    }

    /// Budget in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_gb * BYTES_PER_GB) as u64
    }

    /// Budget in megabytes.
    pub fn max_size_mb(&self) -> f64 {
        self.max_size_gb * 1024.0
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_size_gb.is_finite() && self.max_size_gb > 0.0) {
            return Err(format!(
                "maxSizeGB must be a positive number, got {}",
                self.max_size_gb
            ));
        }

        if self.clean_older_than_days == 0 {
            return Err("cleanOlderThanDays must be at least 1".to_string());
        }

        Ok(())
    }

    /// Apply the fields present in `update`.
    pub fn apply(&mut self, update: &CacheSettingsUpdate) {
        if let Some(gb) = update.max_size_gb {
            self.max_size_gb = gb;
        }
        if let Some(auto_clean) = update.auto_clean {
            self.auto_clean = auto_clean;
        }
        if let Some(wifi_only) = update.wifi_only {
            self.wifi_only = wifi_only;
        }
        if let Some(days) = update.clean_older_than_days {
            self.clean_older_than_days = days;
        }
    }
}

/// Partial settings change; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettingsUpdate {
    #[serde(rename = "maxSizeGB", default)]
    pub max_size_gb: Option<f64>,
    #[serde(default)]
    pub auto_clean: Option<bool>,
    #[serde(default)]
    pub wifi_only: Option<bool>,
    #[serde(default)]
    pub clean_older_than_days: Option<u32>,
}
