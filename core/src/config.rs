//! Scan configuration.

use crate::engine::ALTBEACON_LAYOUT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("region name must not be empty")]
    EmptyRegionName,

    #[error("beacon layout must not be empty")]
    EmptyBeaconLayout,

    #[error("scan period must be positive, got {0} ms")]
    InvalidScanPeriod(u64),

    #[error("indicator max must be positive, got {0}")]
    InvalidIndicatorMax(u32),
}

/// Configuration for a detection controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Name of the region the controller ranges in.
    pub region_name: String,
    /// Identifier filters, positional. Empty means match every beacon.
    pub identifier_filters: Vec<String>,
    /// Advertisement parser layout handed to the engine.
    pub beacon_layout: String,
    /// Duration of one scan cycle in milliseconds.
    pub scan_period_ms: u64,
    /// Upper bound of the proximity indicator (one unit per millimeter).
    pub indicator_max: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            region_name: "all-beacons-region".to_string(),
            identifier_filters: Vec::new(),
            beacon_layout: ALTBEACON_LAYOUT.to_string(),
            scan_period_ms: 1000,
            indicator_max: 10_000,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_name.trim().is_empty() {
            return Err(ConfigError::EmptyRegionName);
        }
        if self.beacon_layout.trim().is_empty() {
            return Err(ConfigError::EmptyBeaconLayout);
        }
        if self.scan_period_ms == 0 {
            return Err(ConfigError::InvalidScanPeriod(self.scan_period_ms));
        }
        if self.indicator_max == 0 {
            return Err(ConfigError::InvalidIndicatorMax(self.indicator_max));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
