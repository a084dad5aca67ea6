// Configuration management for the Beaconwatch CLI
//
// Cross-platform config stored in:
// - macOS: ~/.config/beaconwatch/config.json
// - Linux: ~/.config/beaconwatch/config.json
// - Windows: %APPDATA%\beaconwatch\config.json

use anyhow::{Context, Result};
use beaconwatch_core::{ScanConfig, ALTBEACON_LAYOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the region to range in
    pub region_name: String,

    /// Positional identifier filters; empty matches every beacon
    pub identifier_filters: Vec<String>,

    /// Duration of one scan cycle in milliseconds
    pub scan_period_ms: u64,

    /// Upper bound of the proximity indicator
    pub indicator_max: u32,

    /// Number of beacons the simulated engine advertises
    pub simulated_beacons: usize,
}

impl Default for Config {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            region_name: scan.region_name,
            identifier_filters: scan.identifier_filters,
            scan_period_ms: scan.scan_period_ms,
            indicator_max: scan.indicator_max,
            simulated_beacons: 2,
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("beaconwatch");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file()?;

        if config_file.exists() {
            Self::load_from(&config_file)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Build the controller configuration this file describes
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            region_name: self.region_name.clone(),
            identifier_filters: self.identifier_filters.clone(),
            beacon_layout: ALTBEACON_LAYOUT.to_string(),
            scan_period_ms: self.scan_period_ms,
            indicator_max: self.indicator_max,
        }
    }

    /// Set a config value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "region_name" => {
                if value.trim().is_empty() {
                    anyhow::bail!("region_name must not be empty");
                }
                self.region_name = value.to_string();
            }
            "identifier_filters" => {
                self.identifier_filters = if value.is_empty() {
                    Vec::new()
                } else {
                    value.split(',').map(|s| s.trim().to_string()).collect()
                };
            }
            "scan_period_ms" => {
                self.scan_period_ms = value.parse().context("Invalid number")?;
            }
            "indicator_max" => {
                self.indicator_max = value.parse().context("Invalid number")?;
            }
            "simulated_beacons" => {
                self.simulated_beacons = value.parse().context("Invalid number")?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        self.save()?;
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "region_name" => Some(self.region_name.clone()),
            "identifier_filters" => Some(self.identifier_filters.join(",")),
            "scan_period_ms" => Some(self.scan_period_ms.to_string()),
            "indicator_max" => Some(self.indicator_max.to_string()),
            "simulated_beacons" => Some(self.simulated_beacons.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("region_name".to_string(), self.region_name.clone()),
            (
                "identifier_filters".to_string(),
                if self.identifier_filters.is_empty() {
                    "(match all)".to_string()
                } else {
                    self.identifier_filters.join(",")
                },
            ),
            (
                "scan_period_ms".to_string(),
                format!("{}ms", self.scan_period_ms),
            ),
            ("indicator_max".to_string(), self.indicator_max.to_string()),
            (
                "simulated_beacons".to_string(),
                self.simulated_beacons.to_string(),
            ),
        ]
    }
}
