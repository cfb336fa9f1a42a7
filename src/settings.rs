//! Runtime settings
//!
//! Timing knobs and calibration, kept separate from the level table.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_PERIOD, MIN_PERIOD};
use crate::error::ConfigError;

/// Rotor and scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Phase lock ===
    /// Assumed rotation period before the first measurement (µs)
    pub nominal_period: u32,
    /// Shortest accepted hall period (µs)
    pub min_period: u32,
    /// Longest accepted hall period (µs)
    pub max_period: u32,
    /// Error fraction folded into the period per revolution (1/n)
    pub drift_settling: i32,
    /// Per-revolution correction clamp (subdegrees)
    pub max_drift_speed: i32,
    /// Offset between the ship LED and the strip (subdegrees)
    pub ship_calibration: i32,
    /// Start in calibration mode
    pub calibrating: bool,

    // === Scheduling ===
    /// Game task cadence (µs)
    pub game_tick: u32,
    /// Telemetry cadence (µs), 0 disables
    pub telemetry_interval: u32,

    // === Game ===
    pub seed: u64,
    pub start_level: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nominal_period: 40_000,
            min_period: MIN_PERIOD,
            max_period: MAX_PERIOD,
            drift_settling: 4,
            max_drift_speed: 512,
            ship_calibration: 0,
            calibrating: false,

            game_tick: 1_000,
            telemetry_interval: 1_000_000,

            seed: 0x5EED,
            start_level: 0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the phase-lock tuning. Anything rejected here would leave the
    /// clock without a usable period estimate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_period == 0 || self.min_period > self.max_period {
            return Err(ConfigError::PeriodWindow {
                min: self.min_period,
                max: self.max_period,
            });
        }
        if !(self.min_period..=self.max_period).contains(&self.nominal_period) {
            return Err(ConfigError::NominalPeriod {
                nominal: self.nominal_period,
                min: self.min_period,
                max: self.max_period,
            });
        }
        if self.drift_settling < 1 {
            return Err(ConfigError::DriftSettling(self.drift_settling));
        }
        Ok(())
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring invalid settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
