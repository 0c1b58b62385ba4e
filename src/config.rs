// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{
    COOL_DOWN, FRAME_CHANNEL_CAPACITY, REGION_OF_INTEREST_DELAY, REGION_OF_INTEREST_FRACTION,
    Symbology,
};
use crate::errors::{AppError, AppResult};
use crate::scanner::RegionOfInterest;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name under the user config directory
const CONFIG_DIR_NAME: &str = "barcode-scanner";
const CONFIG_FILE_NAME: &str = "config.json";

/// When the region of interest is pushed to the capture source
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionApply {
    /// Wait for the source to report that it is running
    #[default]
    OnReady,
    /// Wait a fixed delay after start, regardless of readiness
    FixedDelay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long an accepted scan stays displayed, in milliseconds
    pub cool_down_ms: u64,
    /// Side of the centered region of interest as a fraction of the frame
    pub region_of_interest_fraction: f64,
    /// Strategy for applying the region of interest after start
    pub region_of_interest_apply: RegionApply,
    /// Delay used by [`RegionApply::FixedDelay`], in milliseconds
    pub region_of_interest_delay_ms: u64,
    /// Code families requested from the capture source
    pub symbologies: Vec<Symbology>,
    /// Frames buffered between the capture source and the gate
    pub frame_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cool_down_ms: COOL_DOWN.as_millis() as u64,
            region_of_interest_fraction: REGION_OF_INTEREST_FRACTION,
            region_of_interest_apply: RegionApply::default(),
            region_of_interest_delay_ms: REGION_OF_INTEREST_DELAY.as_millis() as u64,
            symbologies: Symbology::ALL.to_vec(),
            frame_channel_capacity: FRAME_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/barcode-scanner/config.json` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("{}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded config");
        config.validated()
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject values no session can run with
    pub fn validated(self) -> AppResult<Self> {
        if self.cool_down_ms == 0 {
            return Err(AppError::Config("cool_down_ms must be greater than zero".into()));
        }
        if !(0.0..=1.0).contains(&self.region_of_interest_fraction) {
            return Err(AppError::Config(format!(
                "region_of_interest_fraction must be within 0..=1, got {}",
                self.region_of_interest_fraction
            )));
        }
        if self.symbologies.is_empty() {
            return Err(AppError::Config("symbologies must not be empty".into()));
        }
        if self.frame_channel_capacity == 0 {
            return Err(AppError::Config(
                "frame_channel_capacity must be greater than zero".into(),
            ));
        }
        Ok(self)
    }

    pub fn cool_down(&self) -> Duration {
        Duration::from_millis(self.cool_down_ms)
    }

    pub fn region_of_interest(&self) -> RegionOfInterest {
        RegionOfInterest::centered(self.region_of_interest_fraction)
    }

    pub fn region_of_interest_delay(&self) -> Duration {
        Duration::from_millis(self.region_of_interest_delay_ms)
    }
}
