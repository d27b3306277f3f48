// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `<config dir>/quick-scan/config.json`. Every field has
//! a default, so a missing file or a partial file is fine; a malformed file
//! is reported as `AppError::Config`.

use crate::backends::camera::{Orientation, SensorFacing, SensorInfo};
use crate::constants::{self, preview};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval between preview frames in milliseconds
    pub frame_interval_ms: u64,
    /// Device rotation in degrees (0, 90, 180, 270)
    pub device_rotation: i32,
    /// Sensor mount angle in degrees (0, 90, 180, 270)
    pub sensor_mount_angle: i32,
    /// Sensor facing
    pub sensor_facing: SensorFacing,
    /// Restart still-image sources after the last frame
    pub loop_frames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_interval_ms: preview::DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            device_rotation: 0,
            sensor_mount_angle: 0,
            sensor_facing: SensorFacing::default(), // Back camera
            loop_frames: true,
        }
    }
}

impl Config {
    /// Default config file path, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::APP_ID)
                .join(constants::config_file::FILE_NAME)
        })
    }

    /// Load from the default location
    ///
    /// Falls back to defaults when there is no config directory or no file.
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("invalid config '{}': {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Write to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Preview frame interval, never below the minimum
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms).max(preview::MIN_FRAME_INTERVAL)
    }

    /// Device rotation normalised to a quarter turn
    pub fn device_orientation(&self) -> Orientation {
        Orientation::from_degrees_int(self.device_rotation)
    }

    /// Sensor description used by still-image sources
    pub fn sensor_info(&self) -> SensorInfo {
        SensorInfo {
            mount_angle: Orientation::from_degrees_int(self.sensor_mount_angle),
            facing: self.sensor_facing,
        }
    }
}
