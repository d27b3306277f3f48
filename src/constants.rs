// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier, used for the config directory
pub const APP_ID: &str = "quick-scan";

/// Region of readability fractions
pub mod region {
    /// Fraction of the container covered along a primary axis
    pub const BOUNDS_FRACTION: f64 = 0.6;

    /// Fraction used for the compressed axis when the display is rotated
    /// by 90° or 270°
    pub const COMPRESSED_FRACTION: f64 = 0.3;
}

/// Preview streaming defaults
pub mod preview {
    use super::Duration;

    /// Default interval between preview frames (~30 fps)
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Lower bound for a configured frame interval
    pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

    /// Neutral chroma value for synthesized NV21 frames
    pub const NEUTRAL_CHROMA: u8 = 128;
}

/// Configuration file location
pub mod config_file {
    /// Config file name inside the application config directory
    pub const FILE_NAME: &str = "config.json";
}

/// Supported image formats for still-image sources
pub mod file_formats {
    /// Supported image file extensions (lowercase)
    pub const IMAGE_EXTENSIONS: &[&str] =
        &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tiff", "tif"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
    }
}
