// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Rotation in degrees (clockwise)
///
/// Used both for the device's current rotation relative to its natural
/// orientation and for the resulting display orientation of the preview.
/// Camera sensors on mobile devices are commonly mounted at 90° or 270°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// No rotation
    #[default]
    Deg0,
    /// 90 degrees clockwise
    Deg90,
    /// 180 degrees (upside down)
    Deg180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Deg270,
}

impl Orientation {
    /// All orientations in clockwise order
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    /// Create an orientation from an integer degree value (normalised to 0-360).
    ///
    /// Values that are not a multiple of 90 fall back to no rotation.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Orientation::Deg90,
            180 => Orientation::Deg180,
            270 => Orientation::Deg270,
            _ => Orientation::Deg0,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// Check if this orientation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Orientation::Deg90 | Orientation::Deg270)
    }

    /// Display orientation for a sensor given the current device rotation
    ///
    /// Back facing: `(mount - rotation + 360) % 360`.
    /// Front facing sensors are mirrored, so the sum is negated:
    /// `(360 - (mount + rotation) % 360) % 360`.
    pub fn for_display(device_rotation: Orientation, sensor: &SensorInfo) -> Self {
        let mount = sensor.mount_angle.degrees() as i32;
        let rotation = device_rotation.degrees() as i32;

        let degrees = match sensor.facing {
            SensorFacing::Front => (360 - (mount + rotation) % 360) % 360,
            SensorFacing::Back => (mount - rotation + 360) % 360,
        };

        Self::from_degrees_int(degrees)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Which side of the device the sensor faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFacing {
    /// Faces away from the user (main camera)
    #[default]
    Back,
    /// Faces the user (selfie camera); preview is mirrored
    Front,
}

impl std::fmt::Display for SensorFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorFacing::Back => write!(f, "back"),
            SensorFacing::Front => write!(f, "front"),
        }
    }
}

/// Static properties of a camera sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorInfo {
    /// Physical rotation of the sensor relative to the device's natural orientation
    pub mount_angle: Orientation,
    /// Sensor facing
    pub facing: SensorFacing,
}

/// Focus modes a backend may support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Fixed or manual focus
    Fixed,
    /// Continuous autofocus tuned for video (smooth, no hunting per frame)
    ContinuousVideo,
}

/// Preview frame dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for PreviewSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel format for preview frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// NV21 - Semi-planar 4:2:0 (Y plane + interleaved VU plane)
    /// Default preview format of mobile camera stacks
    NV21,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    NV12,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Total buffer size in bytes for a frame of the given dimensions
    pub fn buffer_len(&self, width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize;
        match self {
            Self::NV21 | Self::NV12 => {
                // Half resolution chroma, two bytes per sample pair
                let chroma = (width as usize).div_ceil(2) * (height as usize).div_ceil(2);
                luma + 2 * chroma
            }
            Self::Gray8 => luma,
        }
    }
}

/// A single preview frame from the camera
///
/// All supported formats start with a full resolution luma plane, so the
/// first `width * height` bytes of `data` are always the grayscale image.
/// The buffer is owned so the decode task can transform it in place.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Frame data: luma plane followed by any chroma planes
    pub data: Vec<u8>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Number of samples in the luma plane
    pub fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One-shot frame delivery callback
///
/// Backends hold at most one of these and invoke it for the next available
/// frame, after which it is gone until re-armed.
pub type FrameCallback = Box<dyn FnOnce(CameraFrame) + Send + 'static>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Camera could not be acquired (missing, busy, or permission denied)
    DeviceUnavailable(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(mount: i32, facing: SensorFacing) -> SensorInfo {
        SensorInfo {
            mount_angle: Orientation::from_degrees_int(mount),
            facing,
        }
    }

    #[test]
    fn test_from_degrees_normalises() {
        assert_eq!(Orientation::from_degrees_int(-90), Orientation::Deg270);
        assert_eq!(Orientation::from_degrees_int(450), Orientation::Deg90);
        assert_eq!(Orientation::from_degrees_int(45), Orientation::Deg0);
    }

    #[test]
    fn test_back_facing_display_orientation() {
        // Typical phone: sensor mounted at 90°, device upright
        let back = sensor(90, SensorFacing::Back);
        assert_eq!(Orientation::for_display(Orientation::Deg0, &back), Orientation::Deg90);
        assert_eq!(Orientation::for_display(Orientation::Deg90, &back), Orientation::Deg0);
        assert_eq!(Orientation::for_display(Orientation::Deg180, &back), Orientation::Deg270);
        assert_eq!(Orientation::for_display(Orientation::Deg270, &back), Orientation::Deg180);
    }

    #[test]
    fn test_front_facing_display_orientation_is_mirrored() {
        let front = sensor(270, SensorFacing::Front);
        // (360 - (270 + 0) % 360) % 360 = 90
        assert_eq!(Orientation::for_display(Orientation::Deg0, &front), Orientation::Deg90);
        // (360 - (270 + 90) % 360) % 360 = 0
        assert_eq!(Orientation::for_display(Orientation::Deg90, &front), Orientation::Deg0);
        // (360 - (270 + 180) % 360) % 360 = 270
        assert_eq!(Orientation::for_display(Orientation::Deg180, &front), Orientation::Deg270);
    }

    #[test]
    fn test_nv21_buffer_len() {
        assert_eq!(PixelFormat::NV21.buffer_len(4, 4), 24);
        assert_eq!(PixelFormat::NV21.buffer_len(3, 3), 9 + 8);
        assert_eq!(PixelFormat::Gray8.buffer_len(4, 3), 12);
    }
}
