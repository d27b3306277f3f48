// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Decode-related errors
    Decode(DecodeError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Camera could not be acquired; capture degrades to no-ops
    DeviceUnavailable(String),
    /// Operation on a released session
    ///
    /// The frame source absorbs this condition silently; the variant exists
    /// so hosts can report it when they choose to check.
    ResourceAlreadyReleased,
    /// Backend error
    BackendError(String),
}

/// Decode attempt errors
///
/// None of these reach the consumer; they all drive the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The reader located a symbol but could not decode it
    FrameUnreadable(String),
    /// No symbol in the region of interest
    NotFound,
    /// Region of interest has no extent or does not fit the frame
    GeometryDegenerate(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CameraError::ResourceAlreadyReleased => write!(f, "Camera already released"),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::FrameUnreadable(msg) => write!(f, "Frame unreadable: {}", msg),
            DecodeError::NotFound => write!(f, "No barcode found"),
            DecodeError::GeometryDegenerate(msg) => write!(f, "Degenerate region: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for DecodeError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceUnavailable(msg) => CameraError::DeviceUnavailable(msg),
            other => CameraError::BackendError(other.to_string()),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O and parse errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
