// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! This module provides the trait-based hardware boundary for preview capture.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Scan Pipeline      │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    FrameSource      │  ← Lifecycle, locking, one-shot arming
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!      ┌────────────┐
//!      │ StillImage │  ← Concrete implementation
//!      └────────────┘
//! ```

pub mod frame_loop;
pub mod manager;
pub mod still_image;
pub mod types;

pub use manager::{CameraSession, FrameSource, SourceState};
pub use types::*;

/// Acquires capture devices
///
/// Acquisition is the only fallible step of the camera lifecycle that is
/// reported to callers; everything after it degrades to no-ops.
pub trait CameraProvider {
    /// Acquire exclusive access to a camera device
    ///
    /// # Returns
    /// * `Ok(handle)` - Device opened and ready for preview
    /// * `Err(BackendError::DeviceUnavailable)` - Device missing or in use
    fn acquire(&self) -> BackendResult<Box<dyn CameraBackend>>;
}

/// An acquired camera device
///
/// Implementations wrap a single hardware handle. Callers never use a handle
/// after `release()`; the `FrameSource` guarantees that by dropping it.
pub trait CameraBackend: Send {
    // ===== Configuration =====

    /// Current preview frame dimensions
    fn preview_size(&self) -> PreviewSize;

    /// Static sensor properties (mount angle and facing)
    fn sensor_info(&self) -> SensorInfo;

    /// Apply the display orientation to the preview pipeline
    fn set_display_orientation(&mut self, orientation: Orientation);

    /// Request a focus mode
    ///
    /// Backends that cannot honour the request return an error; callers
    /// treat this as non-fatal.
    fn set_focus_mode(&mut self, mode: FocusMode) -> BackendResult<()>;

    // ===== Streaming =====

    /// Start hardware preview streaming
    fn start_preview(&mut self);

    /// Stop hardware preview streaming
    fn stop_preview(&mut self);

    /// Register a callback for exactly one future frame
    ///
    /// A newer registration replaces a pending one. The callback may be
    /// invoked on any thread.
    fn set_one_shot_callback(&mut self, callback: FrameCallback);

    // ===== Lifecycle =====

    /// Release the hardware resource
    fn release(&mut self);
}
