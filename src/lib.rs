// SPDX-License-Identifier: MPL-2.0

//! Quick Scan - live camera barcode scanning
//!
//! This library provides the frame-acquisition-to-decode pipeline of a
//! barcode scanner: one-shot frame arming, orientation correction, region of
//! readability geometry and the decode retry loop.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera hardware boundary and the frame source
//! - [`frame_processor`]: Geometry, orientation correction, decoding and
//!   the decode coordinator
//! - [`pipelines`]: The scan loop wiring everything together
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let source = FrameSource::new();
//! source.open(&provider)?;
//! source.compute_display_orientation(device_rotation);
//! source.start_preview();
//! let payload = ScanPipeline::new(source.clone(), RqrrReader::new()).run().await;
//! source.release();
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod pipelines;

// Re-export commonly used types
pub use backends::camera::{FrameSource, Orientation, SensorFacing, SensorInfo};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use frame_processor::{BarcodeReader, DecodeOutcome, Region, RqrrReader};
pub use pipelines::{ScanHandle, ScanPipeline, ScanSummary};
