// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for barcode scanning
//!
//! This module turns preview frames into decode outcomes: region of interest
//! geometry, orientation correction, the decode task, and the coordinator
//! that drives the one-frame-at-a-time scan loop.

pub mod coordinator;
pub mod geometry;
pub mod orientation;
pub mod tasks;
pub mod types;

pub use coordinator::{CoordinatorAction, DecodeCoordinator, DecodedCallback, ScanEvent};
pub use geometry::{CoordinateSpace, compute_region};
pub use tasks::decoder::{BarcodeReader, DecodePipeline, RqrrReader};
pub use types::{DecodeOutcome, LuminanceImage, Region};
