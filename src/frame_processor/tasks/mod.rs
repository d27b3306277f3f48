// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the decode task and its reader abstraction.

pub mod decoder;

pub use decoder::{BarcodeReader, DecodePipeline, RqrrReader};
