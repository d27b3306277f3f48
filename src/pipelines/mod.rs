// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │   Scan Pipeline   │ ──▶ │   Payload    │
//! │   (NV21)     │     │  - Orientation    │     │  (consumer)  │
//! │              │     │  - Region crop    │     │              │
//! │              │     │  - Decode / retry │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`scan`]: Live barcode scan loop with one frame in flight

pub mod scan;

pub use scan::{ScanHandle, ScanPipeline, ScanSummary};
