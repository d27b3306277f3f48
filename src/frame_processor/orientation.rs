// SPDX-License-Identifier: GPL-3.0-only

//! Orientation correction for preview frames
//!
//! Rotated sensors deliver frames whose luma plane must be transposed before
//! the reader sees the barcode upright. The transposition is done in place
//! on the frame buffer; only the luma plane is touched.
//!
//! Two behaviours are kept exactly as shipped scanners expect them:
//! - 180° frames pass through without a flip.
//! - 270° frames are transposed like 90° frames, but the crop window and
//!   plane dimensions are *not* remapped.

use crate::backends::camera::Orientation;
use crate::errors::DecodeError;
use crate::frame_processor::types::{LuminanceImage, Region};
use tracing::trace;

/// Transpose a `width` x `height` luma plane in place
///
/// Afterwards the first `width * height` bytes hold a `height` x `width`
/// plane whose row `c` is column `c` of the input. Applying it again with
/// the dimensions swapped restores the input.
///
/// Uses cycle following modulo `length - 1`: index 0 and the last index are
/// fixed points, every other element is swapped into place once.
/// O(length) time, O(1) extra space.
pub fn rotate90(data: &mut [u8], width: usize, height: usize) {
    let length = width * height;
    if length < 2 {
        return;
    }
    debug_assert!(data.len() >= length, "buffer shorter than luma plane");

    let modulus = length - 1;
    for i in 0..=length - 2 {
        let mut k = (i * height) % modulus;
        while k > i {
            k = (height * k) % modulus;
        }
        if k != i {
            data.swap(k, i);
        }
    }
}

/// Build an orientation-corrected luminance view of a frame
///
/// `data` is the frame buffer (luma plane first), `width` x `height` the
/// frame dimensions as captured, `region` the sensor-space crop.
pub fn correct<'a>(
    data: &'a mut [u8],
    width: u32,
    height: u32,
    region: Region,
    orientation: Orientation,
) -> Result<LuminanceImage<'a>, DecodeError> {
    let width = width as usize;
    let height = height as usize;

    if region.is_degenerate() {
        return Err(DecodeError::GeometryDegenerate(format!(
            "region {} has no area",
            region
        )));
    }
    if data.len() < width * height {
        return Err(DecodeError::GeometryDegenerate(format!(
            "{} bytes is short for a {}x{} frame",
            data.len(),
            width,
            height
        )));
    }

    let (left, top) = (region.left as usize, region.top as usize);
    let (crop_width, crop_height) = (region.width() as usize, region.height() as usize);

    match orientation {
        Orientation::Deg0 | Orientation::Deg180 => {
            LuminanceImage::new(data, width, height, left, top, crop_width, crop_height)
        }
        Orientation::Deg90 => {
            rotate90(data, width, height);
            trace!(width, height, "Transposed frame for 90°");
            LuminanceImage::new(data, height, width, top, left, crop_height, crop_width)
        }
        Orientation::Deg270 => {
            rotate90(data, width, height);
            trace!(width, height, "Transposed frame for 270°");
            LuminanceImage::new(data, width, height, left, top, crop_width, crop_height)
        }
    }
}
