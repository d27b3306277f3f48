// SPDX-License-Identifier: GPL-3.0-only

//! Region of readability geometry
//!
//! The reticle is a centered rectangle covering a fixed fraction of its
//! container. When the display is rotated by 90° or 270° one axis is
//! compressed so the long side of the reticle follows the device's visual
//! "up". Sensor planes are mounted rotated relative to the UI, which is why
//! the compressed axis differs between the two coordinate spaces.

use crate::backends::camera::Orientation;
use crate::constants::region::{BOUNDS_FRACTION, COMPRESSED_FRACTION};
use crate::frame_processor::types::Region;

/// Pixel space a region is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSpace {
    /// Camera preview pixels
    Sensor,
    /// On-screen container pixels
    Ui,
}

/// Compute the centered region of readability for a container
///
/// In UI space a rotated display compresses the height; in sensor space it
/// compresses the width. All bounds truncate toward zero.
pub fn compute_region(
    container_width: u32,
    container_height: u32,
    orientation: Orientation,
    space: CoordinateSpace,
) -> Region {
    let mut width_fraction = BOUNDS_FRACTION;
    let mut height_fraction = BOUNDS_FRACTION;
    if orientation.swaps_dimensions() {
        match space {
            CoordinateSpace::Ui => height_fraction = COMPRESSED_FRACTION,
            CoordinateSpace::Sensor => width_fraction = COMPRESSED_FRACTION,
        }
    }

    let container_width = f64::from(container_width);
    let container_height = f64::from(container_height);

    let width = (container_width * width_fraction) as u32;
    let height = (container_height * height_fraction) as u32;
    let left = (container_width * ((1.0 - width_fraction) / 2.0)) as u32;
    let top = (container_height * ((1.0 - height_fraction) / 2.0)) as u32;

    Region::new(left, top, left + width, top + height)
}
