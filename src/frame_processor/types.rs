// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing
//!
//! These types carry a frame from the camera through the orientation
//! corrector and the barcode reader, and carry the result back to the
//! coordinator.

use crate::errors::DecodeError;

/// An axis-aligned rectangle in pixel coordinates
///
/// Used for the region of readability in both sensor space and UI space.
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Region {
    /// Create a region from its edges
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Check if the region has no area
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}] ({}x{})",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A symbol was decoded; carries its text payload
    Success(String),
    /// Nothing decodable in this frame
    Failure,
}

impl DecodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success(_))
    }
}

/// Grayscale view of a frame restricted to a region
///
/// Borrows the luma plane of a frame. `data_width` x `data_height` describe
/// the plane as laid out in memory (after any in-place transposition), and
/// the crop window is `left, top, width, height` within it.
#[derive(Debug, Clone, Copy)]
pub struct LuminanceImage<'a> {
    data: &'a [u8],
    data_width: usize,
    data_height: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

impl<'a> LuminanceImage<'a> {
    /// Create a cropped luminance view
    ///
    /// Fails with `GeometryDegenerate` for an empty crop, a crop that does
    /// not fit inside the plane, or data shorter than the plane.
    pub fn new(
        data: &'a [u8],
        data_width: usize,
        data_height: usize,
        left: usize,
        top: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::GeometryDegenerate(format!(
                "empty crop {}x{}",
                width, height
            )));
        }
        if left + width > data_width || top + height > data_height {
            return Err(DecodeError::GeometryDegenerate(format!(
                "crop {}x{} at ({}, {}) exceeds {}x{} image",
                width, height, left, top, data_width, data_height
            )));
        }
        if data.len() < data_width * data_height {
            return Err(DecodeError::GeometryDegenerate(format!(
                "{} bytes is short for a {}x{} luma plane",
                data.len(),
                data_width,
                data_height
            )));
        }

        Ok(Self {
            data,
            data_width,
            data_height,
            left,
            top,
            width,
            height,
        })
    }

    /// Crop width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Crop height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions of the underlying plane
    pub fn data_dimensions(&self) -> (usize, usize) {
        (self.data_width, self.data_height)
    }

    /// Crop origin within the underlying plane
    pub fn offset(&self) -> (usize, usize) {
        (self.left, self.top)
    }

    /// Luma sample at crop coordinates
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        self.data[(self.top + y) * self.data_width + self.left + x]
    }

    /// One row of the crop
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = (self.top + y) * self.data_width + self.left;
        &self.data[start..start + self.width]
    }

    /// Copy the crop into a tightly packed buffer
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_extent() {
        let region = Region::new(200, 400, 800, 1600);
        assert_eq!(region.width(), 600);
        assert_eq!(region.height(), 1200);
        assert!(!region.is_degenerate());
        assert!(Region::new(3, 3, 3, 10).is_degenerate());
    }

    #[test]
    fn test_luminance_crop() {
        // 4x3 plane with values equal to their index
        let data: Vec<u8> = (0..12).collect();
        let image = LuminanceImage::new(&data, 4, 3, 1, 1, 2, 2).unwrap();

        assert_eq!(image.luma(0, 0), 5);
        assert_eq!(image.luma(1, 1), 10);
        assert_eq!(image.row(1), &[9, 10]);
        assert_eq!(image.to_vec(), vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_luminance_rejects_bad_geometry() {
        let data = vec![0u8; 12];
        assert!(matches!(
            LuminanceImage::new(&data, 4, 3, 0, 0, 0, 2),
            Err(DecodeError::GeometryDegenerate(_))
        ));
        assert!(matches!(
            LuminanceImage::new(&data, 4, 3, 3, 0, 2, 2),
            Err(DecodeError::GeometryDegenerate(_))
        ));
        assert!(matches!(
            LuminanceImage::new(&data, 4, 4, 0, 0, 2, 2),
            Err(DecodeError::GeometryDegenerate(_))
        ));
    }
}
