// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decode task
//!
//! This module turns one preview frame into a `DecodeOutcome`: it reads the
//! region of interest and orientation from the frame source, builds an
//! orientation-corrected luminance view, and hands it to a `BarcodeReader`.
//! The default reader uses the rqrr crate, which binarizes the view and
//! decodes QR symbols.

use crate::backends::camera::{CameraFrame, FrameSource};
use crate::errors::DecodeError;
use crate::frame_processor::orientation;
use crate::frame_processor::types::{DecodeOutcome, LuminanceImage};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, trace};

/// External symbol decoding capability
///
/// Readers may keep state between calls; `reset()` is called after every
/// attempt so each frame starts clean.
pub trait BarcodeReader: Send {
    /// Decode a symbol from a grayscale view
    ///
    /// # Returns
    /// * `Ok(text)` - Decoded payload
    /// * `Err(DecodeError::NotFound)` - No symbol in view
    /// * `Err(DecodeError::FrameUnreadable)` - Symbol found but not decodable
    fn decode(&mut self, image: &LuminanceImage<'_>) -> Result<String, DecodeError>;

    /// Clear internal state
    fn reset(&mut self);
}

/// QR code reader backed by rqrr
#[derive(Debug, Default)]
pub struct RqrrReader {
    /// Symbol candidates located by the last attempt
    candidates: usize,
}

impl RqrrReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of symbol candidates located since the last reset
    pub fn candidates(&self) -> usize {
        self.candidates
    }
}

impl BarcodeReader for RqrrReader {
    fn decode(&mut self, image: &LuminanceImage<'_>) -> Result<String, DecodeError> {
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(image.width(), image.height(), |x, y| {
                image.luma(x, y)
            });

        let grids = prepared.detect_grids();
        self.candidates = grids.len();
        if grids.is_empty() {
            return Err(DecodeError::NotFound);
        }

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    trace!(candidates = self.candidates, "QR symbol decoded");
                    return Ok(content);
                }
                Err(e) => last_error = Some(format!("{:?}", e)),
            }
        }

        Err(DecodeError::FrameUnreadable(
            last_error.unwrap_or_else(|| "no decodable grid".to_string()),
        ))
    }

    fn reset(&mut self) {
        self.candidates = 0;
    }
}

/// Decode pipeline
///
/// Shared between the coordinator and the blocking workers; the reader is
/// behind a mutex so attempts never interleave its state.
pub struct DecodePipeline<R> {
    source: FrameSource,
    reader: Mutex<R>,
}

impl<R: BarcodeReader> DecodePipeline<R> {
    /// Create a pipeline reading geometry from `source`
    pub fn new(source: FrameSource, reader: R) -> Self {
        Self {
            source,
            reader: Mutex::new(reader),
        }
    }

    /// Attempt to decode a single frame
    ///
    /// CPU-bound; run it off the coordinating task. The frame buffer is
    /// transformed in place and dropped afterwards.
    pub fn decode(&self, mut frame: CameraFrame) -> DecodeOutcome {
        let start = Instant::now();

        let Some((region, display_orientation)) = self.source.decode_geometry() else {
            debug!("No camera held, skipping frame");
            return DecodeOutcome::Failure;
        };

        let image = match orientation::correct(
            &mut frame.data,
            frame.width,
            frame.height,
            region,
            display_orientation,
        ) {
            Ok(image) => image,
            Err(e) => {
                debug!(error = %e, "Cannot build luminance image");
                return DecodeOutcome::Failure;
            }
        };

        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        let result = reader.decode(&image);
        reader.reset();
        drop(reader);

        let latency_ms = frame.captured_at.elapsed().as_millis();
        match result {
            Ok(payload) => {
                debug!(
                    decode_ms = start.elapsed().as_millis(),
                    latency_ms, "Decode success"
                );
                DecodeOutcome::Success(payload)
            }
            Err(e) => {
                trace!(
                    error = %e,
                    decode_ms = start.elapsed().as_millis(),
                    "Decode fail"
                );
                DecodeOutcome::Failure
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{
        BackendResult, CameraBackend, CameraProvider, FocusMode, FrameCallback, Orientation,
        PixelFormat, PreviewSize, SensorInfo,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticCamera {
        size: PreviewSize,
    }

    impl CameraBackend for StaticCamera {
        fn preview_size(&self) -> PreviewSize {
            self.size
        }
        fn sensor_info(&self) -> SensorInfo {
            SensorInfo::default()
        }
        fn set_display_orientation(&mut self, _orientation: Orientation) {}
        fn set_focus_mode(&mut self, _mode: FocusMode) -> BackendResult<()> {
            Ok(())
        }
        fn start_preview(&mut self) {}
        fn stop_preview(&mut self) {}
        fn set_one_shot_callback(&mut self, _callback: FrameCallback) {}
        fn release(&mut self) {}
    }

    struct StaticProvider(PreviewSize);

    impl CameraProvider for StaticProvider {
        fn acquire(&self) -> BackendResult<Box<dyn CameraBackend>> {
            Ok(Box::new(StaticCamera { size: self.0 }))
        }
    }

    /// Records the views it is given and answers from a script
    struct ScriptedReader {
        answer: Result<String, DecodeError>,
        seen: Arc<Mutex<Vec<(usize, usize)>>>,
        resets: Arc<AtomicUsize>,
    }

    impl BarcodeReader for ScriptedReader {
        fn decode(&mut self, image: &LuminanceImage<'_>) -> Result<String, DecodeError> {
            self.seen
                .lock()
                .unwrap()
                .push((image.width(), image.height()));
            self.answer.clone()
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn frame(width: u32, height: u32) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: vec![0; PixelFormat::NV21.buffer_len(width, height)],
            format: PixelFormat::NV21,
            captured_at: Instant::now(),
        }
    }

    fn pipeline(
        answer: Result<String, DecodeError>,
    ) -> (
        FrameSource,
        DecodePipeline<ScriptedReader>,
        Arc<Mutex<Vec<(usize, usize)>>>,
        Arc<AtomicUsize>,
    ) {
        let source = FrameSource::new();
        source
            .open(&StaticProvider(PreviewSize {
                width: 640,
                height: 480,
            }))
            .unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let resets = Arc::new(AtomicUsize::new(0));
        let reader = ScriptedReader {
            answer,
            seen: Arc::clone(&seen),
            resets: Arc::clone(&resets),
        };
        (source.clone(), DecodePipeline::new(source, reader), seen, resets)
    }

    #[test]
    fn test_success_maps_payload_and_resets() {
        let (_source, pipeline, seen, resets) = pipeline(Ok("hello".to_string()));

        let outcome = pipeline.decode(frame(640, 480));
        assert_eq!(outcome, DecodeOutcome::Success("hello".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec![(384, 288)]);
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_not_found_maps_to_failure_and_resets() {
        let (_source, pipeline, _seen, resets) = pipeline(Err(DecodeError::NotFound));

        assert_eq!(pipeline.decode(frame(640, 480)), DecodeOutcome::Failure);
        assert_eq!(pipeline.decode(frame(640, 480)), DecodeOutcome::Failure);
        assert_eq!(resets.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rotated_view_dimensions() {
        let (source, pipeline, seen, _resets) = pipeline(Err(DecodeError::NotFound));
        source.set_display_orientation(Orientation::Deg90);

        pipeline.decode(frame(640, 480));
        // Sensor region 192x288 is presented swapped after transposition
        assert_eq!(*seen.lock().unwrap(), vec![(288, 192)]);
    }

    #[test]
    fn test_released_camera_short_circuits() {
        let (source, pipeline, seen, resets) = pipeline(Ok("unused".to_string()));
        source.release();

        assert_eq!(pipeline.decode(frame(640, 480)), DecodeOutcome::Failure);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mismatched_frame_is_failure() {
        let (_source, pipeline, seen, _resets) = pipeline(Ok("unused".to_string()));

        // Region is computed for 640x480 and does not fit a 100x100 frame
        assert_eq!(pipeline.decode(frame(100, 100)), DecodeOutcome::Failure);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rqrr_reader_finds_nothing_in_flat_image() {
        let data = vec![200u8; 64 * 64];
        let image = LuminanceImage::new(&data, 64, 64, 0, 0, 64, 64).unwrap();
        let mut reader = RqrrReader::new();

        assert_eq!(reader.decode(&image), Err(DecodeError::NotFound));
        reader.reset();
        assert_eq!(reader.candidates(), 0);
    }
}
