// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera backend
//!
//! Streams a fixed set of images as NV21 preview frames. Images are decoded
//! with the `image` crate when the device is acquired, converted to a luma
//! plane and padded with neutral chroma. While previewing, a paced thread
//! hands the next frame to whichever one-shot callback is armed.
//!
//! ```text
//! acquire() ──► load + convert ──► [NV21 frames]
//!                                       │
//! start_preview() ──► CaptureLoopController tick
//!                          │
//!                          ├─ callback armed?  ──► fire with next frame
//!                          └─ nothing armed    ──► skip tick
//! ```

use super::frame_loop::{CaptureLoopController, LoopAction};
use super::types::{
    BackendError, BackendResult, CameraFrame, FocusMode, FrameCallback, Orientation, PixelFormat,
    PreviewSize, SensorInfo,
};
use super::{CameraBackend, CameraProvider};
use crate::constants::{file_formats, preview};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Where the provider gets its frames from
#[derive(Debug, Clone)]
enum FrameOrigin {
    /// Image files decoded on acquire
    Files(Vec<PathBuf>),
    /// Pre-rendered luma planes
    Luma {
        width: u32,
        height: u32,
        planes: Vec<Vec<u8>>,
    },
}

/// Provider for still-image cameras
#[derive(Debug, Clone)]
pub struct StillImageProvider {
    origin: FrameOrigin,
    interval: Duration,
    sensor: SensorInfo,
    loop_frames: bool,
}

impl StillImageProvider {
    /// Stream the given image files in order
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self::with_origin(FrameOrigin::Files(paths))
    }

    /// Stream pre-rendered grayscale planes of `width` x `height`
    pub fn from_luma_planes(width: u32, height: u32, planes: Vec<Vec<u8>>) -> Self {
        Self::with_origin(FrameOrigin::Luma {
            width,
            height,
            planes,
        })
    }

    fn with_origin(origin: FrameOrigin) -> Self {
        Self {
            origin,
            interval: preview::DEFAULT_FRAME_INTERVAL,
            sensor: SensorInfo::default(),
            loop_frames: true,
        }
    }

    /// Set the interval between preview frames
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(preview::MIN_FRAME_INTERVAL);
        self
    }

    /// Set the reported sensor mount angle and facing
    pub fn with_sensor(mut self, sensor: SensorInfo) -> Self {
        self.sensor = sensor;
        self
    }

    /// Restart from the first frame after the last one
    pub fn with_looping(mut self, loop_frames: bool) -> Self {
        self.loop_frames = loop_frames;
        self
    }

    fn load_frames(&self) -> BackendResult<(PreviewSize, Vec<Vec<u8>>)> {
        let (size, planes) = match &self.origin {
            FrameOrigin::Files(paths) => load_luma_planes(paths)?,
            FrameOrigin::Luma {
                width,
                height,
                planes,
            } => {
                let expected = *width as usize * *height as usize;
                if let Some(bad) = planes.iter().find(|p| p.len() != expected) {
                    return Err(BackendError::FormatNotSupported(format!(
                        "luma plane of {} bytes does not match {}x{}",
                        bad.len(),
                        width,
                        height
                    )));
                }
                let size = PreviewSize {
                    width: *width,
                    height: *height,
                };
                (size, planes.clone())
            }
        };

        if planes.is_empty() {
            return Err(BackendError::DeviceUnavailable(
                "no images to stream".to_string(),
            ));
        }

        let frames = planes
            .iter()
            .map(|plane| luma_to_nv21(plane, size.width, size.height))
            .collect();
        Ok((size, frames))
    }
}

impl CameraProvider for StillImageProvider {
    fn acquire(&self) -> BackendResult<Box<dyn CameraBackend>> {
        let (size, frames) = self.load_frames()?;
        info!(
            frames = frames.len(),
            size = %size,
            interval_ms = self.interval.as_millis(),
            "Still-image camera acquired"
        );

        Ok(Box::new(StillImageCamera {
            size,
            sensor: self.sensor,
            interval: self.interval,
            loop_frames: self.loop_frames,
            frames: Arc::new(frames),
            armed: Arc::new(Mutex::new(None)),
            next_index: Arc::new(Mutex::new(0)),
            preview: None,
        }))
    }
}

/// Load image files as equally sized luma planes
///
/// The first image fixes the preview size; later images are scaled to it.
fn load_luma_planes(paths: &[PathBuf]) -> BackendResult<(PreviewSize, Vec<Vec<u8>>)> {
    let mut size: Option<PreviewSize> = None;
    let mut planes = Vec::with_capacity(paths.len());

    for path in paths {
        let gray = load_luma_image(path)?;
        let target = *size.get_or_insert(PreviewSize {
            width: gray.width(),
            height: gray.height(),
        });

        let gray = if (gray.width(), gray.height()) != (target.width, target.height) {
            debug!(
                path = %path.display(),
                from = %format!("{}x{}", gray.width(), gray.height()),
                to = %target,
                "Scaling image to preview size"
            );
            image::imageops::resize(
                &gray,
                target.width,
                target.height,
                image::imageops::FilterType::Triangle,
            )
        } else {
            gray
        };
        planes.push(gray.into_raw());
    }

    let size = size.unwrap_or(PreviewSize {
        width: 0,
        height: 0,
    });
    Ok((size, planes))
}

fn load_luma_image(path: &Path) -> BackendResult<image::GrayImage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !file_formats::is_image_extension(extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "unsupported image format: {}",
            path.display()
        )));
    }

    let img = image::open(path).map_err(|e| {
        BackendError::DeviceUnavailable(format!(
            "failed to load image '{}': {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "Image loaded");
    Ok(img.to_luma8())
}

/// Build an NV21 buffer from a luma plane with neutral chroma
pub fn luma_to_nv21(luma: &[u8], width: u32, height: u32) -> Vec<u8> {
    let total = PixelFormat::NV21.buffer_len(width, height);
    let mut data = Vec::with_capacity(total);
    data.extend_from_slice(luma);
    data.resize(total, preview::NEUTRAL_CHROMA);
    data
}

/// Acquired still-image camera
pub struct StillImageCamera {
    size: PreviewSize,
    sensor: SensorInfo,
    interval: Duration,
    loop_frames: bool,
    frames: Arc<Vec<Vec<u8>>>,
    /// Armed one-shot callback, shared with the preview thread
    armed: Arc<Mutex<Option<FrameCallback>>>,
    next_index: Arc<Mutex<usize>>,
    preview: Option<CaptureLoopController>,
}

impl StillImageCamera {
    fn is_previewing(&self) -> bool {
        self.preview
            .as_ref()
            .map(|p| p.is_running())
            .unwrap_or(false)
    }
}

impl CameraBackend for StillImageCamera {
    fn preview_size(&self) -> PreviewSize {
        self.size
    }

    fn sensor_info(&self) -> SensorInfo {
        self.sensor
    }

    fn set_display_orientation(&mut self, orientation: Orientation) {
        // Stills are delivered as stored; only the decode path rotates
        debug!(orientation = %orientation, "Display orientation applied");
    }

    fn set_focus_mode(&mut self, mode: FocusMode) -> BackendResult<()> {
        trace!(?mode, "Focus mode has no effect on still images");
        Ok(())
    }

    fn start_preview(&mut self) {
        if self.is_previewing() {
            return;
        }

        let frames = Arc::clone(&self.frames);
        let armed = Arc::clone(&self.armed);
        let next_index = Arc::clone(&self.next_index);
        let (width, height) = (self.size.width, self.size.height);
        let loop_frames = self.loop_frames;

        self.preview = Some(CaptureLoopController::start(
            "still-image-preview",
            self.interval,
            move || {
                let Some(callback) = armed.lock().unwrap_or_else(PoisonError::into_inner).take()
                else {
                    return LoopAction::Continue;
                };

                let mut index = next_index.lock().unwrap_or_else(PoisonError::into_inner);
                if *index >= frames.len() {
                    if !loop_frames {
                        debug!("Still images exhausted");
                        return LoopAction::Stop;
                    }
                    *index = 0;
                }
                let frame = CameraFrame {
                    width,
                    height,
                    data: frames[*index].clone(),
                    format: PixelFormat::NV21,
                    captured_at: Instant::now(),
                };
                trace!(index = *index, "Delivering still frame");
                *index += 1;
                drop(index);

                callback(frame);
                LoopAction::Continue
            },
        ));
    }

    fn stop_preview(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }
    }

    fn set_one_shot_callback(&mut self, callback: FrameCallback) {
        *self.armed.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn release(&mut self) {
        self.stop_preview();
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("Still-image camera released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::SensorFacing;
    use std::sync::mpsc;

    fn provider(planes: usize) -> StillImageProvider {
        let planes = (0..planes).map(|i| vec![i as u8; 4 * 2]).collect();
        StillImageProvider::from_luma_planes(4, 2, planes).with_interval(Duration::from_millis(2))
    }

    fn arm(camera: &mut Box<dyn CameraBackend>) -> mpsc::Receiver<CameraFrame> {
        let (tx, rx) = mpsc::channel();
        camera.set_one_shot_callback(Box::new(move |frame| {
            let _ = tx.send(frame);
        }));
        rx
    }

    #[test]
    fn test_nv21_padding() {
        let data = luma_to_nv21(&[1, 2, 3, 4, 5, 6], 3, 2);
        // 3x2 luma plus 2x1 interleaved VU pairs
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 128, 128, 128, 128]);
    }

    #[test]
    fn test_empty_provider_is_unavailable() {
        let result = StillImageProvider::from_luma_planes(4, 2, Vec::new()).acquire();
        assert!(matches!(result, Err(BackendError::DeviceUnavailable(_))));

        let result = StillImageProvider::from_paths(Vec::new()).acquire();
        assert!(matches!(result, Err(BackendError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_mismatched_plane_is_rejected() {
        let result = StillImageProvider::from_luma_planes(4, 2, vec![vec![0; 3]]).acquire();
        assert!(matches!(result, Err(BackendError::FormatNotSupported(_))));
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let result = StillImageProvider::from_paths(vec![PathBuf::from("notes.txt")]).acquire();
        assert!(matches!(result, Err(BackendError::FormatNotSupported(_))));

        let result =
            StillImageProvider::from_paths(vec![PathBuf::from("/nonexistent/frame.png")])
                .acquire();
        assert!(matches!(result, Err(BackendError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_reports_size_and_sensor() {
        let sensor = SensorInfo {
            mount_angle: Orientation::Deg90,
            facing: SensorFacing::Front,
        };
        let camera = provider(1).with_sensor(sensor).acquire().unwrap();
        assert_eq!(
            camera.preview_size(),
            PreviewSize {
                width: 4,
                height: 2
            }
        );
        assert_eq!(camera.sensor_info(), sensor);
    }

    #[test]
    fn test_one_frame_per_arm() {
        let mut camera = provider(3).acquire().unwrap();
        camera.start_preview();

        let rx = arm(&mut camera);
        let frame = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.format, PixelFormat::NV21);
        assert_eq!(frame.data.len(), PixelFormat::NV21.buffer_len(4, 2));
        assert_eq!(&frame.data[..8], &[0; 8]);
        // Callback is spent after one frame
        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());

        let rx = arm(&mut camera);
        let frame = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(&frame.data[..8], &[1; 8]);

        camera.release();
    }

    #[test]
    fn test_frames_loop_back_to_start() {
        let mut camera = provider(2).acquire().unwrap();
        camera.start_preview();

        let mut firsts = Vec::new();
        for _ in 0..3 {
            let rx = arm(&mut camera);
            firsts.push(rx.recv_timeout(Duration::from_secs(2)).unwrap().data[0]);
        }
        assert_eq!(firsts, vec![0, 1, 0]);
        camera.release();
    }

    #[test]
    fn test_no_delivery_without_preview() {
        let mut camera = provider(1).acquire().unwrap();
        let rx = arm(&mut camera);
        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());

        camera.start_preview();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        camera.stop_preview();
    }

    #[test]
    fn test_release_drops_armed_callback() {
        let mut camera = provider(1).acquire().unwrap();
        let rx = arm(&mut camera);
        camera.release();

        // Sender was dropped with the callback
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(30)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn test_exhausted_frames_stop_without_looping() {
        let mut camera = provider(1).with_looping(false).acquire().unwrap();
        camera.start_preview();

        let rx = arm(&mut camera);
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        let rx = arm(&mut camera);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        camera.release();
    }
}
