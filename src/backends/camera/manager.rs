// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle manager
//!
//! The frame source provides:
//! - Camera acquisition with graceful "no camera" degradation
//! - Thread-safe preview control and one-shot frame arming
//! - Display orientation bookkeeping and region-of-interest queries
//!
//! Every operation takes the same coarse lock, so `release()` triggered by a
//! lifecycle event can never race an in-flight `request_next_frame()`.

use super::types::*;
use super::{CameraBackend, CameraProvider};
use crate::frame_processor::geometry::{CoordinateSpace, compute_region};
use crate::frame_processor::types::Region;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Lifecycle state of a frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Created, `open()` not yet called
    Uninitialized,
    /// Opened (with or without a camera), preview never started
    Active,
    /// Preview streaming
    Previewing,
    /// Preview stopped
    Idle,
    /// Camera released; terminal
    Released,
}

/// An acquired camera device
///
/// Owns the hardware handle from acquisition until `release()`, which
/// consumes the session so the handle cannot be used afterwards.
pub struct CameraSession {
    backend: Box<dyn CameraBackend>,
}

impl CameraSession {
    /// Acquire a camera and prepare it for scanning
    ///
    /// Continuous focus is requested on a best-effort basis.
    pub fn open(provider: &dyn CameraProvider) -> BackendResult<Self> {
        let mut backend = provider.acquire()?;

        if let Err(e) = backend.set_focus_mode(FocusMode::ContinuousVideo) {
            warn!(error = %e, "Continuous focus not available, keeping default focus mode");
        }

        info!(preview = %backend.preview_size(), "Camera session opened");
        Ok(Self { backend })
    }

    /// Current preview frame dimensions
    pub fn preview_size(&self) -> PreviewSize {
        self.backend.preview_size()
    }

    /// Static sensor properties
    pub fn sensor_info(&self) -> SensorInfo {
        self.backend.sensor_info()
    }

    fn release(mut self) {
        self.backend.release();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("preview_size", &self.backend.preview_size())
            .field("sensor", &self.backend.sensor_info())
            .finish()
    }
}

/// Internal source state
struct SourceInner {
    state: SourceState,
    /// Held camera; `None` when acquisition failed or after release
    session: Option<CameraSession>,
    /// Current display orientation
    orientation: Orientation,
}

/// Frame source
///
/// Owns the camera session and exposes the one-shot "deliver next frame"
/// primitive. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct FrameSource {
    inner: Arc<Mutex<SourceInner>>,
}

impl Default for FrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource {
    /// Create an uninitialized frame source
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SourceInner {
                state: SourceState::Uninitialized,
                session: None,
                orientation: Orientation::default(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SourceInner> {
        // State stays consistent across a panicking holder; keep serving
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a camera
    ///
    /// On failure the source still becomes `Active`, just without a camera;
    /// every capture operation is then a no-op. Callers check `has_camera()`
    /// before relying on capture.
    pub fn open(&self, provider: &dyn CameraProvider) -> BackendResult<()> {
        let mut inner = self.lock();

        if inner.state == SourceState::Released {
            debug!("open() after release ignored");
            return Ok(());
        }
        if inner.session.is_some() {
            debug!("Camera already open");
            return Ok(());
        }

        let result = match CameraSession::open(provider) {
            Ok(session) => {
                inner.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera acquisition failed, continuing without camera");
                Err(e)
            }
        };

        if inner.state == SourceState::Uninitialized {
            inner.state = SourceState::Active;
        }
        result
    }

    /// Check if a camera is held
    pub fn has_camera(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SourceState {
        self.lock().state
    }

    /// Current display orientation
    pub fn orientation(&self) -> Orientation {
        self.lock().orientation
    }

    /// Start preview streaming, if a camera is held
    pub fn start_preview(&self) {
        let mut inner = self.lock();
        if let Some(session) = inner.session.as_mut() {
            session.backend.start_preview();
            inner.state = SourceState::Previewing;
            debug!("Preview started");
        }
    }

    /// Stop preview streaming, if a camera is held
    pub fn stop_preview(&self) {
        let mut inner = self.lock();
        if let Some(session) = inner.session.as_mut() {
            session.backend.stop_preview();
            inner.state = SourceState::Idle;
            debug!("Preview stopped");
        }
    }

    /// Release the camera
    ///
    /// Idempotent; the source is `Released` afterwards whether or not a
    /// camera was ever held.
    pub fn release(&self) {
        let mut inner = self.lock();
        if let Some(session) = inner.session.take() {
            info!("Releasing camera");
            session.release();
        }
        inner.state = SourceState::Released;
    }

    /// Arm delivery of exactly one future frame
    ///
    /// Without a camera the callback is dropped and never invoked.
    pub fn request_next_frame(&self, on_frame: FrameCallback) {
        let mut inner = self.lock();
        match inner.session.as_mut() {
            Some(session) => session.backend.set_one_shot_callback(on_frame),
            None => debug!("Frame requested without camera, ignoring"),
        }
    }

    /// Store and apply a display orientation computed by the caller
    pub fn set_display_orientation(&self, orientation: Orientation) {
        let mut inner = self.lock();
        inner.orientation = orientation;
        if let Some(session) = inner.session.as_mut() {
            session.backend.set_display_orientation(orientation);
        }
        debug!(%orientation, "Display orientation set");
    }

    /// Derive the display orientation from the device rotation and the held
    /// sensor, then store and apply it
    ///
    /// Returns `None` (and changes nothing) without a camera.
    pub fn compute_display_orientation(&self, device_rotation: Orientation) -> Option<Orientation> {
        let mut inner = self.lock();
        let session = inner.session.as_mut()?;

        let sensor = session.backend.sensor_info();
        let orientation = Orientation::for_display(device_rotation, &sensor);
        session.backend.set_display_orientation(orientation);
        inner.orientation = orientation;

        info!(
            %device_rotation,
            mount = %sensor.mount_angle,
            facing = %sensor.facing,
            %orientation,
            "Display orientation computed"
        );
        Some(orientation)
    }

    /// Region of interest in sensor pixels, based on the preview size
    pub fn bounding_rect(&self) -> Option<Region> {
        self.decode_geometry().map(|(region, _)| region)
    }

    /// Region of interest in UI pixels, for drawing the reticle overlay
    pub fn bounding_rect_ui(&self, ui_width: u32, ui_height: u32) -> Region {
        let orientation = self.lock().orientation;
        compute_region(ui_width, ui_height, orientation, CoordinateSpace::Ui)
    }

    /// Sensor-space region and orientation read under a single lock
    ///
    /// Returns `None` without a camera.
    pub fn decode_geometry(&self) -> Option<(Region, Orientation)> {
        let inner = self.lock();
        let size = inner.session.as_ref()?.preview_size();
        let region = compute_region(
            size.width,
            size.height,
            inner.orientation,
            CoordinateSpace::Sensor,
        );
        Some((region, inner.orientation))
    }
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("FrameSource")
            .field("state", &inner.state)
            .field("has_camera", &inner.session.is_some())
            .field("orientation", &inner.orientation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        starts: AtomicUsize,
        stops: AtomicUsize,
        arms: AtomicUsize,
        releases: AtomicUsize,
    }

    struct FakeCamera {
        counters: Arc<Counters>,
        sensor: SensorInfo,
        applied: Arc<Mutex<Option<Orientation>>>,
    }

    impl CameraBackend for FakeCamera {
        fn preview_size(&self) -> PreviewSize {
            PreviewSize {
                width: 640,
                height: 480,
            }
        }

        fn sensor_info(&self) -> SensorInfo {
            self.sensor
        }

        fn set_display_orientation(&mut self, orientation: Orientation) {
            *self.applied.lock().unwrap() = Some(orientation);
        }

        fn set_focus_mode(&mut self, _mode: FocusMode) -> BackendResult<()> {
            Err(BackendError::Other("fixed focus".to_string()))
        }

        fn start_preview(&mut self) {
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop_preview(&mut self) {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn set_one_shot_callback(&mut self, _callback: FrameCallback) {
            self.counters.arms.fetch_add(1, Ordering::SeqCst);
        }

        fn release(&mut self) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeProvider {
        counters: Arc<Counters>,
        sensor: SensorInfo,
        applied: Arc<Mutex<Option<Orientation>>>,
    }

    impl FakeProvider {
        fn new(sensor: SensorInfo) -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                sensor,
                applied: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl CameraProvider for FakeProvider {
        fn acquire(&self) -> BackendResult<Box<dyn CameraBackend>> {
            Ok(Box::new(FakeCamera {
                counters: Arc::clone(&self.counters),
                sensor: self.sensor,
                applied: Arc::clone(&self.applied),
            }))
        }
    }

    struct NoCamera;

    impl CameraProvider for NoCamera {
        fn acquire(&self) -> BackendResult<Box<dyn CameraBackend>> {
            Err(BackendError::DeviceUnavailable("in use".to_string()))
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let provider = FakeProvider::new(SensorInfo::default());
        let source = FrameSource::new();
        assert_eq!(source.state(), SourceState::Uninitialized);

        source.open(&provider).unwrap();
        assert_eq!(source.state(), SourceState::Active);
        assert!(source.has_camera());

        source.start_preview();
        assert_eq!(source.state(), SourceState::Previewing);
        source.stop_preview();
        assert_eq!(source.state(), SourceState::Idle);
        source.start_preview();
        assert_eq!(source.state(), SourceState::Previewing);

        source.release();
        assert_eq!(source.state(), SourceState::Released);
        assert!(!source.has_camera());
    }

    #[test]
    fn test_open_failure_leaves_no_camera() {
        let source = FrameSource::new();
        let result = source.open(&NoCamera);

        assert!(matches!(result, Err(BackendError::DeviceUnavailable(_))));
        assert_eq!(source.state(), SourceState::Active);
        assert!(!source.has_camera());

        // All capture operations are no-ops
        source.start_preview();
        source.stop_preview();
        source.request_next_frame(Box::new(|_| panic!("must not fire")));
        assert_eq!(source.state(), SourceState::Active);
        assert!(source.bounding_rect().is_none());
        assert!(source.compute_display_orientation(Orientation::Deg90).is_none());
    }

    #[test]
    fn test_release_is_idempotent() {
        let provider = FakeProvider::new(SensorInfo::default());
        let source = FrameSource::new();
        source.open(&provider).unwrap();

        source.release();
        source.release();
        source.start_preview();
        source.request_next_frame(Box::new(|_| {}));

        assert_eq!(provider.counters.releases.load(Ordering::SeqCst), 1);
        assert_eq!(provider.counters.starts.load(Ordering::SeqCst), 0);
        assert_eq!(provider.counters.arms.load(Ordering::SeqCst), 0);
        assert_eq!(source.state(), SourceState::Released);
    }

    #[test]
    fn test_open_after_release_is_ignored() {
        let provider = FakeProvider::new(SensorInfo::default());
        let source = FrameSource::new();
        source.release();

        assert!(source.open(&provider).is_ok());
        assert!(!source.has_camera());
        assert_eq!(source.state(), SourceState::Released);
    }

    #[test]
    fn test_request_next_frame_reaches_backend() {
        let provider = FakeProvider::new(SensorInfo::default());
        let source = FrameSource::new();
        source.open(&provider).unwrap();

        source.request_next_frame(Box::new(|_| {}));
        source.request_next_frame(Box::new(|_| {}));
        assert_eq!(provider.counters.arms.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_compute_display_orientation_applies_to_backend() {
        let provider = FakeProvider::new(SensorInfo {
            mount_angle: Orientation::Deg90,
            facing: SensorFacing::Back,
        });
        let source = FrameSource::new();
        source.open(&provider).unwrap();

        let orientation = source.compute_display_orientation(Orientation::Deg0);
        assert_eq!(orientation, Some(Orientation::Deg90));
        assert_eq!(source.orientation(), Orientation::Deg90);
        assert_eq!(*provider.applied.lock().unwrap(), Some(Orientation::Deg90));
    }

    #[test]
    fn test_bounding_rect_uses_preview_size_and_orientation() {
        let provider = FakeProvider::new(SensorInfo::default());
        let source = FrameSource::new();
        source.open(&provider).unwrap();

        let rect = source.bounding_rect().unwrap();
        assert_eq!((rect.left, rect.top, rect.right, rect.bottom), (128, 96, 512, 384));

        // Sensor space compresses the width when rotated
        source.set_display_orientation(Orientation::Deg90);
        let rect = source.bounding_rect().unwrap();
        assert_eq!((rect.left, rect.top, rect.right, rect.bottom), (224, 96, 416, 384));

        // UI space compresses the height when rotated
        let ui = source.bounding_rect_ui(1000, 2000);
        assert_eq!((ui.left, ui.top, ui.right, ui.bottom), (200, 700, 800, 1300));
    }
}
