// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for preview loops
//!
//! Backends without a hardware clock stream preview frames from a paced
//! thread. The controller owns that thread: it starts it, stops it promptly
//! on request, and joins it on drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Granularity of stop-signal checks while waiting for the next tick
const STOP_POLL: Duration = Duration::from_millis(5);

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a paced loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = CaptureLoopController::start("preview", interval, move || {
///     deliver_armed_frame();
///     LoopAction::Continue
/// });
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Start a loop that calls `tick` once per `interval`
    ///
    /// The closure runs until it returns `LoopAction::Stop` or the
    /// controller is stopped. The first tick happens after one interval.
    pub fn start<F>(name: &str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis(), "Starting preview loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Preview loop thread started");
            let mut next_tick = Instant::now() + interval;

            'outer: loop {
                // Sleep in short slices so stop requests are honoured quickly
                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break 'outer;
                    }
                    let now = Instant::now();
                    if now >= next_tick {
                        break;
                    }
                    thread::sleep((next_tick - now).min(STOP_POLL));
                }
                next_tick += interval;

                if tick() == LoopAction::Stop {
                    debug!(name = %name_clone, "Loop requested stop");
                    break;
                }
            }

            info!(name = %name_clone, "Preview loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting preview loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Stopped from inside a tick; the loop exits on its own
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Preview loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Preview loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}
