// SPDX-License-Identifier: GPL-3.0-only

//! Scan loop
//!
//! Wires the frame source, the decode pipeline and the coordinator together
//! on one coordinating tokio task:
//!
//! ```text
//!  camera thread            coordinating task             blocking pool
//! ───────────────          ───────────────────           ───────────────
//!  armed callback ──Frame──►  spawn decode  ───────────►  DecodePipeline
//!                                                              │
//!                  ◄──────────── Decoded(outcome) ◄────────────┘
//!                            coordinator.handle_outcome
//!                              ├─ Failure → re-arm
//!                              └─ Success → consumer, finish
//! ```
//!
//! The source is expected to be opened and previewing; the loop only arms
//! frames and reacts to outcomes.

use crate::backends::camera::{CameraFrame, FrameSource};
use crate::frame_processor::coordinator::{
    CoordinatorAction, DecodeCoordinator, DecodedCallback, ScanEvent,
};
use crate::frame_processor::tasks::decoder::{BarcodeReader, DecodePipeline};
use crate::frame_processor::types::DecodeOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a finished scan loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Delivered payload, `None` if the loop was stopped first
    pub payload: Option<String>,
    /// Number of frames handed to the decode pipeline
    pub attempts: usize,
}

/// Scan pipeline over a frame source and a barcode reader
pub struct ScanPipeline<R> {
    source: FrameSource,
    decoder: Arc<DecodePipeline<R>>,
}

impl<R: BarcodeReader + 'static> ScanPipeline<R> {
    /// Create a pipeline decoding frames from `source` with `reader`
    pub fn new(source: FrameSource, reader: R) -> Self {
        let decoder = Arc::new(DecodePipeline::new(source.clone(), reader));
        Self { source, decoder }
    }

    /// Frame source the pipeline arms
    pub fn source(&self) -> &FrameSource {
        &self.source
    }

    /// Start the scan loop on the current tokio runtime
    ///
    /// `consumer` is called at most once, on the coordinating task, with the
    /// first decoded payload.
    pub fn spawn(self, consumer: DecodedCallback) -> ScanHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let coordinator = DecodeCoordinator::new(self.source.clone(), events_tx.clone(), consumer);

        let task = tokio::spawn(run_loop(
            coordinator,
            self.decoder,
            events_tx.clone(),
            events_rx,
        ));

        ScanHandle {
            source: self.source,
            events: events_tx,
            task,
        }
    }

    /// Run the scan loop to completion
    ///
    /// Returns the first decoded payload. Only returns `None` if the source
    /// is released from elsewhere and the loop is shut down.
    pub async fn run(self) -> Option<String> {
        self.spawn(Box::new(|_| {})).wait().await.payload
    }
}

/// Handle to a running scan loop
pub struct ScanHandle {
    source: FrameSource,
    events: UnboundedSender<ScanEvent>,
    task: JoinHandle<ScanSummary>,
}

impl ScanHandle {
    /// Release the camera and shut the loop down
    ///
    /// A decode already in flight finishes on its worker; its outcome is
    /// dropped.
    pub fn stop(&self) {
        info!("Stopping scan loop");
        self.source.release();
        // Loop may already have finished after a delivery
        let _ = self.events.send(ScanEvent::Shutdown);
    }

    /// True once the loop has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to finish
    pub async fn wait(self) -> ScanSummary {
        summary_of(self.task.await)
    }

    /// Wait at most `timeout`, then stop the loop
    pub async fn wait_timeout(mut self, timeout: Duration) -> ScanSummary {
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(joined) => summary_of(joined),
            Err(_) => {
                info!(timeout_ms = timeout.as_millis(), "Scan timed out");
                self.stop();
                self.wait().await
            }
        }
    }
}

fn summary_of(joined: Result<ScanSummary, tokio::task::JoinError>) -> ScanSummary {
    joined.unwrap_or_else(|e| {
        warn!(error = %e, "Scan loop task failed");
        ScanSummary::default()
    })
}

impl std::fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

async fn run_loop<R: BarcodeReader + 'static>(
    mut coordinator: DecodeCoordinator,
    decoder: Arc<DecodePipeline<R>>,
    events_tx: UnboundedSender<ScanEvent>,
    mut events_rx: UnboundedReceiver<ScanEvent>,
) -> ScanSummary {
    let mut summary = ScanSummary::default();

    debug!("Scan loop started");
    coordinator.request_frame();

    while let Some(event) = events_rx.recv().await {
        match event {
            ScanEvent::Frame(frame) => {
                summary.attempts += 1;
                spawn_decode(Arc::clone(&decoder), frame, events_tx.clone());
            }
            ScanEvent::Decoded(outcome) => match coordinator.handle_outcome(outcome) {
                CoordinatorAction::Delivered(payload) => {
                    summary.payload = Some(payload);
                    break;
                }
                CoordinatorAction::Rearmed | CoordinatorAction::Ignored => {}
            },
            ScanEvent::Shutdown => {
                debug!("Scan loop shutdown requested");
                break;
            }
        }
    }

    info!(
        attempts = summary.attempts,
        delivered = summary.payload.is_some(),
        "Scan loop finished"
    );
    summary
}

/// Decode one frame on the blocking pool and post the outcome back
fn spawn_decode<R: BarcodeReader + 'static>(
    decoder: Arc<DecodePipeline<R>>,
    frame: CameraFrame,
    events: UnboundedSender<ScanEvent>,
) {
    tokio::spawn(async move {
        let outcome = match tokio::task::spawn_blocking(move || decoder.decode(frame)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // A panicking reader must not stall the loop
                warn!(error = %e, "Decode worker failed");
                DecodeOutcome::Failure
            }
        };
        let _ = events.send(ScanEvent::Decoded(outcome));
    });
}
