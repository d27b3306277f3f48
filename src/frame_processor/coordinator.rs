// SPDX-License-Identifier: GPL-3.0-only

//! Decode coordinator
//!
//! The coordinator is the only place that re-arms the frame source. Each
//! failed attempt arms exactly one more frame; the first success is handed
//! to the consumer and arming stops for good. Together with one-shot frame
//! delivery this keeps at most one frame in the decode pipeline at a time.

use crate::backends::camera::{CameraFrame, FrameSource};
use crate::frame_processor::types::DecodeOutcome;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, trace};

/// Events processed by the coordinating task
#[derive(Debug)]
pub enum ScanEvent {
    /// A frame delivered by the armed one-shot callback
    Frame(CameraFrame),
    /// A decode worker finished
    Decoded(DecodeOutcome),
    /// Stop the scan loop
    Shutdown,
}

/// Consumer of the decoded payload; called at most once
pub type DecodedCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// What the coordinator did with an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Failure observed, next frame requested
    Rearmed,
    /// First success, payload handed to the consumer
    Delivered(String),
    /// Outcome arrived after delivery and was dropped
    Ignored,
}

/// Decode coordinator
pub struct DecodeCoordinator {
    source: FrameSource,
    events: UnboundedSender<ScanEvent>,
    consumer: Option<DecodedCallback>,
    awaiting_result: bool,
    delivered: bool,
}

impl DecodeCoordinator {
    /// Create a coordinator that posts delivered frames to `events`
    pub fn new(
        source: FrameSource,
        events: UnboundedSender<ScanEvent>,
        consumer: DecodedCallback,
    ) -> Self {
        Self {
            source,
            events,
            consumer: Some(consumer),
            awaiting_result: false,
            delivered: false,
        }
    }

    /// Arm the frame source for one frame
    ///
    /// Does nothing once a payload has been delivered.
    pub fn request_frame(&mut self) {
        if self.delivered {
            return;
        }

        let events = self.events.clone();
        self.source.request_next_frame(Box::new(move |frame| {
            if events.send(ScanEvent::Frame(frame)).is_err() {
                trace!("Scan loop stopped, dropping frame");
            }
        }));
        self.awaiting_result = true;
    }

    /// Handle a terminal decode outcome
    pub fn handle_outcome(&mut self, outcome: DecodeOutcome) -> CoordinatorAction {
        if self.delivered {
            debug!("Outcome after delivery ignored");
            return CoordinatorAction::Ignored;
        }
        self.awaiting_result = false;

        match outcome {
            DecodeOutcome::Failure => {
                trace!("Decode failed, requesting next frame");
                self.request_frame();
                CoordinatorAction::Rearmed
            }
            DecodeOutcome::Success(payload) => {
                self.delivered = true;
                info!(len = payload.len(), "Barcode decoded");
                if let Some(consumer) = self.consumer.take() {
                    consumer(payload.clone());
                }
                CoordinatorAction::Delivered(payload)
            }
        }
    }

    /// True while a requested frame has not produced an outcome yet
    pub fn is_awaiting_result(&self) -> bool {
        self.awaiting_result
    }

    /// True once a payload has been delivered
    pub fn is_delivered(&self) -> bool {
        self.delivered
    }
}

impl std::fmt::Debug for DecodeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeCoordinator")
            .field("awaiting_result", &self.awaiting_result)
            .field("delivered", &self.delivered)
            .finish()
    }
}
