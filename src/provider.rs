//! Seams to the external collaborators: video source, landmark detector and
//! overlay renderer.

use crate::{classifier::AttentionState, landmarks::LandmarkFrame, Result};
use std::future::Future;

/// Source of video frames
pub trait FrameSource: Send + 'static {
    /// Frame handed to the landmark provider
    type Frame: Send + 'static;

    /// Grab the current frame.
    ///
    /// Returns `Ok(None)` while the source has nothing to decode yet (stream
    /// not started, zero-sized video); the cycle is skipped silently.
    fn grab(&mut self) -> Result<Option<Self::Frame>>;
}

/// External facial landmark detector
pub trait LandmarkProvider<F>: Send + 'static {
    /// Load the backend and model. Failure here is fatal for the session.
    fn initialize(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Detect faces in a frame, most prominent first
    fn estimate_faces(&mut self, frame: F) -> impl Future<Output = Result<Vec<LandmarkFrame>>> + Send;
}

/// Receives the face chosen for each cycle, e.g. to draw a mesh overlay
pub trait RenderSink: Send + 'static {
    fn render(&mut self, face: Option<&LandmarkFrame>, state: &AttentionState);
}

/// Sink that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _face: Option<&LandmarkFrame>, _state: &AttentionState) {}
}
