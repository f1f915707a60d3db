//! Error types for the attention classification engine.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// The landmark detection backend or model could not be initialized
    #[error("Detection backend initialization failed: {0}")]
    BackendInit(String),

    /// A frame or detector resource is not ready (teardown race, zero-sized texture)
    #[error("Resource not ready: {0}")]
    ResourceNotReady(String),

    /// Landmark detector failed during inference
    #[error("Detector error: {0}")]
    Detector(String),

    /// Frame source failed to produce a frame
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Detection task panicked or was aborted
    #[error("Detection task failed: {0}")]
    TaskJoin(String),
}

/// Message fragments emitted by detectors while the video source is being torn down.
const TRANSIENT_PATTERNS: [&str; 2] = ["texture size", "0x0"];

impl Error {
    /// Whether this failure is an expected teardown race that the detection loop
    /// should swallow without reporting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ResourceNotReady(_) => true,
            Self::Detector(msg) | Self::FrameSource(msg) => {
                TRANSIENT_PATTERNS.iter().any(|pattern| msg.contains(pattern))
            }
            _ => false,
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::ResourceNotReady("camera".into()).is_transient());
        assert!(Error::Detector("Requested texture size [0x0] is invalid".into()).is_transient());
        assert!(Error::FrameSource("video is 0x0".into()).is_transient());

        assert!(!Error::Detector("out of memory".into()).is_transient());
        assert!(!Error::BackendInit("texture size".into()).is_transient());
        assert!(!Error::InvalidInput("bad".into()).is_transient());
    }
}
