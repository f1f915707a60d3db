//! Temporal filtering of raw orientation samples.
//!
//! Landmark detections jitter frame to frame (blinks, lighting, brief
//! misdetections). Filters here replace each raw sample with a smoothed one
//! before the baseline is applied.

/// Moving median filter for outlier rejection
pub mod median;

use crate::{config::SmoothingConfig, orientation::Orientation, Result};

/// Trait for all orientation filters
pub trait OrientationFilter: Send + Sync {
    /// Feed one raw sample and get the smoothed sample back
    fn apply(&mut self, sample: Orientation) -> Orientation;

    /// Drop all history
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl OrientationFilter for NoFilter {
    fn apply(&mut self, sample: Orientation) -> Orientation {
        sample
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create an orientation filter from the smoothing configuration
pub fn create_filter(config: &SmoothingConfig) -> Result<Box<dyn OrientationFilter>> {
    match config.filter.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "median" => {
            if config.window == 0 {
                return Err(crate::Error::ConfigError(
                    "Smoothing window must be greater than 0".to_string(),
                ));
            }
            Ok(Box::new(median::MedianFilter::new(config.window)))
        }
        other => Err(crate::Error::ConfigError(format!("Unknown filter type: {other}"))),
    }
}
