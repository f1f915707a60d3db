//! Auto-calibrating neutral head pose.
//!
//! During warm-up the baseline follows the smoothed signal with an exponential
//! decay; afterwards it is frozen until an explicit recalibration.

use crate::{config::CalibrationConfig, orientation::Orientation};
use log::debug;

/// Tracks the user's neutral pose and zero-centers smoothed samples against it
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    baseline: Orientation,
    frames_seen: u32,
    warmup_frames: u32,
    retain_weight: f64,
}

impl BaselineCalibrator {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            baseline: Orientation::ZERO,
            frames_seen: 0,
            warmup_frames: config.warmup_frames,
            retain_weight: config.retain_weight,
        }
    }

    /// Count one valid smoothed sample, adapt the baseline if still warming
    /// up, and return the sample relative to the baseline.
    pub fn observe(&mut self, smoothed: Orientation) -> Orientation {
        self.frames_seen = self.frames_seen.saturating_add(1);

        if self.frames_seen <= self.warmup_frames {
            self.baseline = self.baseline * self.retain_weight + smoothed * (1.0 - self.retain_weight);
            if self.frames_seen == self.warmup_frames {
                debug!(
                    "Baseline settled after {} frames: yaw={:.3} pitch={:.3} roll={:.3}",
                    self.frames_seen, self.baseline.yaw, self.baseline.pitch, self.baseline.roll
                );
            }
        }

        smoothed - self.baseline
    }

    /// Zero the baseline and re-enter warm-up
    pub fn reset(&mut self) {
        self.baseline = Orientation::ZERO;
        self.frames_seen = 0;
    }

    pub fn baseline(&self) -> Orientation {
        self.baseline
    }

    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    pub fn is_warming_up(&self) -> bool {
        self.frames_seen < self.warmup_frames
    }
}

impl Default for BaselineCalibrator {
    fn default() -> Self {
        Self::new(&CalibrationConfig::default())
    }
}
