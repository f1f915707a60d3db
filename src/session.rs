//! Per-session tracking state.
//!
//! An [`AttentionSession`] owns everything that persists between cycles: the
//! smoothing windows and the baseline. Sessions are independent, so several can
//! run side by side and tests can drive one deterministically.

use crate::{
    calibration::BaselineCalibrator,
    classifier::{AttentionState, StateClassifier},
    config::Config,
    filters::{create_filter, OrientationFilter},
    landmarks::LandmarkFrame,
    orientation::{Orientation, OrientationEstimator},
    Result,
};
use log::info;

/// Estimator, filter, calibrator and classifier for one tracking session
pub struct AttentionSession {
    estimator: OrientationEstimator,
    filter: Box<dyn OrientationFilter>,
    calibrator: BaselineCalibrator,
    classifier: StateClassifier,
}

impl AttentionSession {
    /// Build a session from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            estimator: OrientationEstimator::new(config.landmarks.clone()),
            filter: create_filter(&config.smoothing)?,
            calibrator: BaselineCalibrator::new(&config.calibration),
            classifier: StateClassifier::new(config.classifier.clone()),
        })
    }

    /// Run one classification cycle on the selected face, if any.
    ///
    /// Invalid or missing faces produce `no_face` and leave the smoothing
    /// windows and baseline untouched.
    pub fn process(&mut self, face: Option<&LandmarkFrame>) -> AttentionState {
        let Some(face) = face else {
            return AttentionState::NO_FACE;
        };

        let estimate = self.estimator.estimate(face);
        if !estimate.valid {
            return self.classifier.classify(estimate.orientation, false);
        }

        let smoothed = self.filter.apply(estimate.orientation);
        let centered = self.calibrator.observe(smoothed);
        self.classifier.classify(centered, true)
    }

    /// Forget the baseline and smoothing history and re-enter warm-up
    pub fn recalibrate(&mut self) {
        info!("Recalibrating attention baseline");
        self.calibrator.reset();
        self.filter.reset();
    }

    pub fn baseline(&self) -> Orientation {
        self.calibrator.baseline()
    }

    pub fn is_warming_up(&self) -> bool {
        self.calibrator.is_warming_up()
    }

    /// Valid frames seen since start or the last recalibration
    pub fn frames_seen(&self) -> u32 {
        self.calibrator.frames_seen()
    }
}

impl Default for AttentionSession {
    fn default() -> Self {
        Self {
            estimator: OrientationEstimator::default(),
            filter: Box::new(crate::filters::median::MedianFilter::new(crate::constants::SMOOTHING_WINDOW)),
            calibrator: BaselineCalibrator::default(),
            classifier: StateClassifier::default(),
        }
    }
}
