//! Configuration management for the attention engine

use crate::{constants::*, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmark layout expected from the detector
    pub landmarks: LandmarkConfig,

    /// Temporal smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Baseline calibration configuration
    pub calibration: CalibrationConfig,

    /// Classification thresholds
    pub classifier: ClassifierConfig,

    /// Detection loop cadence
    pub scheduler: SchedulerConfig,
}

/// Positions of the designated landmark roles within a face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Minimum number of points a face must carry
    pub min_points: usize,
    pub left_eye_outer: usize,
    pub left_eye_inner: usize,
    pub right_eye_inner: usize,
    pub right_eye_outer: usize,
    pub nose_tip: usize,
    pub mouth_left: usize,
    pub mouth_right: usize,
}

/// Temporal smoothing parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type (`median` or `none`)
    pub filter: String,

    /// Samples kept per axis
    pub window: usize,
}

/// Baseline calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Valid frames during which the baseline adapts
    pub warmup_frames: u32,

    /// Weight kept from the previous baseline on each blend (0.0-1.0)
    pub retain_weight: f64,
}

/// Classification thresholds and confidences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub dead_zone_yaw: f64,
    pub dead_zone_pitch: f64,
    pub yaw_away: f64,
    pub pitch_up: f64,
    pub pitch_down: f64,
    pub away_confidence_base: f64,
    pub away_confidence_gain: f64,
    pub centered_confidence: f64,
    pub ambiguous_confidence: f64,
}

/// Detection loop timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick interval while the host is visible (ms)
    pub visible_interval_ms: u64,

    /// Tick interval while the host is hidden (ms)
    pub hidden_interval_ms: u64,

    /// Floor for drift-compensated delays (ms)
    pub min_delay_ms: u64,

    /// Period of the status log line (ms)
    pub status_log_interval_ms: u64,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            min_points: MIN_FACE_LANDMARKS,
            left_eye_outer: LEFT_EYE_OUTER_INDEX,
            left_eye_inner: LEFT_EYE_INNER_INDEX,
            right_eye_inner: RIGHT_EYE_INNER_INDEX,
            right_eye_outer: RIGHT_EYE_OUTER_INDEX,
            nose_tip: NOSE_TIP_INDEX,
            mouth_left: MOUTH_LEFT_INDEX,
            mouth_right: MOUTH_RIGHT_INDEX,
        }
    }
}

impl LandmarkConfig {
    fn indices(&self) -> [usize; 7] {
        [
            self.left_eye_outer,
            self.left_eye_inner,
            self.right_eye_inner,
            self.right_eye_outer,
            self.nose_tip,
            self.mouth_left,
            self.mouth_right,
        ]
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "median".to_string(),
            window: SMOOTHING_WINDOW,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            warmup_frames: BASELINE_WARMUP_FRAMES,
            retain_weight: BASELINE_RETAIN_WEIGHT,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dead_zone_yaw: DEAD_ZONE_YAW,
            dead_zone_pitch: DEAD_ZONE_PITCH,
            yaw_away: YAW_AWAY_THRESHOLD,
            pitch_up: PITCH_UP_THRESHOLD,
            pitch_down: PITCH_DOWN_THRESHOLD,
            away_confidence_base: AWAY_CONFIDENCE_BASE,
            away_confidence_gain: AWAY_CONFIDENCE_GAIN,
            centered_confidence: CENTERED_CONFIDENCE,
            ambiguous_confidence: AMBIGUOUS_CONFIDENCE,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            visible_interval_ms: VISIBLE_INTERVAL_MS,
            hidden_interval_ms: HIDDEN_INTERVAL_MS,
            min_delay_ms: MIN_TICK_DELAY_MS,
            status_log_interval_ms: STATUS_LOG_INTERVAL_MS,
        }
    }
}

impl SchedulerConfig {
    pub fn visible_interval(&self) -> Duration {
        Duration::from_millis(self.visible_interval_ms)
    }

    pub fn hidden_interval(&self) -> Duration {
        Duration::from_millis(self.hidden_interval_ms)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn status_log_interval(&self) -> Duration {
        Duration::from_millis(self.status_log_interval_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Landmark layout
        if let Some(index) = self.landmarks.indices().into_iter().find(|&i| i >= self.landmarks.min_points) {
            return Err(Error::ConfigError(format!(
                "Landmark index {} is outside the required {} points",
                index, self.landmarks.min_points
            )));
        }

        // Smoothing
        if self.smoothing.window == 0 {
            return Err(Error::ConfigError(
                "Smoothing window must be greater than 0".to_string(),
            ));
        }
        if !matches!(self.smoothing.filter.to_lowercase().as_str(), "median" | "none" | "nofilter") {
            return Err(Error::ConfigError(format!(
                "Unknown filter type: {}",
                self.smoothing.filter
            )));
        }

        // Calibration
        if !(0.0..=1.0).contains(&self.calibration.retain_weight) {
            return Err(Error::ConfigError(
                "Baseline retain weight must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Classifier
        let c = &self.classifier;
        let thresholds = [
            c.dead_zone_yaw,
            c.dead_zone_pitch,
            c.yaw_away,
            c.pitch_up,
            c.pitch_down,
            c.away_confidence_gain,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::ConfigError(
                "Classifier thresholds must be finite and non-negative".to_string(),
            ));
        }
        if c.dead_zone_yaw > c.yaw_away {
            return Err(Error::ConfigError(
                "Yaw dead zone must not exceed the yaw away threshold".to_string(),
            ));
        }
        for confidence in [c.away_confidence_base, c.centered_confidence, c.ambiguous_confidence] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::ConfigError(
                    "Confidences must be between 0.0 and 1.0".to_string(),
                ));
            }
        }

        // Scheduler
        let s = &self.scheduler;
        if s.visible_interval_ms == 0 || s.hidden_interval_ms == 0 {
            return Err(Error::ConfigError("Tick intervals must be greater than 0".to_string()));
        }
        if s.min_delay_ms > s.visible_interval_ms.min(s.hidden_interval_ms) {
            return Err(Error::ConfigError(
                "Minimum delay must not exceed the tick intervals".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Attention Classifier Configuration

# MediaPipe FaceMesh landmark layout
landmarks:
  min_points: 400
  left_eye_outer: 33
  left_eye_inner: 133
  right_eye_inner: 362
  right_eye_outer: 263
  nose_tip: 1
  mouth_left: 61
  mouth_right: 291

# Moving median per axis
smoothing:
  filter: "median"
  window: 10

# Neutral pose auto-calibration
calibration:
  warmup_frames: 30
  retain_weight: 0.8

# Classification thresholds
classifier:
  dead_zone_yaw: 0.06
  dead_zone_pitch: 0.05
  yaw_away: 0.14
  pitch_up: 0.10
  pitch_down: 0.10
  away_confidence_base: 0.7
  away_confidence_gain: 3.0
  centered_confidence: 0.9
  ambiguous_confidence: 0.7

# Detection loop timing
scheduler:
  visible_interval_ms: 100
  hidden_interval_ms: 500
  min_delay_ms: 10
  status_log_interval_ms: 5000
"#;
