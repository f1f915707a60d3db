//! Threshold-based attention classification.
//!
//! Stateless: all temporal memory lives in the filter and calibrator. Given a
//! zero-centered orientation the rules are applied in priority order:
//! horizontal away, up, down, centered, then an ambiguous fallback.

use crate::{config::ClassifierConfig, orientation::Orientation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete attention state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionKind {
    LookingAtScreen,
    AwayLeft,
    AwayRight,
    AwayUp,
    AwayDown,
    NoFace,
}

impl AttentionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LookingAtScreen => "looking_at_screen",
            Self::AwayLeft => "away_left",
            Self::AwayRight => "away_right",
            Self::AwayUp => "away_up",
            Self::AwayDown => "away_down",
            Self::NoFace => "no_face",
        }
    }

    pub const fn is_away(self) -> bool {
        matches!(self, Self::AwayLeft | Self::AwayRight | Self::AwayUp | Self::AwayDown)
    }
}

impl fmt::Display for AttentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification output for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionState {
    pub state: AttentionKind,
    /// Always within [0, 1]
    pub confidence: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl AttentionState {
    /// Reported when no usable face was found
    pub const NO_FACE: Self = Self {
        state: AttentionKind::NoFace,
        confidence: 0.0,
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };
}

/// Applies dead-zone and away-threshold rules
#[derive(Debug, Clone, Default)]
pub struct StateClassifier {
    config: ClassifierConfig,
}

impl StateClassifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a zero-centered orientation. `valid` is the estimator's
    /// verdict on the frame it came from.
    pub fn classify(&self, centered: Orientation, valid: bool) -> AttentionState {
        if !valid {
            return AttentionState::NO_FACE;
        }

        let c = &self.config;
        let Orientation { yaw, pitch, roll } = centered;
        let abs_yaw = yaw.abs();
        let abs_pitch = pitch.abs();

        let (state, confidence) = if abs_yaw > c.yaw_away {
            let state = if yaw > 0.0 {
                AttentionKind::AwayRight
            } else {
                AttentionKind::AwayLeft
            };
            (state, self.away_confidence(abs_yaw, c.yaw_away))
        } else if pitch < -c.pitch_up && abs_pitch > c.dead_zone_pitch {
            (AttentionKind::AwayUp, self.away_confidence(abs_pitch, c.pitch_up))
        } else if pitch > c.pitch_down && abs_pitch > c.dead_zone_pitch {
            (AttentionKind::AwayDown, self.away_confidence(abs_pitch, c.pitch_down))
        } else if abs_yaw < c.dead_zone_yaw && abs_pitch < c.dead_zone_pitch {
            (AttentionKind::LookingAtScreen, c.centered_confidence)
        } else {
            // Between a dead zone and an away threshold
            (AttentionKind::LookingAtScreen, c.ambiguous_confidence)
        };

        AttentionState {
            state,
            confidence: confidence.clamp(0.0, 1.0),
            yaw,
            pitch,
            roll,
        }
    }

    fn away_confidence(&self, magnitude: f64, threshold: f64) -> f64 {
        ((magnitude - threshold) * self.config.away_confidence_gain + self.config.away_confidence_base).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(yaw: f64, pitch: f64) -> AttentionState {
        StateClassifier::default().classify(Orientation::new(yaw, pitch, 0.0), true)
    }

    #[test]
    fn test_invalid_is_no_face() {
        let state = StateClassifier::default().classify(Orientation::new(0.5, 0.5, 0.5), false);
        assert_eq!(state, AttentionState::NO_FACE);
    }

    #[test]
    fn test_centered() {
        let state = classify(0.0, 0.0);
        assert_eq!(state.state, AttentionKind::LookingAtScreen);
        assert_eq!(state.confidence, 0.9);
    }

    #[test]
    fn test_away_right_confidence() {
        let state = classify(0.20, 0.0);
        assert_eq!(state.state, AttentionKind::AwayRight);
        assert!((state.confidence - 0.88).abs() < 1e-9);
    }

    #[test]
    fn test_away_left() {
        let state = classify(-0.15, 0.0);
        assert_eq!(state.state, AttentionKind::AwayLeft);
        assert!((state.confidence - 0.73).abs() < 1e-9);
    }

    #[test]
    fn test_yaw_takes_priority_over_pitch() {
        assert_eq!(classify(0.3, 0.3).state, AttentionKind::AwayRight);
    }

    #[test]
    fn test_vertical() {
        let up = classify(0.0, -0.12);
        assert_eq!(up.state, AttentionKind::AwayUp);
        assert!((up.confidence - 0.76).abs() < 1e-9);

        let down = classify(0.0, 0.2);
        assert_eq!(down.state, AttentionKind::AwayDown);
        assert!((down.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ambiguous_fallback() {
        // Outside the yaw dead zone but under the away threshold
        let state = classify(0.1, 0.0);
        assert_eq!(state.state, AttentionKind::LookingAtScreen);
        assert_eq!(state.confidence, 0.7);

        // Pitch between dead zone and down threshold
        let state = classify(0.0, 0.08);
        assert_eq!(state.state, AttentionKind::LookingAtScreen);
        assert_eq!(state.confidence, 0.7);
    }

    #[test]
    fn test_away_states() {
        assert!(classify(0.3, 0.0).state.is_away());
        assert!(classify(0.0, -0.3).state.is_away());
        assert!(!classify(0.1, 0.0).state.is_away());
        assert!(!AttentionKind::NoFace.is_away());
    }

    #[test]
    fn test_confidence_ceiling() {
        let state = classify(-2.0, 0.0);
        assert_eq!(state.confidence, 1.0);
    }

    #[test]
    fn test_serialized_names() {
        let yaml = serde_yaml::to_string(&AttentionKind::LookingAtScreen).unwrap();
        assert_eq!(yaml.trim(), "looking_at_screen");
        assert_eq!(AttentionKind::AwayDown.to_string(), "away_down");
    }
}
