//! Head orientation proxies from facial landmark geometry.
//!
//! Yaw, pitch and roll here are scale-invariant ratios, not Euler angles:
//! - yaw: horizontal nose offset from the inner-eye midpoint, over the outer-eye distance
//! - pitch: vertical nose offset from the same midpoint, over the larger of eye and mouth width
//! - roll: slope of the line through the outer eye corners, bounded to [-1, 1]

use crate::{config::LandmarkConfig, landmarks::FaceKeypoints, landmarks::LandmarkFrame};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A `{yaw, pitch, roll}` triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Orientation {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn is_finite(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite() && self.roll.is_finite()
    }
}

impl Add for Orientation {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.yaw + rhs.yaw, self.pitch + rhs.pitch, self.roll + rhs.roll)
    }
}

impl Sub for Orientation {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.yaw - rhs.yaw, self.pitch - rhs.pitch, self.roll - rhs.roll)
    }
}

impl Mul<f64> for Orientation {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.yaw * rhs, self.pitch * rhs, self.roll * rhs)
    }
}

/// Raw per-frame estimate plus whether the frame was usable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimate {
    pub orientation: Orientation,
    pub valid: bool,
}

impl OrientationEstimate {
    /// The all-zero estimate reported for unusable frames
    pub const INVALID: Self = Self {
        orientation: Orientation::ZERO,
        valid: false,
    };
}

/// Converts one face's landmarks into raw orientation ratios
#[derive(Debug, Clone, Default)]
pub struct OrientationEstimator {
    landmarks: LandmarkConfig,
}

impl OrientationEstimator {
    #[must_use]
    pub fn new(landmarks: LandmarkConfig) -> Self {
        Self { landmarks }
    }

    /// Estimate orientation for a single face.
    ///
    /// Frames with too few points, a missing designated role, or geometry
    /// that overflows to a non-finite ratio yield
    /// [`OrientationEstimate::INVALID`]; this never fails.
    pub fn estimate(&self, frame: &LandmarkFrame) -> OrientationEstimate {
        let Some(keypoints) = FaceKeypoints::resolve(frame, &self.landmarks) else {
            return OrientationEstimate::INVALID;
        };

        let orientation = Self::from_keypoints(&keypoints);
        if !orientation.is_finite() {
            return OrientationEstimate::INVALID;
        }

        OrientationEstimate { orientation, valid: true }
    }

    /// Geometry on already-resolved keypoints
    pub fn from_keypoints(k: &FaceKeypoints) -> Orientation {
        let eye_mid = k.left_eye_inner.midpoint(&k.right_eye_inner);

        let face_width = k.left_eye_outer.distance(&k.right_eye_outer);
        let mouth_width = k.mouth_left.distance(&k.mouth_right);
        let face_scale = face_width.max(mouth_width);

        let dx = k.nose_tip.x - eye_mid.x;
        let dy = k.nose_tip.y - eye_mid.y;

        let eye_slope = (k.right_eye_outer.y - k.left_eye_outer.y) / (k.right_eye_outer.x - k.left_eye_outer.x);
        // 0/0 only when both outer corners coincide
        let roll = if eye_slope.is_nan() { 0.0 } else { eye_slope.clamp(-1.0, 1.0) };

        Orientation::new(normalize(dx, face_width), normalize(dy, face_scale), roll)
    }
}

fn normalize(value: f64, scale: f64) -> f64 {
    if scale == 0.0 {
        0.0
    } else {
        value / scale
    }
}
