//! Facial landmark data as delivered by the external detector.

use crate::config::LandmarkConfig;
use serde::{Deserialize, Serialize};

/// A single tracked facial point in image coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub const fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Euclidean distance in the image plane
    pub fn distance(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Planar midpoint of two points
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One detected face: an ordered, positionally indexed landmark collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<LandmarkPoint>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, if present with finite planar coordinates
    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied().filter(LandmarkPoint::is_finite)
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [LandmarkPoint] {
        &mut self.points
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkFrame {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self::new(points)
    }
}

/// The seven designated points the orientation estimate is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceKeypoints {
    pub left_eye_outer: LandmarkPoint,
    pub left_eye_inner: LandmarkPoint,
    pub right_eye_inner: LandmarkPoint,
    pub right_eye_outer: LandmarkPoint,
    pub nose_tip: LandmarkPoint,
    pub mouth_left: LandmarkPoint,
    pub mouth_right: LandmarkPoint,
}

impl FaceKeypoints {
    /// Pull the designated roles out of a frame.
    ///
    /// Returns `None` when the frame is smaller than `config.min_points` or any
    /// role is missing.
    pub fn resolve(frame: &LandmarkFrame, config: &LandmarkConfig) -> Option<Self> {
        if frame.len() < config.min_points {
            return None;
        }

        Some(Self {
            left_eye_outer: frame.point(config.left_eye_outer)?,
            left_eye_inner: frame.point(config.left_eye_inner)?,
            right_eye_inner: frame.point(config.right_eye_inner)?,
            right_eye_outer: frame.point(config.right_eye_outer)?,
            nose_tip: frame.point(config.nose_tip)?,
            mouth_left: frame.point(config.mouth_left)?,
            mouth_right: frame.point(config.mouth_right)?,
        })
    }
}
