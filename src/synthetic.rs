//! Synthetic MediaPipe-style faces for demos, tests and benchmarks.
//!
//! [`SyntheticFace`] lays out a 468-point mesh whose designated landmarks
//! produce exactly the requested yaw, pitch and roll ratios.
//! [`ScriptedProvider`] plays back a timed sequence of poses as a
//! [`LandmarkProvider`].

use crate::{
    constants::{
        FACE_MESH_LANDMARKS, LEFT_EYE_INNER_INDEX, LEFT_EYE_OUTER_INDEX, MOUTH_LEFT_INDEX, MOUTH_RIGHT_INDEX,
        NOSE_TIP_INDEX, RIGHT_EYE_INNER_INDEX, RIGHT_EYE_OUTER_INDEX,
    },
    landmarks::{LandmarkFrame, LandmarkPoint},
    orientation::Orientation,
    provider::{FrameSource, LandmarkProvider},
    Error, Result,
};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tokio::time::Instant;

/// Builder for a synthetic face mesh
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFace {
    /// Image position of the inner-eye midpoint
    pub center: (f64, f64),
    /// Distance between the outer eye corners in pixels
    pub eye_span: f64,
    pub orientation: Orientation,
}

impl SyntheticFace {
    #[must_use]
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self {
            center: (320.0, 240.0),
            eye_span: 80.0,
            orientation: Orientation::new(yaw, pitch, roll),
        }
    }

    pub fn from_orientation(orientation: Orientation) -> Self {
        Self::new(orientation.yaw, orientation.pitch, orientation.roll)
    }

    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = (x, y);
        self
    }

    pub fn with_eye_span(mut self, eye_span: f64) -> Self {
        self.eye_span = eye_span;
        self
    }

    /// Build the mesh
    pub fn build(&self) -> LandmarkFrame {
        let (cx, cy) = self.center;
        let span = self.eye_span;
        let half = span / 2.0;

        // Filler points on a ring around the face
        let mut points: Vec<LandmarkPoint> = (0..FACE_MESH_LANDMARKS)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / FACE_MESH_LANDMARKS as f64;
                LandmarkPoint::with_depth(cx + 0.9 * span * angle.cos(), cy + 0.9 * span * angle.sin(), 0.0)
            })
            .collect();

        // Eye line tilted so that its slope equals roll
        let theta = self.orientation.roll.clamp(-1.0, 1.0).atan();
        let (ux, uy) = (theta.cos(), theta.sin());
        let along = |d: f64| LandmarkPoint::new(cx + d * ux, cy + d * uy);

        points[LEFT_EYE_OUTER_INDEX] = along(-half);
        points[LEFT_EYE_INNER_INDEX] = along(-0.3 * half);
        points[RIGHT_EYE_INNER_INDEX] = along(0.3 * half);
        points[RIGHT_EYE_OUTER_INDEX] = along(half);

        // Mouth narrower than the eyes so the eye span is the pitch scale too
        points[MOUTH_LEFT_INDEX] = LandmarkPoint::new(cx - 0.3 * span, cy + 0.6 * span);
        points[MOUTH_RIGHT_INDEX] = LandmarkPoint::new(cx + 0.3 * span, cy + 0.6 * span);

        points[NOSE_TIP_INDEX] = LandmarkPoint::with_depth(
            cx + self.orientation.yaw * span,
            cy + self.orientation.pitch * span,
            -0.05 * span,
        );

        LandmarkFrame::new(points)
    }

    /// Build the mesh with uniform per-point noise of up to `amplitude` pixels
    pub fn build_noisy<R: Rng>(&self, rng: &mut R, amplitude: f64) -> LandmarkFrame {
        let mut frame = self.build();
        if amplitude > 0.0 {
            for point in frame.points_mut() {
                point.x += rng.gen_range(-amplitude..=amplitude);
                point.y += rng.gen_range(-amplitude..=amplitude);
            }
        }
        frame
    }
}

/// One step of a pose script; `None` means no face in view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSegment {
    pub duration: Duration,
    pub pose: Option<Orientation>,
}

impl PoseSegment {
    pub fn face(duration: Duration, yaw: f64, pitch: f64) -> Self {
        Self {
            duration,
            pose: Some(Orientation::new(yaw, pitch, 0.0)),
        }
    }

    pub fn absent(duration: Duration) -> Self {
        Self { duration, pose: None }
    }
}

/// Plays a looping pose script against the runtime clock
pub struct ScriptedProvider {
    script: Vec<PoseSegment>,
    started: Option<Instant>,
    noise: f64,
    rng: StdRng,
}

impl ScriptedProvider {
    /// # Errors
    ///
    /// Returns an error if the script is empty or lasts zero time
    pub fn new(script: Vec<PoseSegment>) -> Result<Self> {
        if script.iter().map(|s| s.duration).sum::<Duration>().is_zero() {
            return Err(Error::InvalidInput("Pose script must have a non-zero duration".to_string()));
        }
        Ok(Self {
            script,
            started: None,
            noise: 0.0,
            rng: StdRng::seed_from_u64(0),
        })
    }

    /// A short tour: centered, each away direction, and a missing face
    pub fn demo_script() -> Vec<PoseSegment> {
        let secs = Duration::from_secs_f64;
        vec![
            PoseSegment::face(secs(5.0), 0.0, 0.0),
            PoseSegment::face(secs(2.0), 0.25, 0.0),
            PoseSegment::face(secs(2.0), 0.02, 0.01),
            PoseSegment::face(secs(2.0), 0.0, 0.2),
            PoseSegment::face(secs(1.5), -0.3, 0.0),
            PoseSegment::absent(secs(1.5)),
            PoseSegment::face(secs(2.0), 0.0, -0.15),
            PoseSegment::face(secs(2.0), 0.09, 0.0),
        ]
    }

    /// Add landmark jitter of up to `amplitude` pixels, seeded for reproducibility
    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise = amplitude;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Pose scheduled at `elapsed` into the (looping) script
    pub fn pose_at(&self, elapsed: Duration) -> Option<Orientation> {
        let total: Duration = self.script.iter().map(|s| s.duration).sum();
        let mut offset = Duration::from_nanos((elapsed.as_nanos() % total.as_nanos()) as u64);

        for segment in &self.script {
            if offset < segment.duration {
                return segment.pose;
            }
            offset -= segment.duration;
        }
        None
    }
}

impl<F: Send + 'static> LandmarkProvider<F> for ScriptedProvider {
    async fn initialize(&mut self) -> Result<()> {
        info!("Scripted landmark provider ready ({} segments)", self.script.len());
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn estimate_faces(&mut self, _frame: F) -> Result<Vec<LandmarkFrame>> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let faces = match self.pose_at(started.elapsed()) {
            Some(pose) => vec![SyntheticFace::from_orientation(pose).build_noisy(&mut self.rng, self.noise)],
            None => Vec::new(),
        };
        Ok(faces)
    }
}

/// Frame source that always has a frame: a running frame counter
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    next: u64,
}

impl FrameSource for FrameCounter {
    type Frame = u64;

    fn grab(&mut self) -> Result<Option<u64>> {
        let frame = self.next;
        self.next += 1;
        Ok(Some(frame))
    }
}
