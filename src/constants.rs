//! Constants used throughout the engine

/// Minimum number of landmarks a face must carry to be classified
pub const MIN_FACE_LANDMARKS: usize = 400;

/// Number of points in a full MediaPipe FaceMesh
pub const FACE_MESH_LANDMARKS: usize = 468;

/// MediaPipe FaceMesh indices of the designated landmark roles
pub const LEFT_EYE_OUTER_INDEX: usize = 33;
pub const LEFT_EYE_INNER_INDEX: usize = 133;
pub const RIGHT_EYE_INNER_INDEX: usize = 362;
pub const RIGHT_EYE_OUTER_INDEX: usize = 263;
pub const NOSE_TIP_INDEX: usize = 1;
pub const MOUTH_LEFT_INDEX: usize = 61;
pub const MOUTH_RIGHT_INDEX: usize = 291;

/// Moving median length per axis
pub const SMOOTHING_WINDOW: usize = 10;

/// Valid frames used to auto-calibrate the neutral pose
pub const BASELINE_WARMUP_FRAMES: u32 = 30;

/// Weight kept from the previous baseline on each warm-up blend
pub const BASELINE_RETAIN_WEIGHT: f64 = 0.8;

/// Neutral bands after normalization
pub const DEAD_ZONE_YAW: f64 = 0.06;
pub const DEAD_ZONE_PITCH: f64 = 0.05;

/// Beyond these the user is looking away
pub const YAW_AWAY_THRESHOLD: f64 = 0.14;
pub const PITCH_UP_THRESHOLD: f64 = 0.10;
pub const PITCH_DOWN_THRESHOLD: f64 = 0.10;

/// Confidence ramp past an away threshold
pub const AWAY_CONFIDENCE_BASE: f64 = 0.7;
pub const AWAY_CONFIDENCE_GAIN: f64 = 3.0;

/// Confidence when both axes sit inside their dead zones
pub const CENTERED_CONFIDENCE: f64 = 0.9;

/// Confidence for poses between a dead zone and an away threshold
pub const AMBIGUOUS_CONFIDENCE: f64 = 0.7;

/// Detection cadence in milliseconds
pub const VISIBLE_INTERVAL_MS: u64 = 100;
pub const HIDDEN_INTERVAL_MS: u64 = 500;

/// Lower bound on a drift-compensated delay
pub const MIN_TICK_DELAY_MS: u64 = 10;

/// Period of the "detection running" status line
pub const STATUS_LOG_INTERVAL_MS: u64 = 5000;
