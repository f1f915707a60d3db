//! Real-time attention classification from facial landmarks.
//!
//! Given the landmark mesh of a face (as produced by a MediaPipe-style
//! detector), the engine decides each cycle whether the user is looking at the
//! screen or away in one of four directions, with a confidence in [0, 1].
//!
//! The classification pipeline consists of:
//! 1. Orientation estimation: scale-invariant yaw/pitch/roll ratios from seven landmarks
//! 2. Temporal smoothing with a per-axis moving median
//! 3. Baseline calibration against the user's neutral pose
//! 4. Threshold classification with dead zones
//!
//! A [`scheduler::DetectionScheduler`] runs the pipeline on a self-pacing
//! tokio task that adapts its cadence to host visibility.
//!
//! # Examples
//!
//! ## Classifying a single frame
//!
//! ```
//! use attention_classifier::{classifier::AttentionKind, session::AttentionSession, synthetic::SyntheticFace};
//!
//! let mut session = AttentionSession::default();
//! let face = SyntheticFace::new(0.0, 0.0, 0.0).build();
//!
//! let state = session.process(Some(&face));
//! assert_eq!(state.state, AttentionKind::LookingAtScreen);
//! assert_eq!(session.process(None).state, AttentionKind::NoFace);
//! ```
//!
//! ## Running the detection loop
//!
//! ```no_run
//! use attention_classifier::{
//!     config::Config,
//!     provider::NullSink,
//!     scheduler::{DetectionScheduler, VisibilitySignal},
//!     session::AttentionSession,
//!     synthetic::{FrameCounter, ScriptedProvider},
//! };
//!
//! # async fn demo() -> attention_classifier::Result<()> {
//! let config = Config::default();
//! let visibility = VisibilitySignal::default();
//! let provider = ScriptedProvider::new(ScriptedProvider::demo_script())?;
//!
//! let handle = DetectionScheduler::new(config.scheduler.clone(), AttentionSession::new(&config)?)
//!     .with_visibility(&visibility)
//!     .start(FrameCounter::default(), provider, NullSink, |state| {
//!         println!("{} ({:.2})", state.state, state.confidence);
//!     })
//!     .await?;
//!
//! tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

/// Facial landmark frames and the designated keypoints
pub mod landmarks;

/// Head orientation proxies from landmark geometry
pub mod orientation;

/// Temporal smoothing filters
pub mod filters;

/// Neutral pose auto-calibration
pub mod calibration;

/// Threshold-based attention classification
pub mod classifier;

/// Per-session pipeline state
pub mod session;

/// Detection loop scheduling, visibility and recalibration signals
pub mod scheduler;

/// Frame source, landmark provider and render sink seams
pub mod provider;

/// Synthetic faces and scripted head motion
pub mod synthetic;

/// Recorded landmark playback
pub mod replay;

/// Error types and result handling
pub mod error;

/// Demo application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
