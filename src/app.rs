//! Demo application: drives the detection loop from a synthetic or recorded
//! landmark source and reports attention state transitions.

use crate::{
    classifier::{AttentionKind, AttentionState},
    config::Config,
    provider::{LandmarkProvider, NullSink},
    replay::{Recording, ReplayProvider},
    scheduler::{DetectionScheduler, RecalibrationSignal, Visibility, VisibilitySignal},
    session::AttentionSession,
    synthetic::{FrameCounter, ScriptedProvider},
    Error, Result,
};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};

/// Where faces come from
#[derive(Debug, Clone, PartialEq)]
pub enum FaceSource {
    /// Built-in head motion script with optional landmark jitter (pixels)
    Scripted { noise: f64, seed: u64 },
    /// YAML recording of detector output
    Replay(PathBuf),
}

/// Demo application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Engine configuration
    pub engine: Config,
    pub face_source: FaceSource,
    /// Stop after this long; run until interrupted otherwise
    pub duration: Option<Duration>,
    /// Switch the host to hidden after this long
    pub hide_after: Option<Duration>,
    /// Request a recalibration after this long
    pub recalibrate_at: Option<Duration>,
    /// Print every state, not just transitions
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: Config::default(),
            face_source: FaceSource::Scripted { noise: 0.0, seed: 0 },
            duration: None,
            hide_after: None,
            recalibrate_at: None,
            verbose: false,
        }
    }
}

/// What a run observed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub cycles: u64,
    pub transitions: u64,
    /// Cycles spent in any away state
    pub away: u64,
    pub counts: BTreeMap<String, u64>,
    pub last: Option<AttentionState>,
}

impl RunSummary {
    /// Count a state; returns true if it differs from the previous one
    pub fn record(&mut self, state: AttentionState) -> bool {
        self.cycles += 1;
        *self.counts.entry(state.state.to_string()).or_default() += 1;
        if state.state.is_away() {
            self.away += 1;
        }

        let changed = self.last.map_or(true, |last| last.state != state.state);
        if changed {
            self.transitions += 1;
        }
        self.last = Some(state);
        changed
    }

    /// Cycles classified as `kind`
    pub fn count(&self, kind: AttentionKind) -> u64 {
        self.counts.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// Main application
pub struct AttentionApp {
    config: AppConfig,
    visibility: VisibilitySignal,
    recalibration: RecalibrationSignal,
}

impl AttentionApp {
    /// Create the application
    ///
    /// # Errors
    ///
    /// Returns an error if the engine configuration is invalid
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing attention classifier demo");
        config.engine.validate()?;

        Ok(Self {
            config,
            visibility: VisibilitySignal::default(),
            recalibration: RecalibrationSignal::new(),
        })
    }

    /// Run until the configured duration elapses, Ctrl-C, or the loop ends
    ///
    /// # Errors
    ///
    /// Returns an error if the face source cannot be loaded or initialized
    pub async fn run(&self) -> Result<RunSummary> {
        match &self.config.face_source {
            FaceSource::Scripted { noise, seed } => {
                info!("Using synthetic head motion script");
                let provider = ScriptedProvider::new(ScriptedProvider::demo_script())?.with_noise(*noise, *seed);
                self.drive(provider).await
            }
            FaceSource::Replay(path) => {
                info!("Loading recording: {}", path.display());
                let recording = Recording::from_file(path)
                    .map_err(|e| Error::BackendInit(format!("Failed to load {}: {}", path.display(), e)))?;
                self.drive(ReplayProvider::new(recording)).await
            }
        }
    }

    async fn drive<P: LandmarkProvider<u64>>(&self, provider: P) -> Result<RunSummary> {
        let session = AttentionSession::new(&self.config.engine)?;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = DetectionScheduler::new(self.config.engine.scheduler.clone(), session)
            .with_visibility(&self.visibility)
            .with_recalibration(&self.recalibration)
            .start(FrameCounter::default(), provider, NullSink, move |state| {
                let _ = tx.send(state);
            })
            .await?;

        let started = Instant::now();
        let at = |offset: Option<Duration>| offset.map(|d| started + d);
        let end = at(self.config.duration);
        let mut hide = at(self.config.hide_after);
        let mut recalibrate = at(self.config.recalibrate_at);

        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        let mut summary = RunSummary::default();
        loop {
            tokio::select! {
                result = &mut interrupted => {
                    if let Err(e) = result {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                    }
                    info!("Exit requested by user");
                    break;
                }
                () = sleep_until(end) => {
                    info!("Run duration reached");
                    break;
                }
                () = sleep_until(hide) => {
                    info!("Host hidden, slowing detection cadence");
                    self.visibility.set(Visibility::Hidden);
                    hide = None;
                }
                () = sleep_until(recalibrate) => {
                    let sessions = self.recalibration.trigger();
                    info!("Recalibration requested ({} sessions)", sessions);
                    recalibrate = None;
                }
                state = rx.recv() => match state {
                    Some(state) => {
                        let elapsed = started.elapsed();
                        if summary.record(state) || self.config.verbose {
                            report(elapsed, &state);
                        }
                    }
                    None => break,
                },
            }
        }

        handle.shutdown().await?;
        info!(
            "Application shutting down: {} cycles, {} transitions, {} away",
            summary.cycles, summary.transitions, summary.away
        );
        Ok(summary)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn report(elapsed: Duration, state: &AttentionState) {
    println!(
        "{:>7.2}s  {:<18} confidence {:.2}  yaw {:+.3}  pitch {:+.3}  roll {:+.3}",
        elapsed.as_secs_f64(),
        state.state,
        state.confidence,
        state.yaw,
        state.pitch,
        state.roll
    );
}
