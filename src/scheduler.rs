//! Self-pacing detection loop.
//!
//! One cooperative task per session drives estimator, filter, calibrator and
//! classifier once per tick. Cycles never overlap, so the session state needs
//! no locking. The loop:
//! - ticks every 100 ms while visible and every 500 ms while hidden
//! - subtracts measured timer overrun from the next delay (floored)
//! - reschedules immediately when visibility changes
//! - skips work, but keeps ticking, while the activity check says paused
//! - swallows transient detector errors and logs the rest without stopping
//! - discards any in-flight result once cancelled

use crate::{
    classifier::AttentionState,
    config::SchedulerConfig,
    provider::{FrameSource, LandmarkProvider, RenderSink},
    session::AttentionSession,
    Error, Result,
};
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{self, Instant},
};

/// Pending recalibration requests kept per subscriber
const RECALIBRATION_CAPACITY: usize = 4;

/// Host page visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Host-side publisher of visibility changes
#[derive(Debug)]
pub struct VisibilitySignal {
    tx: watch::Sender<Visibility>,
}

impl VisibilitySignal {
    pub fn new(initial: Visibility) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a visibility value; repeats of the current value are ignored
    pub fn set(&self, visibility: Visibility) {
        self.tx.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    pub fn get(&self) -> Visibility {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }

    /// Detection loops currently following this signal
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new(Visibility::Visible)
    }
}

/// Fire-and-forget recalibration broadcast, observed by every subscribed session
#[derive(Debug, Clone)]
pub struct RecalibrationSignal {
    tx: broadcast::Sender<()>,
}

impl RecalibrationSignal {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(RECALIBRATION_CAPACITY);
        Self { tx }
    }

    /// Ask all active sessions to recalibrate. Returns how many were reached.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Sessions that would observe a trigger
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RecalibrationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Predicate deciding whether a tick should do any work
pub type ActivityCheck = Box<dyn Fn() -> bool + Send + Sync>;

/// Configures and launches the detection loop for one session
pub struct DetectionScheduler {
    config: SchedulerConfig,
    session: AttentionSession,
    visibility: Option<watch::Receiver<Visibility>>,
    recalibration: Option<broadcast::Receiver<()>>,
    is_active: Option<ActivityCheck>,
}

impl DetectionScheduler {
    #[must_use]
    pub fn new(config: SchedulerConfig, session: AttentionSession) -> Self {
        Self {
            config,
            session,
            visibility: None,
            recalibration: None,
            is_active: None,
        }
    }

    /// Follow a visibility signal; without one the host counts as visible
    pub fn with_visibility(mut self, signal: &VisibilitySignal) -> Self {
        self.visibility = Some(signal.subscribe());
        self
    }

    pub fn with_recalibration(mut self, signal: &RecalibrationSignal) -> Self {
        self.recalibration = Some(signal.subscribe());
        self
    }

    /// Pause classification whenever `is_active` returns false
    pub fn with_activity<F>(mut self, is_active: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_active = Some(Box::new(is_active));
        self
    }

    /// Initialize the provider and spawn the loop on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if its backend fails to initialize; no
    /// loop is started in that case.
    pub async fn start<S, P, R, C>(self, source: S, mut provider: P, sink: R, on_state: C) -> Result<DetectionHandle>
    where
        S: FrameSource,
        P: LandmarkProvider<S::Frame>,
        R: RenderSink,
        C: FnMut(AttentionState) + Send + 'static,
    {
        if let Err(e) = provider.initialize().await {
            error!("Failed to initialize landmark detector: {}", e);
            return Err(e);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let current_visibility = self.visibility.as_ref().map_or(Visibility::Visible, |rx| *rx.borrow());

        info!(
            "Starting detection loop ({:?} visible, {:?} hidden)",
            self.config.visible_interval(),
            self.config.hidden_interval()
        );

        let detection_loop = DetectionLoop {
            stats: CycleStats::new(self.config.status_log_interval()),
            config: self.config,
            session: self.session,
            source,
            provider,
            sink,
            on_state,
            is_active: self.is_active,
            visibility: self.visibility,
            current_visibility,
            recalibration: self.recalibration,
            cancel: cancel_rx,
        };

        Ok(DetectionHandle {
            cancel: cancel_tx,
            task: Some(tokio::spawn(detection_loop.run())),
        })
    }
}

/// Control handle for a running detection loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct DetectionHandle {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl DetectionHandle {
    /// Stop the loop. Idempotent; results still in flight are discarded.
    pub fn cancel(&self) {
        if !self.cancel.send_replace(true) {
            info!("Cancelling detection loop");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop task to exit
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel();
        match self.task.take() {
            Some(task) => task.await.map_err(|e| Error::TaskJoin(e.to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for DetectionHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Next delay after compensating for how late the previous tick ran.
///
/// `elapsed` is the time since the previous tick was scheduled and `requested`
/// the delay asked for then; anything beyond it is overrun.
pub(crate) fn compensated_delay(nominal: Duration, elapsed: Duration, requested: Duration, floor: Duration) -> Duration {
    let overrun = elapsed.saturating_sub(requested);
    nominal.saturating_sub(overrun).max(floor)
}

struct CycleStats {
    interval: Duration,
    window_start: Instant,
    frames: u64,
    faces: u64,
    total: u64,
}

impl CycleStats {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
            faces: 0,
            total: 0,
        }
    }

    /// Count one processed frame; returns the status line when one is due
    fn record(&mut self, faces: usize) -> Option<String> {
        self.frames += 1;
        self.total += 1;
        self.faces += faces as u64;

        let elapsed = self.window_start.elapsed();
        if elapsed < self.interval {
            return None;
        }

        let line = format!(
            "Face detection running: {} frames processed, {} faces detected in the last {:.1}s",
            self.frames,
            self.faces,
            elapsed.as_secs_f64()
        );
        self.window_start = Instant::now();
        self.frames = 0;
        self.faces = 0;
        Some(line)
    }
}

struct DetectionLoop<S, P, R, C> {
    config: SchedulerConfig,
    session: AttentionSession,
    source: S,
    provider: P,
    sink: R,
    on_state: C,
    is_active: Option<ActivityCheck>,
    visibility: Option<watch::Receiver<Visibility>>,
    current_visibility: Visibility,
    recalibration: Option<broadcast::Receiver<()>>,
    cancel: watch::Receiver<bool>,
    stats: CycleStats,
}

impl<S, P, R, C> DetectionLoop<S, P, R, C>
where
    S: FrameSource,
    P: LandmarkProvider<S::Frame>,
    R: RenderSink,
    C: FnMut(AttentionState) + Send + 'static,
{
    async fn run(mut self) {
        let mut requested = self.nominal_interval();
        let mut scheduled_at = Instant::now();

        loop {
            let deadline = scheduled_at + requested;

            tokio::select! {
                biased;
                _ = self.cancel.changed() => break,
                request = next_recalibration(&mut self.recalibration) => {
                    if request {
                        self.session.recalibrate();
                    } else {
                        debug!("Recalibration signal closed");
                        self.recalibration = None;
                    }
                    continue;
                }
                change = next_visibility(&mut self.visibility) => {
                    match change {
                        Some(visibility) if visibility != self.current_visibility => {
                            self.current_visibility = visibility;
                            requested = self.nominal_interval();
                            scheduled_at = Instant::now();
                            debug!("Visibility now {:?}, ticking every {:?}", visibility, requested);
                        }
                        Some(_) => {}
                        None => {
                            debug!("Visibility signal closed, keeping {:?} cadence", self.current_visibility);
                            self.visibility = None;
                        }
                    }
                    continue;
                }
                () = time::sleep_until(deadline) => {}
            }

            if self.is_cancelled() {
                break;
            }
            self.tick().await;
            if self.is_cancelled() {
                break;
            }

            let now = Instant::now();
            let elapsed = now.saturating_duration_since(scheduled_at);
            requested = compensated_delay(self.nominal_interval(), elapsed, requested, self.config.min_delay());
            scheduled_at = now;
        }

        info!("Detection loop stopped after {} cycles", self.stats.total);
    }

    async fn tick(&mut self) {
        if let Some(is_active) = &self.is_active {
            if !is_active() {
                trace!("Tracking paused, skipping cycle");
                return;
            }
        }

        match self.detect().await {
            Ok(Some(state)) => (self.on_state)(state),
            Ok(None) => {}
            Err(e) if e.is_transient() => debug!("Suppressed transient detection error: {}", e),
            Err(e) => error!("Detection error: {}", e),
        }
    }

    async fn detect(&mut self) -> Result<Option<AttentionState>> {
        let Some(frame) = self.source.grab()? else {
            return Ok(None);
        };

        let faces = tokio::select! {
            biased;
            _ = self.cancel.changed() => return Ok(None),
            faces = self.provider.estimate_faces(frame) => faces?,
        };

        // Cancelled while the detector was running
        if self.is_cancelled() {
            return Ok(None);
        }

        let face = faces.first();
        let state = self.session.process(face);
        self.sink.render(face, &state);
        if let Some(line) = self.stats.record(faces.len()) {
            info!("{}", line);
        }

        Ok(Some(state))
    }

    fn nominal_interval(&self) -> Duration {
        match self.current_visibility {
            Visibility::Visible => self.config.visible_interval(),
            Visibility::Hidden => self.config.hidden_interval(),
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.cancel.has_changed().is_err()
    }
}

async fn next_recalibration(rx: &mut Option<broadcast::Receiver<()>>) -> bool {
    match rx {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => true,
            Err(broadcast::error::RecvError::Closed) => false,
        },
        None => std::future::pending().await,
    }
}

async fn next_visibility(rx: &mut Option<watch::Receiver<Visibility>>) -> Option<Visibility> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}
