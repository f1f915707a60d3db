//! Detection loop timing, control and error containment, on tokio's paused clock


use attention_classifier::{
    classifier::AttentionKind,
    config::{Config, SchedulerConfig},
    provider::NullSink,
    scheduler::{DetectionScheduler, RecalibrationSignal, Visibility, VisibilitySignal},
    session::AttentionSession,
    synthetic::{FrameCounter, SyntheticFace},
    Error,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use test_helpers::{mean_interval, ms, CountingSink, MockProvider, StateLog, TestSource};
use tokio::time::{sleep, Instant};

fn scheduler() -> DetectionScheduler {
    DetectionScheduler::new(SchedulerConfig::default(), AttentionSession::default())
}

fn centred_provider() -> MockProvider {
    MockProvider::with_face(SyntheticFace::new(0.0, 0.0, 0.0).build())
}

fn assert_duration_near(actual: Duration, expected: Duration, tolerance: Duration) {
    let diff = if actual > expected { actual - expected } else { expected - actual };
    assert!(diff <= tolerance, "expected {expected:?} ± {tolerance:?}, got {actual:?}");
}

#[tokio::test(start_paused = true)]
async fn test_visible_cadence_compensates_for_slow_cycles() {
    let provider = centred_provider().with_delays(vec![ms(0), ms(35), ms(70), ms(15), ms(55), ms(80)]);
    let calls = provider.call_log();
    let log = StateLog::default();

    let handle = scheduler().start(FrameCounter::default(), provider, NullSink, log.callback()).await.unwrap();
    sleep(ms(10_050)).await;
    handle.shutdown().await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert!(calls.len() >= 95, "only {} cycles", calls.len());
    assert_duration_near(mean_interval(&calls), ms(100), ms(5));
    assert_eq!(log.len(), calls.len());
}

#[tokio::test(start_paused = true)]
async fn test_hidden_cadence() {
    let visibility = VisibilitySignal::new(Visibility::Hidden);
    let provider = centred_provider().with_delays(vec![ms(120), ms(10), ms(250), ms(60)]);
    let calls = provider.call_log();

    let handle = scheduler()
        .with_visibility(&visibility)
        .start(FrameCounter::default(), provider, NullSink, |_| {})
        .await
        .unwrap();
    sleep(ms(20_200)).await;
    handle.shutdown().await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert!(calls.len() >= 38, "only {} cycles", calls.len());
    assert_duration_near(mean_interval(&calls), ms(500), ms(10));
}

#[tokio::test(start_paused = true)]
async fn test_overrun_is_floored() {
    // Every cycle takes longer than the interval
    let provider = centred_provider().with_delays(vec![ms(250)]);
    let calls = provider.call_log();

    let handle = scheduler().start(FrameCounter::default(), provider, NullSink, |_| {}).await.unwrap();
    sleep(ms(3_000)).await;
    handle.shutdown().await.unwrap();

    let calls = calls.lock().unwrap().clone();
    // Each cycle is 250 ms of work plus the 10 ms floor
    assert_duration_near(mean_interval(&calls), ms(260), ms(5));
}

#[tokio::test(start_paused = true)]
async fn test_visibility_change_reschedules_immediately() {
    let visibility = VisibilitySignal::default();
    let provider = centred_provider();
    let calls = provider.call_log();

    let handle = scheduler()
        .with_visibility(&visibility)
        .start(FrameCounter::default(), provider, NullSink, |_| {})
        .await
        .unwrap();

    sleep(ms(1_050)).await;
    let visible_calls = calls.lock().unwrap().len();
    assert!((9..=11).contains(&visible_calls), "{visible_calls} visible cycles");

    visibility.set(Visibility::Hidden);
    sleep(ms(2_100)).await;
    let hidden_calls = calls.lock().unwrap().len() - visible_calls;
    assert!((3..=5).contains(&hidden_calls), "{hidden_calls} hidden cycles");

    // Back to visible: the next tick comes after the short interval, not the long one
    let switched_at = Instant::now();
    visibility.set(Visibility::Visible);
    sleep(ms(150)).await;
    let next = calls.lock().unwrap().iter().copied().find(|&t| t > switched_at);
    let next = next.expect("no cycle after becoming visible");
    assert_duration_near(next - switched_at, ms(100), ms(5));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_paused_tracking_skips_cycles() {
    let active = Arc::new(AtomicBool::new(false));
    let provider = centred_provider();
    let calls = provider.call_log();
    let log = StateLog::default();

    let flag = Arc::clone(&active);
    let handle = scheduler()
        .with_activity(move || flag.load(Ordering::SeqCst))
        .start(FrameCounter::default(), provider, NullSink, log.callback())
        .await
        .unwrap();

    sleep(ms(1_000)).await;
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(log.len(), 0);

    // Resumes on the next tick without a restart
    active.store(true, Ordering::SeqCst);
    sleep(ms(1_000)).await;
    assert!(log.len() >= 9);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_detector_errors_do_not_stop_the_loop() {
    let face = SyntheticFace::new(0.0, 0.0, 0.0).build();
    let provider = MockProvider::with_responder(move |call| match call {
        0 => Err(Error::Detector("Requested texture size [0x0] is invalid".to_string())),
        1 => Err(Error::ResourceNotReady("video element detached".to_string())),
        2 => Err(Error::Detector("WebGL context lost".to_string())),
        _ => Ok(vec![face.clone()]),
    });
    let calls = provider.call_log();
    let log = StateLog::default();

    let handle = scheduler().start(FrameCounter::default(), provider, NullSink, log.callback()).await.unwrap();
    sleep(ms(1_050)).await;
    handle.shutdown().await.unwrap();

    let calls = calls.lock().unwrap().len();
    assert!(calls >= 9);
    // Failed cycles deliver nothing
    assert_eq!(log.len(), calls - 3);
    assert!(log.all().iter().all(|s| s.state == AttentionKind::LookingAtScreen));
}

#[tokio::test(start_paused = true)]
async fn test_frame_source_errors_are_contained() {
    let source = TestSource::failing_at(vec![
        (0, Error::FrameSource("0x0 video".to_string())),
        (3, Error::FrameSource("decoder crashed".to_string())),
    ]);
    let log = StateLog::default();

    let handle = scheduler().start(source, centred_provider(), NullSink, log.callback()).await.unwrap();
    sleep(ms(1_050)).await;
    handle.shutdown().await.unwrap();

    assert!(log.len() >= 7);
}

#[tokio::test(start_paused = true)]
async fn test_empty_detections_report_no_face() {
    let provider = MockProvider::with_responder(|_| Ok(Vec::new()));
    let sink = CountingSink::default();
    let log = StateLog::default();

    let handle = scheduler().start(FrameCounter::default(), provider, sink.clone(), log.callback()).await.unwrap();
    sleep(ms(550)).await;
    handle.shutdown().await.unwrap();

    assert!(log.len() >= 4);
    assert!(log.all().iter().all(|s| s.state == AttentionKind::NoFace && s.confidence == 0.0));
    assert_eq!(sink.count(), log.len());
}

#[tokio::test(start_paused = true)]
async fn test_init_failure_is_fatal() {
    let provider = centred_provider().failing_init();
    let calls = provider.call_log();

    let result = scheduler().start(FrameCounter::default(), provider, NullSink, |_| {}).await;
    assert!(matches!(result, Err(Error::BackendInit(_))));

    sleep(ms(1_000)).await;
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_in_flight_result() {
    let provider = centred_provider().with_delays(vec![ms(300)]);
    let calls = provider.call_log();
    let sink = CountingSink::default();
    let log = StateLog::default();

    let handle = scheduler().start(FrameCounter::default(), provider, sink.clone(), log.callback()).await.unwrap();

    // First detection starts at 100 ms and would finish at 400 ms
    sleep(ms(150)).await;
    assert_eq!(calls.lock().unwrap().len(), 1);
    handle.cancel();

    sleep(ms(1_000)).await;
    assert!(handle.is_finished());
    assert_eq!(log.len(), 0);
    assert_eq!(sink.count(), 0);
    assert_eq!(calls.lock().unwrap().len(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent() {
    let log = StateLog::default();
    let handle = scheduler().start(FrameCounter::default(), centred_provider(), NullSink, log.callback()).await.unwrap();

    sleep(ms(350)).await;
    handle.cancel();
    handle.cancel();
    assert!(handle.is_cancelled());

    let delivered = log.len();
    sleep(ms(1_000)).await;
    handle.cancel();
    assert_eq!(log.len(), delivered);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_stops_the_loop() {
    let provider = centred_provider();
    let calls = provider.call_log();

    let handle = scheduler().start(FrameCounter::default(), provider, NullSink, |_| {}).await.unwrap();
    sleep(ms(250)).await;
    drop(handle);

    let stopped_at = calls.lock().unwrap().len();
    sleep(ms(1_000)).await;
    assert_eq!(calls.lock().unwrap().len(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn test_recalibration_signal_reaches_running_session() {
    // Neutral for the first 40 cycles, then a lasting new posture
    let upright = SyntheticFace::new(0.0, 0.0, 0.0).build();
    let turned = SyntheticFace::new(0.25, 0.0, 0.0).build();
    let provider = MockProvider::with_responder(move |call| {
        Ok(vec![if call < 40 { upright.clone() } else { turned.clone() }])
    });
    let recalibration = RecalibrationSignal::new();
    let log = StateLog::default();

    let handle = scheduler()
        .with_recalibration(&recalibration)
        .start(FrameCounter::default(), provider, NullSink, log.callback())
        .await
        .unwrap();

    sleep(ms(6_050)).await;
    assert_eq!(log.last().map(|s| s.state), Some(AttentionKind::AwayRight));

    assert_eq!(recalibration.trigger(), 1);
    sleep(ms(5_000)).await;
    let last = log.last().unwrap();
    assert_eq!(last.state, AttentionKind::LookingAtScreen);
    assert_eq!(last.confidence, 0.9);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_configured_intervals() {
    let mut config = Config::default();
    config.scheduler.visible_interval_ms = 40;
    config.scheduler.min_delay_ms = 5;
    let provider = centred_provider();
    let calls = provider.call_log();

    let handle = DetectionScheduler::new(config.scheduler.clone(), AttentionSession::new(&config).unwrap())
        .start(FrameCounter::default(), provider, NullSink, |_| {})
        .await
        .unwrap();
    sleep(ms(2_010)).await;
    handle.shutdown().await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_duration_near(mean_interval(&calls), ms(40), ms(2));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_detaches_signal_listeners() {
    let visibility = VisibilitySignal::default();
    let recalibration = RecalibrationSignal::new();

    let handle = scheduler()
        .with_visibility(&visibility)
        .with_recalibration(&recalibration)
        .start(FrameCounter::default(), centred_provider(), NullSink, |_| {})
        .await
        .unwrap();
    sleep(ms(250)).await;
    assert_eq!(visibility.listeners(), 1);
    assert_eq!(recalibration.listeners(), 1);

    handle.shutdown().await.unwrap();
    assert_eq!(visibility.listeners(), 0);
    assert_eq!(recalibration.trigger(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_detaches_signal_listeners() {
    let visibility = VisibilitySignal::default();
    let recalibration = RecalibrationSignal::new();

    let handle = scheduler()
        .with_visibility(&visibility)
        .with_recalibration(&recalibration)
        .start(FrameCounter::default(), centred_provider(), NullSink, |_| {})
        .await
        .unwrap();
    sleep(ms(250)).await;
    assert_eq!(recalibration.trigger(), 1);

    drop(handle);
    sleep(ms(50)).await;
    assert_eq!(visibility.listeners(), 0);
    assert_eq!(recalibration.trigger(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_start_leaves_no_listeners() {
    let visibility = VisibilitySignal::default();
    let recalibration = RecalibrationSignal::new();

    let result = scheduler()
        .with_visibility(&visibility)
        .with_recalibration(&recalibration)
        .start(FrameCounter::default(), centred_provider().failing_init(), NullSink, |_| {})
        .await;
    assert!(result.is_err());
    assert_eq!(visibility.listeners(), 0);
    assert_eq!(recalibration.listeners(), 0);
}
