//! Tests for background estimation and result ordering


use face_orientation_capture::{
    app::CaptureApp,
    camera::Frame,
    config::Config,
    estimator::PoseEstimator,
    orchestrator::{CaptureOrchestrator, DiscardReason, TickOutcome},
    pose::{Direction, PoseResult, PoseTarget, RotationState},
    trace::{PoseTrace, TraceSegment},
    worker::{PoseMessage, Ticket},
    Error, Result,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use test_helpers::{config_with_hold, tour, MockCamera, MockRegistrationClient, MockReply, ScriptedEstimator};

struct SlowEstimator {
    delay: Duration,
}

impl PoseEstimator for SlowEstimator {
    fn estimate(&self, _frame: &Frame) -> Result<PoseResult> {
        thread::sleep(self.delay);
        Ok(PoseResult::detected(RotationState::default()))
    }
}

/// Panics on its first estimate, then replays the trace
struct CrashOnce {
    inner: ScriptedEstimator,
    crashed: AtomicBool,
}

impl CrashOnce {
    fn new(trace: Arc<PoseTrace>) -> Self {
        Self {
            inner: ScriptedEstimator::new(trace),
            crashed: AtomicBool::new(false),
        }
    }
}

impl PoseEstimator for CrashOnce {
    fn estimate(&self, frame: &Frame) -> Result<PoseResult> {
        if !self.crashed.swap(true, Ordering::SeqCst) {
            panic!("pose model crashed on frame {}", frame.seq);
        }
        self.inner.estimate(frame)
    }
}

fn front_message(ticket: Ticket, frame: Frame) -> PoseMessage {
    PoseMessage {
        ticket,
        frame,
        result: Ok(PoseResult::detected(RotationState::default())),
    }
}

fn started(required_ms: u64) -> (CaptureOrchestrator, Arc<PoseTrace>) {
    let trace = tour(4000);
    let mut orchestrator =
        CaptureOrchestrator::new(&config_with_hold(required_ms), Arc::new(ScriptedEstimator::new(Arc::clone(&trace))));
    orchestrator.start_camera(Box::new(MockCamera::new(Arc::clone(&trace)))).unwrap();
    (orchestrator, trace)
}

#[test]
fn test_app_run_through_worker() {
    let trace = tour(4000);
    let mut app = CaptureApp::new(Config::default(), Arc::new(ScriptedEstimator::new(Arc::clone(&trace)))).unwrap();

    let summary = app.run(Box::new(MockCamera::new(Arc::clone(&trace)))).unwrap();
    assert_eq!(summary.captured, Direction::ALL.to_vec());
    assert_eq!(summary.frames, 381);
    assert_eq!(summary.evaluated, 381);
    assert_eq!(summary.discarded, 0);
    assert_eq!(summary.timed_out, 0);
    assert_eq!(app.orchestrator().state(), PoseTarget::Completed);

    let client = MockRegistrationClient::new(MockReply::Success);
    assert!(app.confirm(&client, "01012345678").is_ok());
    assert_eq!(client.submission_count(), 1);
}

#[test]
fn test_app_restart_and_rerun() {
    let trace = tour(500);
    let mut app = CaptureApp::new(config_with_hold(300), Arc::new(ScriptedEstimator::new(Arc::clone(&trace)))).unwrap();

    app.run(Box::new(MockCamera::new(Arc::clone(&trace)))).unwrap();
    assert_eq!(app.orchestrator().state(), PoseTarget::Completed);

    // A second run needs a restart first
    assert!(matches!(
        app.run(Box::new(MockCamera::new(Arc::clone(&trace)))),
        Err(Error::InvalidTransition(_))
    ));

    app.restart();
    let summary = app.run(Box::new(MockCamera::new(trace))).unwrap();
    assert_eq!(summary.captured.len(), 5);
}

#[test]
fn test_app_rejects_invalid_config() {
    let mut config = Config::default();
    config.stability.required_ms = 0;
    let result = CaptureApp::new(config, Arc::new(ScriptedEstimator::new(tour(500))));
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_slow_estimates_time_out_without_capturing() {
    let trace = Arc::new(PoseTrace::new(vec![TraceSegment::hold(500, 0.0, 0.0, 0.0)]));
    let mut config = config_with_hold(3000);
    config.capture.estimation_timeout_ms = 1;
    let mut app = CaptureApp::new(
        config,
        Arc::new(SlowEstimator {
            delay: Duration::from_millis(100),
        }),
    )
    .unwrap();

    let summary = app.run(Box::new(MockCamera::new(trace))).unwrap();
    assert!(summary.timed_out >= 1);
    assert!(summary.captured.is_empty());
    assert_eq!(app.orchestrator().state(), PoseTarget::Front);
}

#[test]
fn test_superseded_target_is_discarded() {
    let (mut orchestrator, _trace) = started(3000);
    let frame = orchestrator.read_frame().unwrap();
    let ticket = orchestrator.admit(&frame).unwrap();
    assert_eq!(ticket.target, PoseTarget::Front);

    // Front gets captured while the estimate is still in flight
    orchestrator.pose_stable(PoseTarget::Front, &frame).unwrap();
    assert_eq!(orchestrator.state(), PoseTarget::Left);

    let outcome = orchestrator.apply(front_message(ticket, frame)).unwrap();
    assert_eq!(outcome, TickOutcome::Discarded(DiscardReason::SupersededTarget));
    assert_eq!(orchestrator.store().len(), 1);
    assert!(!orchestrator.is_pending());
}

#[test]
fn test_out_of_order_result_is_discarded() {
    let (mut orchestrator, _trace) = started(3000);
    let mut frames = Vec::new();
    for _ in 0..6 {
        frames.push(orchestrator.read_frame().unwrap());
    }

    let newest = frames.pop().unwrap();
    let ticket = orchestrator.admit(&newest).unwrap();
    assert!(matches!(
        orchestrator.apply(front_message(ticket, newest)).unwrap(),
        TickOutcome::Evaluated(_)
    ));

    let older = frames.pop().unwrap();
    let stale = Ticket {
        session: orchestrator.session(),
        seq: older.seq,
        target: PoseTarget::Front,
        at: older.timestamp,
    };
    let outcome = orchestrator.apply(front_message(stale, older)).unwrap();
    assert_eq!(outcome, TickOutcome::Discarded(DiscardReason::OutOfOrder));
}

#[test]
fn test_stop_camera_discards_in_flight() {
    let (mut orchestrator, _trace) = started(3000);
    let frame = orchestrator.read_frame().unwrap();
    let ticket = orchestrator.admit(&frame).unwrap();

    orchestrator.stop_camera();
    assert!(!orchestrator.is_camera_open());
    assert!(!orchestrator.is_pending());

    let outcome = orchestrator.apply(front_message(ticket, frame)).unwrap();
    assert_eq!(outcome, TickOutcome::Discarded(DiscardReason::StaleSession));
    assert_eq!(orchestrator.state(), PoseTarget::Front);
}

#[test]
fn test_no_admission_outside_capturing_states() {
    let trace = tour(500);
    let mut orchestrator =
        CaptureOrchestrator::new(&Config::default(), Arc::new(ScriptedEstimator::new(Arc::clone(&trace))));
    let frame = Frame::new(0, Duration::ZERO, image::RgbImage::new(4, 4));
    assert!(orchestrator.admit(&frame).is_none());
    assert_eq!(orchestrator.evaluate_frame(frame).unwrap(), TickOutcome::Skipped);
}

#[test]
fn test_worker_crash_releases_camera() {
    let trace = tour(500);
    let mut app = CaptureApp::new(config_with_hold(300), Arc::new(CrashOnce::new(Arc::clone(&trace)))).unwrap();
    let camera = MockCamera::new(Arc::clone(&trace));
    let closes = Arc::clone(&camera.closes);

    assert!(matches!(app.run(Box::new(camera)), Err(Error::Worker(_))));
    assert!(!app.orchestrator().is_camera_open());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(app.orchestrator().state(), PoseTarget::Front);
    assert!(app.orchestrator().store().is_empty());
}

#[test]
fn test_retry_after_worker_crash() {
    let trace = tour(500);
    let mut app = CaptureApp::new(config_with_hold(300), Arc::new(CrashOnce::new(Arc::clone(&trace)))).unwrap();
    assert!(app.run(Box::new(MockCamera::new(Arc::clone(&trace)))).is_err());

    app.restart();
    let camera = MockCamera::new(Arc::clone(&trace));
    let closes = Arc::clone(&camera.closes);
    let summary = app.run(Box::new(camera)).unwrap();

    assert_eq!(summary.captured, Direction::ALL.to_vec());
    assert_eq!(app.orchestrator().state(), PoseTarget::Completed);
    assert!(!app.orchestrator().is_camera_open());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
