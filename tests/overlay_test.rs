//! Overlay projection tests

use face_orientation_capture::{
    acceptance::AcceptanceWindows,
    overlay::{Arrow, BorderState, Guideline, OverlayRenderer},
    pose::{PoseResult, PoseTarget, RotationState},
};
use std::time::Duration;

const REQUIRED: Duration = Duration::from_secs(3);

fn render(target: PoseTarget, pose: Option<PoseResult>, elapsed_ms: u64) -> face_orientation_capture::overlay::OverlayState {
    OverlayRenderer::new(AcceptanceWindows::default()).render(
        target,
        pose.as_ref(),
        Duration::from_millis(elapsed_ms),
        REQUIRED,
    )
}

#[test]
fn test_border_states() {
    let front = RotationState::default();

    assert_eq!(render(PoseTarget::Front, None, 0).border, BorderState::NotDetected);
    assert_eq!(
        render(PoseTarget::Front, Some(PoseResult::no_face()), 0).border,
        BorderState::NotDetected
    );
    assert_eq!(
        render(PoseTarget::Front, Some(PoseResult::out_of_bounds(front)), 0).border,
        BorderState::OutsideWindow { in_bounds: false }
    );
    assert_eq!(
        render(PoseTarget::Left, Some(PoseResult::detected(front)), 0).border,
        BorderState::OutsideWindow { in_bounds: true }
    );
    assert_eq!(
        render(PoseTarget::Front, Some(PoseResult::detected(front)), 0).border,
        BorderState::Accumulating { counting: false }
    );
    assert_eq!(
        render(PoseTarget::Front, Some(PoseResult::detected(front)), 100).border,
        BorderState::Accumulating { counting: true }
    );
}

#[test]
fn test_timer_ring_only_while_counting() {
    let left = PoseResult::detected(RotationState::new(0.0, 0.0, 35.0));

    let counting = render(PoseTarget::Left, Some(left), 2250);
    assert!((counting.timer_progress - 0.75).abs() < 1e-9);
    assert_eq!(counting.countdown, Some(1));

    let lost = render(PoseTarget::Left, Some(PoseResult::no_face()), 0);
    assert_eq!(lost.timer_progress, 0.0);
    assert_eq!(lost.countdown, None);
}

#[test]
fn test_guidelines_per_target() {
    for (target, arrow) in [
        (PoseTarget::Left, Arrow::Left),
        (PoseTarget::Right, Arrow::Right),
        (PoseTarget::Up, Arrow::Up),
        (PoseTarget::Down, Arrow::Down),
    ] {
        match render(target, None, 0).guideline {
            Guideline::Oval {
                arrow: Some(found),
                crosshair,
                ..
            } => {
                assert_eq!(found, arrow);
                assert!(!crosshair);
            }
            other => panic!("{target}: unexpected guideline {other:?}"),
        }
    }
    assert_eq!(render(PoseTarget::Completed, None, 0).guideline, Guideline::None);
}

#[test]
fn test_sentinel_messages() {
    assert_eq!(render(PoseTarget::Init, None, 0).message, "Start the camera to begin");
    let done = render(PoseTarget::Completed, Some(PoseResult::detected(RotationState::default())), 0);
    assert_eq!(done.message, "All directions captured");
    assert_eq!(done.countdown, None);
}

#[test]
fn test_render_is_pure() {
    let renderer = OverlayRenderer::new(AcceptanceWindows::default());
    let pose = PoseResult::detected(RotationState::default());
    let first = renderer.render(PoseTarget::Front, Some(&pose), Duration::from_millis(1200), REQUIRED);
    let second = renderer.render(PoseTarget::Front, Some(&pose), Duration::from_millis(1200), REQUIRED);
    assert_eq!(first, second);

    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["border"]["kind"], "accumulating");
    assert_eq!(json["stage_text"], "Front (1/5)");
}
