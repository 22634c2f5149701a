//! Read-only projection of the capture state onto on-screen feedback.
//!
//! [`OverlayRenderer::render`] is a pure function: it maps the current
//! target, the latest pose result and the stability counter to a border
//! colour, a guideline shape, the timer ring and the text shown to the user.

use crate::{
    acceptance::{AcceptanceWindows, PoseCheck},
    constants::{GUIDE_TILT_DEGREES, GUIDE_TURN_DEGREES},
    pose::{Direction, PoseResult, PoseTarget},
    utils::{ceil_seconds, duration_ratio},
};
use serde::Serialize;
use std::time::Duration;

/// Border feedback for the camera view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BorderState {
    /// No face in the frame
    NotDetected,
    /// Face found but the target is not satisfied
    OutsideWindow {
        /// Face sits inside the guide region, only the orientation is off
        in_bounds: bool,
    },
    /// Target satisfied, hold is accumulating
    Accumulating {
        /// Some hold time has already been accumulated
        counting: bool,
    },
}

impl BorderState {
    /// CSS hex colour of the border
    pub fn color(self) -> &'static str {
        match self {
            BorderState::NotDetected => "#ff3d00",
            BorderState::OutsideWindow { in_bounds: false } => "#FFC107",
            BorderState::OutsideWindow { in_bounds: true } => "#FFAB00",
            BorderState::Accumulating { counting: false } => "#00c853",
            BorderState::Accumulating { counting: true } => "#4285F4",
        }
    }

    fn from_check(check: PoseCheck, elapsed: Duration) -> Self {
        match check {
            PoseCheck::NoFace => BorderState::NotDetected,
            PoseCheck::OutOfBounds => BorderState::OutsideWindow { in_bounds: false },
            PoseCheck::WrongOrientation => BorderState::OutsideWindow { in_bounds: true },
            PoseCheck::Aligned => BorderState::Accumulating {
                counting: !elapsed.is_zero(),
            },
        }
    }
}

/// Arrow drawn next to a turned or tilted guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

/// Face outline the user should match
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Guideline {
    None,
    Oval {
        /// Rotation about the vertical axis in degrees, positive to the left
        turn_deg: f64,
        /// Tilt about the horizontal axis in degrees, negative looks up
        tilt_deg: f64,
        /// Centre crosshair, front pose only
        crosshair: bool,
        arrow: Option<Arrow>,
    },
}

impl Guideline {
    /// Guide for a target pose
    pub fn for_target(target: PoseTarget) -> Self {
        let oval = |turn_deg, tilt_deg, arrow| Guideline::Oval {
            turn_deg,
            tilt_deg,
            crosshair: false,
            arrow: Some(arrow),
        };

        match target.direction() {
            None => Guideline::None,
            Some(Direction::Front) => Guideline::Oval {
                turn_deg: 0.0,
                tilt_deg: 0.0,
                crosshair: true,
                arrow: None,
            },
            Some(Direction::Left) => oval(GUIDE_TURN_DEGREES, 0.0, Arrow::Left),
            Some(Direction::Right) => oval(-GUIDE_TURN_DEGREES, 0.0, Arrow::Right),
            Some(Direction::Up) => oval(0.0, -GUIDE_TILT_DEGREES, Arrow::Up),
            Some(Direction::Down) => oval(0.0, GUIDE_TILT_DEGREES, Arrow::Down),
        }
    }
}

/// Everything the view needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayState {
    pub border: BorderState,
    pub guideline: Guideline,
    /// Timer ring fill, `0.0..=1.0`
    pub timer_progress: f64,
    /// Whole seconds left on the ring, present while counting
    pub countdown: Option<u64>,
    /// Progress label such as `Front (1/5)`
    pub stage_text: String,
    /// Instruction for the current border state
    pub message: String,
}

/// Pure mapping from capture state to overlay
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    windows: AcceptanceWindows,
}

impl OverlayRenderer {
    pub fn new(windows: AcceptanceWindows) -> Self {
        Self { windows }
    }

    /// Project the current state onto the overlay
    #[must_use]
    pub fn render(
        &self,
        target: PoseTarget,
        pose: Option<&PoseResult>,
        elapsed: Duration,
        required: Duration,
    ) -> OverlayState {
        let check = pose.map_or(PoseCheck::NoFace, |p| self.windows.check(target, p));
        let border = BorderState::from_check(check, elapsed);

        let counting = matches!(border, BorderState::Accumulating { counting: true });
        let (timer_progress, countdown) = if counting && target.is_capturing() {
            (duration_ratio(elapsed, required), Some(ceil_seconds(elapsed, required)))
        } else {
            (0.0, None)
        };

        OverlayState {
            border,
            guideline: Guideline::for_target(target),
            timer_progress,
            countdown,
            stage_text: stage_text(target),
            message: message(target, border, countdown),
        }
    }
}

/// Progress label for a target
pub fn stage_text(target: PoseTarget) -> String {
    match target.direction() {
        Some(direction) => {
            let name = direction.as_str();
            let mut label = name[..1].to_uppercase();
            label.push_str(&name[1..]);
            format!("{label} ({}/{})", direction.step(), Direction::ALL.len())
        }
        None if target == PoseTarget::Completed => "Completed".to_string(),
        None => "Ready".to_string(),
    }
}

fn instruction(direction: Direction) -> &'static str {
    match direction {
        Direction::Front => "Look straight at the camera",
        Direction::Left => "Turn your head to the left",
        Direction::Right => "Turn your head to the right",
        Direction::Up => "Tilt your head up",
        Direction::Down => "Tilt your head down",
    }
}

fn message(target: PoseTarget, border: BorderState, countdown: Option<u64>) -> String {
    let Some(direction) = target.direction() else {
        return if target == PoseTarget::Completed {
            "All directions captured".to_string()
        } else {
            "Start the camera to begin".to_string()
        };
    };

    match border {
        BorderState::NotDetected => "No face detected".to_string(),
        BorderState::OutsideWindow { in_bounds: false } => "Move your face inside the circle".to_string(),
        BorderState::OutsideWindow { in_bounds: true } => instruction(direction).to_string(),
        BorderState::Accumulating { .. } => match countdown {
            Some(secs) => format!("Hold still ({secs})"),
            None => "Hold still".to_string(),
        },
    }
}
