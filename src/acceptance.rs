//! Angular acceptance windows deciding whether a frame matches the target pose.

use crate::{
    constants::{
        DOWN_PITCH_MAX, DOWN_PITCH_MIN, FRONT_PITCH_TOLERANCE, FRONT_ROLL_TOLERANCE, FRONT_YAW_TOLERANCE,
        SIDE_YAW_MAX, SIDE_YAW_MIN, TURN_CROSS_AXIS_TOLERANCE, TURN_ROLL_TOLERANCE, UP_PITCH_MAX, UP_PITCH_MIN,
    },
    pose::{Direction, PoseResult, PoseTarget, RotationState},
};
use serde::{Deserialize, Serialize};

/// Closed interval of accepted angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub min: f64,
    pub max: f64,
}

impl AngleBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Band of `-tolerance..=tolerance`
    pub const fn symmetric(tolerance: f64) -> Self {
        Self {
            min: -tolerance,
            max: tolerance,
        }
    }

    /// Whether `angle` lies inside the band; NaN never does
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }

    /// Finite bounds with `min <= max`
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Per-axis bands a rotation must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceWindow {
    pub roll: AngleBand,
    pub pitch: AngleBand,
    pub yaw: AngleBand,
}

impl AcceptanceWindow {
    pub fn accepts(&self, rotation: &RotationState) -> bool {
        self.roll.contains(rotation.roll) && self.pitch.contains(rotation.pitch) && self.yaw.contains(rotation.yaw)
    }

    pub fn is_valid(&self) -> bool {
        self.roll.is_valid() && self.pitch.is_valid() && self.yaw.is_valid()
    }
}

/// Outcome of checking one pose result against the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseCheck {
    /// No face in the frame
    NoFace,
    /// Face found outside the guide region
    OutOfBounds,
    /// Face in the guide region, rotation outside the window
    WrongOrientation,
    /// Everything matches the target
    Aligned,
}

impl PoseCheck {
    pub fn is_aligned(self) -> bool {
        self == PoseCheck::Aligned
    }
}

/// Acceptance windows for the five capturing poses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceWindows {
    pub front: AcceptanceWindow,
    pub left: AcceptanceWindow,
    pub right: AcceptanceWindow,
    pub up: AcceptanceWindow,
    pub down: AcceptanceWindow,
}

impl Default for AcceptanceWindows {
    fn default() -> Self {
        let turned = |yaw: AngleBand| AcceptanceWindow {
            roll: AngleBand::symmetric(TURN_ROLL_TOLERANCE),
            pitch: AngleBand::symmetric(TURN_CROSS_AXIS_TOLERANCE),
            yaw,
        };
        let tilted = |pitch: AngleBand| AcceptanceWindow {
            roll: AngleBand::symmetric(TURN_ROLL_TOLERANCE),
            pitch,
            yaw: AngleBand::symmetric(TURN_CROSS_AXIS_TOLERANCE),
        };

        Self {
            front: AcceptanceWindow {
                roll: AngleBand::symmetric(FRONT_ROLL_TOLERANCE),
                pitch: AngleBand::symmetric(FRONT_PITCH_TOLERANCE),
                yaw: AngleBand::symmetric(FRONT_YAW_TOLERANCE),
            },
            left: turned(AngleBand::new(SIDE_YAW_MIN, SIDE_YAW_MAX)),
            right: turned(AngleBand::new(-SIDE_YAW_MAX, -SIDE_YAW_MIN)),
            up: tilted(AngleBand::new(UP_PITCH_MIN, UP_PITCH_MAX)),
            down: tilted(AngleBand::new(DOWN_PITCH_MIN, DOWN_PITCH_MAX)),
        }
    }
}

impl AcceptanceWindows {
    /// Window for one capture direction
    pub fn window(&self, direction: Direction) -> &AcceptanceWindow {
        match direction {
            Direction::Front => &self.front,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Classify a pose result against `target`
    ///
    /// Sentinel targets have no window, so a detected face there is always
    /// reported as `WrongOrientation`.
    #[must_use]
    pub fn check(&self, target: PoseTarget, pose: &PoseResult) -> PoseCheck {
        if !pose.face_detected {
            return PoseCheck::NoFace;
        }
        if !pose.within_bounds {
            return PoseCheck::OutOfBounds;
        }
        match target.direction() {
            Some(direction) if self.window(direction).accepts(&pose.rotation) => PoseCheck::Aligned,
            _ => PoseCheck::WrongOrientation,
        }
    }

    /// Directions whose window has invalid bounds
    pub fn invalid_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| !self.window(*d).is_valid())
            .collect()
    }
}
