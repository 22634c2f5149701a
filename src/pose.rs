//! Pose targets, capture directions and per-frame rotation estimates.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of the guided capture sequence
///
/// `Init` and `Completed` are sentinels; the five states between them each
/// require one captured still and are visited strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseTarget {
    /// Waiting for the camera to start
    Init,
    /// Looking straight at the camera
    Front,
    /// Head turned left
    Left,
    /// Head turned right
    Right,
    /// Head raised
    Up,
    /// Head lowered
    Down,
    /// All five directions captured
    Completed,
}

impl PoseTarget {
    /// Full sequence in visiting order
    pub const SEQUENCE: [PoseTarget; 7] = [
        PoseTarget::Init,
        PoseTarget::Front,
        PoseTarget::Left,
        PoseTarget::Right,
        PoseTarget::Up,
        PoseTarget::Down,
        PoseTarget::Completed,
    ];

    /// State that follows this one, `None` once completed
    pub fn next(self) -> Option<PoseTarget> {
        match self {
            PoseTarget::Init => Some(PoseTarget::Front),
            PoseTarget::Front => Some(PoseTarget::Left),
            PoseTarget::Left => Some(PoseTarget::Right),
            PoseTarget::Right => Some(PoseTarget::Up),
            PoseTarget::Up => Some(PoseTarget::Down),
            PoseTarget::Down => Some(PoseTarget::Completed),
            PoseTarget::Completed => None,
        }
    }

    /// Whether a still must be captured in this state
    pub fn is_capturing(self) -> bool {
        self.direction().is_some()
    }

    /// Capture direction for capturing states
    pub fn direction(self) -> Option<Direction> {
        match self {
            PoseTarget::Front => Some(Direction::Front),
            PoseTarget::Left => Some(Direction::Left),
            PoseTarget::Right => Some(Direction::Right),
            PoseTarget::Up => Some(Direction::Up),
            PoseTarget::Down => Some(Direction::Down),
            PoseTarget::Init | PoseTarget::Completed => None,
        }
    }

    /// Upper-case name used in logs
    pub fn name(self) -> &'static str {
        match self {
            PoseTarget::Init => "INIT",
            PoseTarget::Front => "FRONT",
            PoseTarget::Left => "LEFT",
            PoseTarget::Right => "RIGHT",
            PoseTarget::Up => "UP",
            PoseTarget::Down => "DOWN",
            PoseTarget::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for PoseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key of one entry in the direction map submitted for registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Front,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions in capture order
    pub const ALL: [Direction; 5] = [
        Direction::Front,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Wire name of the direction
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Capturing state that produces this direction
    pub fn target(self) -> PoseTarget {
        match self {
            Direction::Front => PoseTarget::Front,
            Direction::Left => PoseTarget::Left,
            Direction::Right => PoseTarget::Right,
            Direction::Up => PoseTarget::Up,
            Direction::Down => PoseTarget::Down,
        }
    }

    /// One-based position in the capture sequence
    pub fn step(self) -> usize {
        match self {
            Direction::Front => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::Up => 4,
            Direction::Down => 5,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head rotation in degrees
///
/// Positive yaw turns left, negative pitch looks up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationState {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl RotationState {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Extract Euler angles from a 3x3 rotation matrix
    #[must_use]
    pub fn from_rotation_matrix(matrix: &Matrix3<f64>) -> Self {
        let r13 = matrix[(0, 2)];
        let r21 = matrix[(1, 0)];
        let r22 = matrix[(1, 1)];
        let r23 = matrix[(1, 2)];
        let r33 = matrix[(2, 2)];

        // asin is undefined past +-1; numeric noise can push r23 slightly out
        let pitch = (-r23).clamp(-1.0, 1.0).asin();
        let yaw = r13.atan2(r33);
        let roll = r21.atan2(r22);

        Self {
            roll: roll.to_degrees(),
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
        }
    }

    /// True when all three angles are finite
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roll {:.1} pitch {:.1} yaw {:.1}",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// Per-frame output of the pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseResult {
    /// A face was found in the frame
    pub face_detected: bool,
    /// The face sits inside the on-screen guide region
    pub within_bounds: bool,
    /// Estimated head rotation, meaningless when no face was found
    pub rotation: RotationState,
}

impl PoseResult {
    /// Face found and inside the guide region
    pub fn detected(rotation: RotationState) -> Self {
        Self {
            face_detected: true,
            within_bounds: true,
            rotation,
        }
    }

    /// Face found but outside the guide region
    pub fn out_of_bounds(rotation: RotationState) -> Self {
        Self {
            face_detected: true,
            within_bounds: false,
            rotation,
        }
    }

    /// No face in the frame
    pub fn no_face() -> Self {
        Self::default()
    }
}
