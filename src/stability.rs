//! Stability tracking for the current target pose.
//!
//! The tracker accumulates how long consecutive frames have matched the
//! current target and signals completion exactly once per streak. Time is
//! taken from frame timestamps rather than the wall clock, so replayed or
//! scripted streams behave identically to live ones.

use crate::{
    acceptance::{AcceptanceWindows, PoseCheck},
    config::StabilityConfig,
    pose::{PoseResult, PoseTarget},
    utils::{ceil_seconds, duration_ratio},
};
use log::debug;
use std::time::Duration;

/// Result of evaluating one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityStatus {
    /// Classification of the evaluated frame
    pub check: PoseCheck,
    /// Continuous hold accumulated so far
    pub elapsed: Duration,
    /// Hold needed for the current target
    pub required: Duration,
    /// Set on the single tick where `elapsed` first reaches `required`
    pub just_completed: bool,
}

impl StabilityStatus {
    /// Status with nothing accumulated
    pub fn idle(required: Duration) -> Self {
        Self {
            check: PoseCheck::NoFace,
            elapsed: Duration::ZERO,
            required,
            just_completed: false,
        }
    }

    /// Fraction of the hold completed, `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        duration_ratio(self.elapsed, self.required)
    }

    /// Whole seconds left, rounded up
    pub fn remaining_secs(&self) -> u64 {
        ceil_seconds(self.elapsed, self.required)
    }

    /// Time left until the hold completes
    pub fn remaining(&self) -> Duration {
        self.required.saturating_sub(self.elapsed)
    }

    /// The current frame passed and a streak is running
    pub fn is_accumulating(&self) -> bool {
        self.check.is_aligned()
    }
}

/// Debounces per-frame pose checks over the configured hold duration
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    windows: AcceptanceWindows,
    config: StabilityConfig,
    target: PoseTarget,
    elapsed: Duration,
    last_tick: Option<Duration>,
    completed: bool,
    last_check: PoseCheck,
}

impl StabilityTracker {
    /// Create a tracker with the given windows and hold durations
    #[must_use]
    pub fn new(windows: AcceptanceWindows, config: StabilityConfig) -> Self {
        Self {
            windows,
            config,
            target: PoseTarget::Init,
            elapsed: Duration::ZERO,
            last_tick: None,
            completed: false,
            last_check: PoseCheck::NoFace,
        }
    }

    /// Acceptance windows used for classification
    pub fn windows(&self) -> &AcceptanceWindows {
        &self.windows
    }

    /// Hold required for `target`; sentinel targets need none
    pub fn required_for(&self, target: PoseTarget) -> Duration {
        target
            .direction()
            .map_or(Duration::ZERO, |direction| self.config.required_for(direction))
    }

    /// Evaluate one frame observed at stream offset `at`
    pub fn evaluate(&mut self, target: PoseTarget, pose: &PoseResult, at: Duration) -> StabilityStatus {
        if target != self.target {
            debug!("Stability target changed {} -> {}", self.target, target);
            self.reset();
            self.target = target;
        }

        let check = self.windows.check(target, pose);
        self.last_check = check;

        if check.is_aligned() {
            if let Some(prev) = self.last_tick {
                // Timestamps going backwards contribute nothing
                self.elapsed += at.saturating_sub(prev);
            }
            self.last_tick = Some(at);
        } else {
            if !self.elapsed.is_zero() {
                debug!("Stability lost for {} after {:?} ({:?})", target, self.elapsed, check);
            }
            self.elapsed = Duration::ZERO;
            self.last_tick = None;
            self.completed = false;
        }

        let required = self.required_for(target);
        let just_completed = check.is_aligned() && !self.completed && self.elapsed >= required;
        if just_completed {
            self.completed = true;
            debug!("Stability reached for {} after {:?}", target, self.elapsed);
        }

        StabilityStatus {
            check,
            elapsed: self.elapsed,
            required,
            just_completed,
        }
    }

    /// Current status without evaluating a frame
    pub fn status(&self) -> StabilityStatus {
        StabilityStatus {
            check: self.last_check,
            elapsed: self.elapsed,
            required: self.required_for(self.target),
            just_completed: false,
        }
    }

    /// Drop the accumulated streak
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.last_tick = None;
        self.completed = false;
        self.last_check = PoseCheck::NoFace;
    }
}
