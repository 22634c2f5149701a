//! Scripted pose recordings.
//!
//! A [`PoseTrace`] describes how a head moves over time as a list of held
//! poses. [`TraceCamera`] plays it back as a synthetic frame stream and
//! [`TraceEstimator`] answers each frame with the pose scripted for its
//! timestamp, so the whole capture flow can run without a webcam or model.

use crate::{
    camera::{Frame, FrameSource},
    constants::{DEFAULT_TRACE_FPS, DEFAULT_TRACE_FRAME_HEIGHT, DEFAULT_TRACE_FRAME_WIDTH},
    estimator::PoseEstimator,
    pose::{PoseResult, RotationState},
    utils::duration_ms,
    Error, Result,
};
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc, time::Duration};

/// One held pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSegment {
    /// How long the pose is held
    pub duration_ms: u64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default = "default_true")]
    pub face_detected: bool,
    #[serde(default = "default_true")]
    pub within_bounds: bool,
}

fn default_true() -> bool {
    true
}

impl TraceSegment {
    /// Face visible and in bounds with the given rotation
    pub fn hold(duration_ms: u64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            duration_ms,
            roll,
            pitch,
            yaw,
            face_detected: true,
            within_bounds: true,
        }
    }

    /// No face visible
    pub fn absent(duration_ms: u64) -> Self {
        Self {
            face_detected: false,
            within_bounds: false,
            ..Self::hold(duration_ms, 0.0, 0.0, 0.0)
        }
    }

    pub fn pose(&self) -> PoseResult {
        PoseResult {
            face_detected: self.face_detected,
            within_bounds: self.face_detected && self.within_bounds,
            rotation: RotationState::new(self.roll, self.pitch, self.yaw),
        }
    }
}

/// Scripted head movement replayed at a fixed frame rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseTrace {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_width")]
    pub frame_width: u32,
    #[serde(default = "default_height")]
    pub frame_height: u32,
    pub segments: Vec<TraceSegment>,
}

fn default_fps() -> u32 {
    DEFAULT_TRACE_FPS
}

fn default_width() -> u32 {
    DEFAULT_TRACE_FRAME_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_TRACE_FRAME_HEIGHT
}

impl PoseTrace {
    /// Trace with default frame rate and size
    pub fn new(segments: Vec<TraceSegment>) -> Self {
        Self {
            fps: DEFAULT_TRACE_FPS,
            frame_width: DEFAULT_TRACE_FRAME_WIDTH,
            frame_height: DEFAULT_TRACE_FRAME_HEIGHT,
            segments,
        }
    }

    /// Front, left, right, up and down, each held for `hold`
    pub fn orientation_tour(hold: Duration) -> Self {
        let ms = duration_ms(hold);
        Self::new(vec![
            TraceSegment::hold(ms, 0.0, 0.0, 0.0),
            TraceSegment::hold(ms, 0.0, 0.0, 35.0),
            TraceSegment::hold(ms, 0.0, 0.0, -35.0),
            TraceSegment::hold(ms, 0.0, -35.0, 0.0),
            TraceSegment::hold(ms, 0.0, 35.0, 0.0),
        ])
    }

    /// Load and validate a YAML trace
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML trace
    pub fn from_yaml(content: &str) -> Result<Self> {
        let trace: Self =
            serde_yaml::from_str(content).map_err(|e| Error::TraceError(format!("Failed to parse trace: {e}")))?;
        trace.validate()?;
        Ok(trace)
    }

    /// Validate frame settings and segments
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::TraceError("Trace fps must be greater than 0".to_string()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(Error::TraceError(format!(
                "Trace frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.segments.is_empty() {
            return Err(Error::TraceError("Trace has no segments".to_string()));
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.duration_ms == 0 {
                return Err(Error::TraceError(format!("Segment {i} has zero duration")));
            }
            if !segment.pose().rotation.is_finite() {
                return Err(Error::TraceError(format!("Segment {i} has non-finite angles")));
            }
        }
        Ok(())
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(
            self.segments
                .iter()
                .fold(0u64, |total, s| total.saturating_add(s.duration_ms)),
        )
    }

    /// Time between consecutive frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }

    /// Scripted pose at stream offset `at`, `None` past the end
    pub fn pose_at(&self, at: Duration) -> Option<PoseResult> {
        let mut start = Duration::ZERO;
        for segment in &self.segments {
            let end = start.saturating_add(Duration::from_millis(segment.duration_ms));
            if at < end {
                return Some(segment.pose());
            }
            start = end;
        }
        None
    }
}

/// Synthetic camera replaying a trace
pub struct TraceCamera {
    trace: Arc<PoseTrace>,
    next_seq: u64,
    opened: bool,
}

impl TraceCamera {
    pub fn new(trace: Arc<PoseTrace>) -> Self {
        Self {
            trace,
            next_seq: 0,
            opened: false,
        }
    }
}

impl FrameSource for TraceCamera {
    fn open(&mut self) -> Result<()> {
        self.trace.validate()?;
        self.next_seq = 0;
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.opened {
            return Err(Error::CameraAccess("Trace camera is not open".to_string()));
        }

        let seq = self.next_seq;
        let timestamp = self.trace.frame_interval().saturating_mul(u32::try_from(seq).unwrap_or(u32::MAX));
        if timestamp >= self.trace.total_duration() {
            return Err(Error::EndOfStream);
        }
        self.next_seq += 1;

        // Shade encodes the frame index so captures differ visibly
        let shade = (seq % 256) as u8;
        let image = RgbImage::from_pixel(
            self.trace.frame_width,
            self.trace.frame_height,
            Rgb([shade, 128, 255 - shade]),
        );
        Ok(Frame::new(seq, timestamp, image))
    }

    fn close(&mut self) {
        if self.opened {
            debug!("Trace camera closed after {} frames", self.next_seq);
        }
        self.opened = false;
    }

    fn name(&self) -> &str {
        "trace"
    }
}

/// Estimator answering with the pose scripted for each frame's timestamp
pub struct TraceEstimator {
    trace: Arc<PoseTrace>,
}

impl TraceEstimator {
    pub fn new(trace: Arc<PoseTrace>) -> Self {
        Self { trace }
    }
}

impl PoseEstimator for TraceEstimator {
    fn estimate(&self, frame: &Frame) -> Result<PoseResult> {
        Ok(self.trace.pose_at(frame.timestamp).unwrap_or_else(PoseResult::no_face))
    }

    fn name(&self) -> &str {
        "trace"
    }
}
