//! Constants used throughout the application

/// Number of capturing poses in a run
pub const CAPTURE_DIRECTIONS: usize = 5;

/// Default continuous hold required before a capture fires (milliseconds)
pub const DEFAULT_STABILITY_MS: u64 = 3000;

/// Default JPEG quality for captured stills
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// How long the host loop waits for one pose estimate (milliseconds)
pub const DEFAULT_ESTIMATION_TIMEOUT_MS: u64 = 1000;

/// Default registration service base URL
pub const DEFAULT_REGISTRATION_URL: &str = "http://localhost:8000";

/// Default registration request timeout (milliseconds)
pub const DEFAULT_REGISTRATION_TIMEOUT_MS: u64 = 10_000;

/// Front pose tolerances (degrees, symmetric around zero)
pub const FRONT_ROLL_TOLERANCE: f64 = 20.0;
pub const FRONT_PITCH_TOLERANCE: f64 = 15.0;
pub const FRONT_YAW_TOLERANCE: f64 = 15.0;

/// Roll and off-axis tolerance for the turned poses (degrees)
pub const TURN_ROLL_TOLERANCE: f64 = 15.0;
pub const TURN_CROSS_AXIS_TOLERANCE: f64 = 15.0;

/// Yaw band for the left pose; the right pose mirrors it
pub const SIDE_YAW_MIN: f64 = 15.0;
pub const SIDE_YAW_MAX: f64 = 40.0;

/// Pitch band for the up pose (negative pitch looks up)
pub const UP_PITCH_MIN: f64 = -40.0;
pub const UP_PITCH_MAX: f64 = -2.0;

/// Pitch band for the down pose
pub const DOWN_PITCH_MIN: f64 = 9.0;
pub const DOWN_PITCH_MAX: f64 = 40.0;

/// Guideline oval rotation for left/right poses (degrees)
pub const GUIDE_TURN_DEGREES: f64 = 30.0;

/// Guideline oval tilt for up/down poses (degrees)
pub const GUIDE_TILT_DEGREES: f64 = 20.0;

/// Default replay rate for pose traces (50 ms per frame)
pub const DEFAULT_TRACE_FPS: u32 = 20;

/// Default synthetic frame size for pose traces
pub const DEFAULT_TRACE_FRAME_WIDTH: u32 = 64;
pub const DEFAULT_TRACE_FRAME_HEIGHT: u32 = 48;

/// Prefix of every encoded capture
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";
