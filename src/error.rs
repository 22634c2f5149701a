//! Error types for the face orientation capture library.

use crate::pose::Direction;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Capture was started before the pose model finished loading
    #[error("Pose model is not ready yet")]
    ModelNotReady,

    /// Camera permission denied, no device, or the stream failed
    #[error("Camera access error: {0}")]
    CameraAccess(String),

    /// The frame source has no more frames
    #[error("Camera stream ended")]
    EndOfStream,

    /// Submission attempted before every direction was captured
    #[error("Missing face images for directions: {}", join_directions(.0))]
    MissingDirections(Vec<Direction>),

    /// The registration service could not be reached or answered with an HTTP error
    #[error("Registration transport error: {0}")]
    RegistrationTransport(String),

    /// The registration service answered but refused the request
    #[error("Registration rejected: {0}")]
    RegistrationRejected(String),

    /// Operation not allowed in the current capture state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Background pose worker is gone
    #[error("Pose worker error: {0}")]
    Worker(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pose trace loading or replay error
    #[error("Trace error: {0}")]
    TraceError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding or decoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

fn join_directions(directions: &[Direction]) -> String {
    directions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
