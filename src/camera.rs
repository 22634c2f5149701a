//! Camera abstraction and the scoped session that owns an open device.

use crate::{Error, Result};
use image::RgbImage;
use log::{debug, info, warn};
use std::time::Duration;

/// One video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the stream, starting at 0
    pub seq: u64,
    /// Offset from the start of the stream
    pub timestamp: Duration,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(seq: u64, timestamp: Duration, image: RgbImage) -> Self {
        Self { seq, timestamp, image }
    }
}

/// A source of video frames such as a webcam
pub trait FrameSource: Send {
    /// Acquire the device
    ///
    /// # Errors
    ///
    /// Returns an error if permission is denied or no device exists
    fn open(&mut self) -> Result<()>;

    /// Read the next frame
    ///
    /// # Errors
    ///
    /// Returns `EndOfStream` when the source is exhausted, or another error
    /// if the device fails
    fn read_frame(&mut self) -> Result<Frame>;

    /// Release the device; must be safe to call more than once
    fn close(&mut self);

    /// Human-readable name for logs
    fn name(&self) -> &str {
        "camera"
    }
}

/// An open camera that is released when the session ends or is dropped
pub struct CameraSession {
    source: Option<Box<dyn FrameSource>>,
}

impl CameraSession {
    /// Open `source` and wrap it in a session
    ///
    /// # Errors
    ///
    /// Returns `CameraAccess` if the device cannot be acquired; the source is
    /// closed before returning
    pub fn open(mut source: Box<dyn FrameSource>) -> Result<Self> {
        match source.open() {
            Ok(()) => {
                info!("Camera '{}' opened", source.name());
                Ok(Self { source: Some(source) })
            }
            Err(e) => {
                source.close();
                Err(match e {
                    Error::CameraAccess(msg) => Error::CameraAccess(msg),
                    other => Error::CameraAccess(format!("{}: {other}", source.name())),
                })
            }
        }
    }

    /// Read a frame from the open device
    ///
    /// # Errors
    ///
    /// Returns `CameraAccess` once the session has been released, otherwise
    /// whatever the source reports
    pub fn read_frame(&mut self) -> Result<Frame> {
        match self.source.as_mut() {
            Some(source) => source.read_frame(),
            None => Err(Error::CameraAccess("Camera session already released".to_string())),
        }
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Release the device; later calls are no-ops
    pub fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            info!("Camera '{}' released", source.name());
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.source.is_some() {
            debug!("Camera session dropped while open");
            self.release();
        }
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// Log a failed frame read; end of stream is expected and stays quiet
pub(crate) fn log_read_error(err: &Error) {
    match err {
        Error::EndOfStream => debug!("Camera stream ended"),
        other => warn!("Camera read failed: {other}"),
    }
}
