//! Pose estimator seam and the process-wide model handle.

use crate::{camera::Frame, pose::PoseResult, Result};
use log::info;
use std::sync::{Arc, OnceLock};

/// Produces a [`PoseResult`] for a video frame
///
/// Implementations are shared read-only between the caller and the pose
/// worker thread.
pub trait PoseEstimator: Send + Sync {
    /// Model finished loading and can estimate
    fn is_ready(&self) -> bool {
        true
    }

    /// Estimate face presence, bounds and rotation for one frame
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn estimate(&self, frame: &Frame) -> Result<PoseResult>;

    /// Human-readable name for logs
    fn name(&self) -> &str {
        "pose-estimator"
    }
}

static SHARED_MODEL: OnceLock<Arc<dyn PoseEstimator>> = OnceLock::new();

/// Process-wide estimator, created by `init` on first use
///
/// Later calls return the same instance and never run their `init`.
pub fn shared_model<F>(init: F) -> Arc<dyn PoseEstimator>
where
    F: FnOnce() -> Arc<dyn PoseEstimator>,
{
    Arc::clone(SHARED_MODEL.get_or_init(|| {
        let model = init();
        info!("Loaded pose model '{}'", model.name());
        model
    }))
}
