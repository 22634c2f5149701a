//! The capture state machine.
//!
//! [`CaptureOrchestrator`] walks the user through `FRONT`, `LEFT`, `RIGHT`,
//! `UP` and `DOWN`, captures one still per pose once the stability hold
//! completes, and hands the finished set to a registration client.
//!
//! Pose estimates may be produced off-thread. Each request is tagged with a
//! [`Ticket`]; [`CaptureOrchestrator::apply`] drops results that belong to an
//! earlier session, a superseded target or an older frame, so a late answer
//! can never capture into the wrong slot.

use crate::{
    camera::{log_read_error, CameraSession, Frame, FrameSource},
    config::Config,
    estimator::PoseEstimator,
    image_store::{CapturedImage, ImageStore},
    overlay::{OverlayRenderer, OverlayState},
    pose::{Direction, PoseResult, PoseTarget},
    registration::{RegistrationClient, RegistrationResponse},
    stability::{StabilityStatus, StabilityTracker},
    utils::image_encoding::frame_to_data_uri,
    worker::{PoseMessage, Ticket},
    Error, Result,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Why a pose result was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Issued before the last restart or camera stop
    StaleSession,
    /// Issued for a target that has since been captured
    SupersededTarget,
    /// Frame is not newer than the last applied one
    OutOfOrder,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to evaluate in the current state
    Skipped,
    /// Result dropped without touching any state
    Discarded(DiscardReason),
    /// Frame evaluated, no capture
    Evaluated(StabilityStatus),
    /// Hold completed, still captured, state advanced
    Captured { direction: Direction, next: PoseTarget },
}

/// Which user actions are currently available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub start_camera: bool,
    pub restart: bool,
    pub confirm: bool,
}

/// Drives the guided capture sequence
pub struct CaptureOrchestrator {
    state: PoseTarget,
    model: Arc<dyn PoseEstimator>,
    tracker: StabilityTracker,
    store: ImageStore,
    renderer: OverlayRenderer,
    camera: Option<CameraSession>,
    session: u64,
    pending: Option<Ticket>,
    last_applied_seq: Option<u64>,
    last_pose: Option<PoseResult>,
    jpeg_quality: u8,
}

impl CaptureOrchestrator {
    /// Create an orchestrator in `INIT`
    pub fn new(config: &Config, model: Arc<dyn PoseEstimator>) -> Self {
        Self {
            state: PoseTarget::Init,
            model,
            tracker: StabilityTracker::new(config.acceptance.clone(), config.stability.clone()),
            store: ImageStore::new(),
            renderer: OverlayRenderer::new(config.acceptance.clone()),
            camera: None,
            session: 0,
            pending: None,
            last_applied_seq: None,
            last_pose: None,
            jpeg_quality: config.capture.jpeg_quality,
        }
    }

    /// Acquire the camera and move `INIT -> FRONT`
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `INIT`, `ModelNotReady` while the
    /// model is loading and `CameraAccess` if the camera cannot be opened. The
    /// state is unchanged on error.
    pub fn start_camera(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.state != PoseTarget::Init {
            return Err(Error::InvalidTransition(format!(
                "Camera can only be started from {}, current state is {}",
                PoseTarget::Init,
                self.state
            )));
        }
        if !self.model.is_ready() {
            warn!("Camera start requested before pose model '{}' is ready", self.model.name());
            return Err(Error::ModelNotReady);
        }

        let camera = CameraSession::open(source)?;
        self.camera = Some(camera);
        self.begin_session();
        self.transition(PoseTarget::Front);
        Ok(())
    }

    /// Read the next frame from the open camera
    ///
    /// Any read failure, including the end of the stream, releases the camera.
    ///
    /// # Errors
    ///
    /// Returns `CameraAccess` when no camera is open, otherwise the source error
    pub fn read_frame(&mut self) -> Result<Frame> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| Error::CameraAccess("Camera is not started".to_string()))?;

        match camera.read_frame() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                log_read_error(&e);
                self.release_camera();
                Err(e)
            }
        }
    }

    /// Reserve the single in-flight estimation slot for `frame`
    ///
    /// Returns `None` when the state is not capturing or an estimate is
    /// already outstanding.
    pub fn admit(&mut self, frame: &Frame) -> Option<Ticket> {
        if !self.state.is_capturing() || self.pending.is_some() {
            return None;
        }
        let ticket = Ticket {
            session: self.session,
            seq: frame.seq,
            target: self.state,
            at: frame.timestamp,
        };
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Apply a finished estimate
    ///
    /// A failed estimate counts as a frame without a face.
    ///
    /// # Errors
    ///
    /// Returns an error only if a triggered capture fails
    pub fn apply(&mut self, message: PoseMessage) -> Result<TickOutcome> {
        let PoseMessage { ticket, frame, result } = message;

        if self.pending == Some(ticket) {
            self.pending = None;
        }

        let discard = if ticket.session != self.session {
            Some(DiscardReason::StaleSession)
        } else if ticket.target != self.state {
            Some(DiscardReason::SupersededTarget)
        } else if self.last_applied_seq.is_some_and(|seq| ticket.seq <= seq) {
            Some(DiscardReason::OutOfOrder)
        } else {
            None
        };
        if let Some(reason) = discard {
            debug!("Discarded pose result for frame {} ({reason:?})", ticket.seq);
            return Ok(TickOutcome::Discarded(reason));
        }

        let pose = result.unwrap_or_else(|e| {
            warn!("Pose estimation failed for frame {}: {e}", ticket.seq);
            PoseResult::no_face()
        });
        self.last_applied_seq = Some(ticket.seq);
        self.last_pose = Some(pose);

        let status = self.tracker.evaluate(ticket.target, &pose, ticket.at);
        if status.just_completed {
            self.pose_stable(ticket.target, &frame)
        } else {
            Ok(TickOutcome::Evaluated(status))
        }
    }

    /// Estimate `frame` on the calling thread and apply the result
    ///
    /// # Errors
    ///
    /// Returns an error only if a triggered capture fails
    pub fn evaluate_frame(&mut self, frame: Frame) -> Result<TickOutcome> {
        let Some(ticket) = self.admit(&frame) else {
            return Ok(TickOutcome::Skipped);
        };
        let result = self.model.estimate(&frame);
        self.apply(PoseMessage { ticket, frame, result })
    }

    /// Capture `frame` for `target` and advance
    ///
    /// A no-op unless `target` is the current capturing state.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be encoded; the state is
    /// unchanged and the hold starts over
    pub fn pose_stable(&mut self, target: PoseTarget, frame: &Frame) -> Result<TickOutcome> {
        let Some(direction) = target.direction().filter(|_| target == self.state) else {
            debug!("Ignoring stability for {target}, current state is {}", self.state);
            return Ok(TickOutcome::Skipped);
        };

        let stored = frame_to_data_uri(&frame.image, self.jpeg_quality)
            .and_then(|data| self.store.append(CapturedImage::new(direction, data)));
        if let Err(e) = stored {
            warn!("Capture for {direction} failed: {e}");
            self.tracker.reset();
            return Err(e);
        }

        let next = target.next().unwrap_or(PoseTarget::Completed);
        info!(
            "Captured {direction} at {:?} ({}/{})",
            frame.timestamp,
            self.store.len(),
            Direction::ALL.len()
        );
        self.tracker.reset();
        self.transition(next);

        if next == PoseTarget::Completed {
            self.release_camera();
        }

        Ok(TickOutcome::Captured { direction, next })
    }

    /// Return to `INIT` from any state, dropping captures and the camera
    pub fn restart(&mut self) {
        self.release_camera();
        self.store.clear();
        self.begin_session();
        self.last_pose = None;
        self.transition(PoseTarget::Init);
    }

    /// Release the camera, keeping captures and state
    ///
    /// Outstanding estimates are discarded when they arrive. A [`restart`]
    /// is needed before the camera can be started again.
    ///
    /// [`restart`]: Self::restart
    pub fn stop_camera(&mut self) {
        self.release_camera();
        self.session += 1;
        self.pending = None;
    }

    /// Submit the five captures for `user_id`
    ///
    /// Does not change the orchestrator state; a failed submission can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` before `COMPLETED`, `InvalidInput` for an
    /// empty user id, `MissingDirections` if the store is incomplete and any
    /// error the client reports
    pub fn confirm(&self, client: &dyn RegistrationClient, user_id: &str) -> Result<RegistrationResponse> {
        if self.state != PoseTarget::Completed {
            return Err(Error::InvalidTransition(format!(
                "Cannot confirm in state {}",
                self.state
            )));
        }
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("User id must not be empty".to_string()));
        }

        let images = self.store.to_direction_map()?;
        let response = client.register(user_id, images)?;
        info!(
            "Registration for '{user_id}' accepted: {}",
            response.message.as_deref().unwrap_or("no message")
        );
        Ok(response)
    }

    /// Overlay for the current state and latest pose
    pub fn overlay(&self) -> OverlayState {
        let status = self.tracker.status();
        self.renderer.render(
            self.state,
            self.last_pose.as_ref(),
            status.elapsed,
            self.tracker.required_for(self.state),
        )
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            start_camera: self.state == PoseTarget::Init && self.model.is_ready(),
            restart: self.state != PoseTarget::Init || self.camera.is_some(),
            confirm: self.state == PoseTarget::Completed && self.store.is_complete(),
        }
    }

    pub fn state(&self) -> PoseTarget {
        self.state
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn images(&self) -> &[CapturedImage] {
        self.store.images()
    }

    /// Stability counter for the current target
    pub fn stability(&self) -> StabilityStatus {
        StabilityStatus {
            required: self.tracker.required_for(self.state),
            ..self.tracker.status()
        }
    }

    pub fn last_pose(&self) -> Option<&PoseResult> {
        self.last_pose.as_ref()
    }

    /// An estimate is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn is_camera_open(&self) -> bool {
        self.camera.as_ref().is_some_and(CameraSession::is_open)
    }

    fn begin_session(&mut self) {
        self.session += 1;
        self.pending = None;
        self.last_applied_seq = None;
        self.tracker.reset();
    }

    fn transition(&mut self, next: PoseTarget) {
        if self.state != next {
            info!("Capture state {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn release_camera(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.release();
        }
    }
}
