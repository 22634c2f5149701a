//! Host loop tying the camera, the pose worker and the orchestrator together.

use crate::{
    camera::FrameSource,
    config::Config,
    error::{Error, Result},
    estimator::PoseEstimator,
    orchestrator::{CaptureOrchestrator, TickOutcome},
    pose::{Direction, PoseTarget},
    registration::{RegistrationClient, RegistrationResponse},
    worker::{PoseJob, PoseMessage, PoseWorker},
};
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Frames read from the camera
    pub frames: u64,
    /// Estimates applied to the state machine
    pub evaluated: u64,
    /// Estimates dropped as stale
    pub discarded: u64,
    /// Estimates that did not arrive in time
    pub timed_out: u64,
    /// Directions captured in order
    pub captured: Vec<Direction>,
    /// Stream offset of the last frame read
    pub stream_time: Duration,
}

/// The capture application
pub struct CaptureApp {
    config: Config,
    orchestrator: CaptureOrchestrator,
    model: Arc<dyn PoseEstimator>,
    worker: PoseWorker,
}

impl CaptureApp {
    /// Validate `config` and start the pose worker
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the worker thread
    /// cannot be spawned
    pub fn new(config: Config, model: Arc<dyn PoseEstimator>) -> Result<Self> {
        info!("Initializing face capture with pose model '{}'", model.name());
        config.validate()?;

        let worker = PoseWorker::spawn(Arc::clone(&model))?;
        let orchestrator = CaptureOrchestrator::new(&config, Arc::clone(&model));

        Ok(Self {
            config,
            orchestrator,
            model,
            worker,
        })
    }

    /// Start the camera and run until every direction is captured or the
    /// stream ends
    ///
    /// The camera is released whenever the run fails. A pose worker that died
    /// is replaced, so a later run after [`restart`](Self::restart) starts clean.
    ///
    /// # Errors
    ///
    /// Returns the `start_camera` errors, camera failures other than the end
    /// of the stream, worker failures and capture encoding failures
    pub fn run(&mut self, source: Box<dyn FrameSource>) -> Result<CaptureSummary> {
        if !self.worker.is_running() {
            warn!("Pose worker is not running, starting a new one");
            self.respawn_worker()?;
        }
        self.orchestrator.start_camera(source)?;

        let mut summary = CaptureSummary::default();
        match self.capture_loop(&mut summary) {
            Ok(()) => {
                info!(
                    "Capture run finished in state {} after {} frames ({} discarded)",
                    self.orchestrator.state(),
                    summary.frames,
                    summary.discarded
                );
                Ok(summary)
            }
            Err(e) => {
                warn!("Capture run failed in state {}: {}", self.orchestrator.state(), e);
                self.orchestrator.stop_camera();
                if matches!(e, Error::Worker(_)) {
                    if let Err(spawn_err) = self.respawn_worker() {
                        warn!("Failed to restart pose worker: {}", spawn_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn capture_loop(&mut self, summary: &mut CaptureSummary) -> Result<()> {
        let timeout = self.config.capture.estimation_timeout();

        while self.orchestrator.state().is_capturing() {
            // Late answers from a timed-out request
            while let Some(message) = self.worker.try_recv()? {
                self.handle(message, summary)?;
            }

            let frame = match self.orchestrator.read_frame() {
                Ok(frame) => frame,
                Err(Error::EndOfStream) => {
                    warn!(
                        "Camera stream ended in state {} with {}/{} captures",
                        self.orchestrator.state(),
                        summary.captured.len(),
                        Direction::ALL.len()
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            summary.frames += 1;
            summary.stream_time = frame.timestamp;

            let Some(ticket) = self.orchestrator.admit(&frame) else {
                continue;
            };
            self.worker.submit(PoseJob { ticket, frame })?;

            match self.worker.recv_timeout(timeout)? {
                Some(message) => self.handle(message, summary)?,
                None => {
                    summary.timed_out += 1;
                    warn!("Pose estimate for frame {} timed out after {timeout:?}", ticket.seq);
                }
            }
        }
        Ok(())
    }

    fn respawn_worker(&mut self) -> Result<()> {
        self.worker = PoseWorker::spawn(Arc::clone(&self.model))?;
        info!("Pose worker restarted with '{}'", self.model.name());
        Ok(())
    }

    fn handle(&mut self, message: PoseMessage, summary: &mut CaptureSummary) -> Result<()> {
        match self.orchestrator.apply(message)? {
            TickOutcome::Captured { direction, next } => {
                summary.evaluated += 1;
                summary.captured.push(direction);
                info!("{} captured, next: {}", direction, self.orchestrator.overlay().stage_text);
                if next == PoseTarget::Completed {
                    info!("All {} directions captured", Direction::ALL.len());
                }
            }
            TickOutcome::Evaluated(status) => {
                summary.evaluated += 1;
                let overlay = self.orchestrator.overlay();
                debug!(
                    "{} [{}] {} ({:.0}%)",
                    overlay.stage_text,
                    overlay.border.color(),
                    overlay.message,
                    status.progress() * 100.0
                );
            }
            TickOutcome::Discarded(_) => summary.discarded += 1,
            TickOutcome::Skipped => {}
        }
        Ok(())
    }

    /// Submit the captured set for `user_id`
    ///
    /// # Errors
    ///
    /// See [`CaptureOrchestrator::confirm`]
    pub fn confirm(&self, client: &dyn RegistrationClient, user_id: &str) -> Result<RegistrationResponse> {
        self.orchestrator.confirm(client, user_id)
    }

    /// Discard captures and return to `INIT`
    pub fn restart(&mut self) {
        self.orchestrator.restart();
    }

    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
