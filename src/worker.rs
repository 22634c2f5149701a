//! Background pose estimation.
//!
//! Frames are handed to a dedicated thread that runs the shared
//! [`PoseEstimator`]; results come back over a channel to the single
//! consumer driving the capture flow. Every job carries a [`Ticket`] so the
//! consumer can tell whether a late result still belongs to the current run
//! and target.

use crate::{camera::Frame, estimator::PoseEstimator, pose::PoseResult, pose::PoseTarget, Error, Result};
use log::{debug, warn};
use std::{
    sync::{mpsc, Arc},
    thread::JoinHandle,
    time::Duration,
};

/// Identifies the request a pose result answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Capture run; bumped on restart and camera stop
    pub session: u64,
    /// Frame sequence number within the stream
    pub seq: u64,
    /// Target that was current when the frame was submitted
    pub target: PoseTarget,
    /// Frame timestamp
    pub at: Duration,
}

/// Work item for the pose thread
#[derive(Debug)]
pub struct PoseJob {
    pub ticket: Ticket,
    pub frame: Frame,
}

/// Estimate returned by the pose thread
#[derive(Debug)]
pub struct PoseMessage {
    pub ticket: Ticket,
    /// The frame is handed back so a capture can use it without copying
    pub frame: Frame,
    pub result: Result<PoseResult>,
}

/// Handle to the pose estimation thread
pub struct PoseWorker {
    job_tx: Option<mpsc::Sender<PoseJob>>,
    result_rx: mpsc::Receiver<PoseMessage>,
    handle: Option<JoinHandle<()>>,
}

impl PoseWorker {
    /// Start the worker thread
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned
    pub fn spawn(model: Arc<dyn PoseEstimator>) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<PoseJob>();
        let (result_tx, result_rx) = mpsc::channel::<PoseMessage>();

        let handle = std::thread::Builder::new()
            .name("pose-worker".into())
            .spawn(move || pose_thread(&*model, &job_rx, &result_tx))?;

        Ok(Self {
            job_tx: Some(job_tx),
            result_rx,
            handle: Some(handle),
        })
    }

    /// Queue a frame for estimation
    ///
    /// # Errors
    ///
    /// Returns `Worker` if the thread has stopped
    pub fn submit(&self, job: PoseJob) -> Result<()> {
        let tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| Error::Worker("Pose worker already shut down".to_string()))?;
        tx.send(job)
            .map_err(|_| Error::Worker("Pose worker thread exited".to_string()))
    }

    /// Next finished estimate, if one is waiting
    ///
    /// # Errors
    ///
    /// Returns `Worker` if the thread has stopped and nothing is queued
    pub fn try_recv(&self) -> Result<Option<PoseMessage>> {
        match self.result_rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(Error::Worker("Pose worker thread exited".to_string())),
        }
    }

    /// Wait up to `timeout` for the next estimate
    ///
    /// # Errors
    ///
    /// Returns `Worker` if the thread has stopped and nothing is queued
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<PoseMessage>> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::Worker("Pose worker thread exited".to_string()))
            }
        }
    }

    /// Whether the thread is still alive and accepting jobs
    pub fn is_running(&self) -> bool {
        self.job_tx.is_some() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop accepting jobs and wait for the thread to finish
    pub fn shutdown(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Pose worker thread panicked");
            }
        }
    }
}

impl Drop for PoseWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn pose_thread(model: &dyn PoseEstimator, jobs: &mpsc::Receiver<PoseJob>, results: &mpsc::Sender<PoseMessage>) {
    debug!("Pose worker started with '{}'", model.name());
    for PoseJob { ticket, frame } in jobs {
        let result = model.estimate(&frame);
        if results.send(PoseMessage { ticket, frame, result }).is_err() {
            debug!("Pose result receiver dropped, worker exiting");
            return;
        }
    }
    debug!("Pose worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::RotationState;
    use image::RgbImage;

    struct YawFromSeq;

    impl PoseEstimator for YawFromSeq {
        fn estimate(&self, frame: &Frame) -> Result<PoseResult> {
            Ok(PoseResult::detected(RotationState::new(0.0, 0.0, frame.seq as f64)))
        }
    }

    fn job(seq: u64) -> PoseJob {
        let at = Duration::from_millis(seq * 50);
        PoseJob {
            ticket: Ticket {
                session: 1,
                seq,
                target: PoseTarget::Front,
                at,
            },
            frame: Frame::new(seq, at, RgbImage::new(2, 2)),
        }
    }

    #[test]
    fn test_results_follow_submission_order() {
        let mut worker = PoseWorker::spawn(Arc::new(YawFromSeq)).unwrap();
        for seq in 0..5 {
            worker.submit(job(seq)).unwrap();
        }
        for seq in 0..5 {
            let msg = worker.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
            assert_eq!(msg.ticket.seq, seq);
            assert_eq!(msg.result.unwrap().rotation.yaw, seq as f64);
        }
        worker.shutdown();
        assert!(worker.submit(job(9)).is_err());
    }

    struct Panicking;

    impl PoseEstimator for Panicking {
        fn estimate(&self, _frame: &Frame) -> Result<PoseResult> {
            panic!("model crashed");
        }
    }

    #[test]
    fn test_dead_thread_reports_worker_error() {
        let mut worker = PoseWorker::spawn(Arc::new(Panicking)).unwrap();
        assert!(worker.is_running());
        worker.submit(job(0)).unwrap();
        assert!(matches!(
            worker.recv_timeout(Duration::from_secs(5)),
            Err(Error::Worker(_))
        ));
        worker.shutdown();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = PoseWorker::spawn(Arc::new(YawFromSeq)).unwrap();
        assert!(worker.try_recv().unwrap().is_none());
    }
}
