//! Guided face orientation capture for biometric onboarding.
//!
//! This library drives a live camera feed through a fixed sequence of head
//! poses and collects one still per pose:
//! - A per-frame [`PoseResult`](pose::PoseResult) (face present, inside the
//!   guide region, roll/pitch/yaw) comes from a pluggable
//!   [`PoseEstimator`](estimator::PoseEstimator)
//! - Angular acceptance windows decide whether the frame matches the
//!   current target
//! - A stability tracker debounces matches over a hold duration
//! - Once the hold completes, the frame is captured as a JPEG data URI and
//!   the sequence advances
//!
//! The sequence is `INIT → FRONT → LEFT → RIGHT → UP → DOWN → COMPLETED`.
//! When it completes, the five captures are submitted to a registration
//! service as a direction map.
//!
//! # Examples
//!
//! ## Driving the state machine frame by frame
//!
//! ```no_run
//! use face_orientation_capture::{
//!     config::Config,
//!     orchestrator::{CaptureOrchestrator, TickOutcome},
//!     trace::{PoseTrace, TraceCamera, TraceEstimator},
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let trace = Arc::new(PoseTrace::orientation_tour(Duration::from_secs(4)));
//! let model = Arc::new(TraceEstimator::new(Arc::clone(&trace)));
//!
//! let mut orchestrator = CaptureOrchestrator::new(&Config::default(), model);
//! orchestrator.start_camera(Box::new(TraceCamera::new(trace)))?;
//!
//! while orchestrator.state().is_capturing() {
//!     let frame = orchestrator.read_frame()?;
//!     if let TickOutcome::Captured { direction, next } = orchestrator.evaluate_frame(frame)? {
//!         println!("Captured {direction}, now {next}");
//!     }
//!
//!     let overlay = orchestrator.overlay();
//!     println!("{} {} {}", overlay.stage_text, overlay.border.color(), overlay.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Background estimation and registration
//!
//! ```no_run
//! use face_orientation_capture::{
//!     app::CaptureApp,
//!     config::Config,
//!     estimator::shared_model,
//!     registration::HttpRegistrationClient,
//!     trace::{PoseTrace, TraceCamera, TraceEstimator},
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let trace = Arc::new(PoseTrace::orientation_tour(Duration::from_secs(4)));
//! let model = shared_model(|| Arc::new(TraceEstimator::new(Arc::clone(&trace))));
//!
//! let mut app = CaptureApp::new(config.clone(), model)?;
//! let summary = app.run(Box::new(TraceCamera::new(trace)))?;
//! println!("Captured {:?}", summary.captured);
//!
//! let client = HttpRegistrationClient::new(&config.registration);
//! let response = app.confirm(&client, "01012345678")?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

/// Pose targets, capture directions and rotation estimates
pub mod pose;

/// Angular acceptance windows per target pose
pub mod acceptance;

/// Hold-duration debouncing of pose matches
pub mod stability;

/// Captured stills and the registration direction map
pub mod image_store;

/// Border, guideline and timer feedback
pub mod overlay;

/// Frame sources and the scoped camera session
pub mod camera;

/// Pose estimator trait and the shared model handle
pub mod estimator;

/// Background pose estimation thread
pub mod worker;

/// The capture state machine
pub mod orchestrator;

/// Registration service client
pub mod registration;

/// Scripted pose traces for replay
pub mod trace;

/// Utility functions for encoding and timing
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
