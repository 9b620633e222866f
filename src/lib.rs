//! Face tracking head control library.
//!
//! This library keeps a robot head pointed at a face seen by its camera:
//! - A detection loop picks one face per frame and publishes it
//! - A PD tracker turns the face offset into incremental look commands
//! - A control loop servos the head smoothly toward the latest command
//! - An orchestrator supervises both loops and falls back to idle behavior
//!
//! Camera, face detector, head and idle behavior are collaborators behind
//! traits ([`detection::FrameSource`], [`detection::FaceDetector`],
//! [`actuation::HeadActuator`], [`idle::IdleBehavior`]).
//!
//! # Examples
//!
//! ## Selecting a face
//!
//! ```
//! use face_tracking::{
//!     detection::Detection,
//!     geometry::BoundingBox,
//!     selection::{CandidateSelector, SelectionMode, TrackedTarget},
//! };
//!
//! let selector = CandidateSelector::default();
//! let previous = TrackedTarget::from_bbox(BoundingBox::new(0.0, 0.0, 5.0, 5.0));
//! let candidates = [
//!     Detection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9),
//!     Detection::new(BoundingBox::new(100.0, 100.0, 150.0, 150.0), 0.8),
//! ];
//!
//! let selection = selector.select(&previous, &candidates).unwrap();
//! assert_eq!(selection.index, 1);
//! assert_eq!(selection.mode, SelectionMode::Salience);
//! ```
//!
//! ## Running the tracker on simulated hardware
//!
//! ```no_run
//! use face_tracking::{
//!     config::Config,
//!     orchestrator::TrackingOrchestrator,
//!     simulation::{RandomIdleMotion, SimulatedFaceDetector, SimulatedHead, SyntheticCamera},
//! };
//! use std::sync::{atomic::AtomicBool, Arc};
//! use std::time::{Duration, Instant};
//!
//! # fn main() -> face_tracking::Result<()> {
//! let config = Config::default();
//! let head = Arc::new(SimulatedHead::default());
//! let idle = RandomIdleMotion::new(head.clone(), 0.5, 0.2, Duration::from_secs(2));
//!
//! let mut tracker = TrackingOrchestrator::new(
//!     &config,
//!     SyntheticCamera::new(640, 480),
//!     SimulatedFaceDetector::new(),
//!     head,
//!     idle,
//! );
//! tracker.setup()?;
//! tracker.run(&AtomicBool::new(false), Some(Instant::now() + Duration::from_secs(10)))?;
//! tracker.shutdown();
//! # Ok(())
//! # }
//! ```

/// Head actuation trait and the servo callback
pub mod actuation;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Interpolated head control loop
pub mod controller;

/// Face detection loop and shared target publication
pub mod detection;

/// Error types and result handling
pub mod error;

/// Bounding boxes and points
pub mod geometry;

/// Idle behavior trait
pub mod idle;

/// Linear interpolation between look commands
pub mod interpolation;

/// Tracking supervisor
pub mod orchestrator;

/// PD tracker producing look commands
pub mod pid;

/// Fixed-period worker threads
pub mod scheduler;

/// Temporal-continuity face selection
pub mod selection;

/// Simulated camera, detector, head and idle behavior
pub mod simulation;

pub use error::{Error, Result};
