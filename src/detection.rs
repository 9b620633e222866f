//! Face detection loop and the shared target it publishes.
//!
//! The [`DetectionLoop`] pulls the most recent camera frame, runs the face
//! detector on it, picks one face with the [`CandidateSelector`] and publishes
//! the result through [`SharedTarget`]. The detection thread is the only
//! writer of the target; readers always get a consistent [`TargetSnapshot`].
//! On a frame without faces the last target stays published and only the
//! presence flag drops.

use crate::{
    config::DetectionConfig,
    geometry::BoundingBox,
    scheduler::{LoopState, PeriodicTask},
    selection::{CandidateSelector, Selection, TrackedTarget},
    Result,
};
use image::{imageops, RgbImage};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// An RGB camera frame
pub type Frame = RgbImage;

/// Face detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Bounding box of the detected face
    pub bbox: BoundingBox,
    /// Confidence score of the detection
    pub score: f32,
}

impl Detection {
    #[must_use]
    pub const fn new(bbox: BoundingBox, score: f32) -> Self {
        Self { bbox, score }
    }
}

/// Source of the most recent camera frame
pub trait FrameSource: Send + Sync {
    /// Latest available frame; never queued
    fn last_frame(&self) -> Result<Frame>;
}

/// Black-box face detector
pub trait FaceDetector: Send {
    /// Faces found in `frame`, in detector order
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Consistent view of the tracked face
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetSnapshot {
    /// Last selected face; stale when nobody is detected
    pub target: TrackedTarget,
    /// Whether the latest processed frame contained a face
    pub somebody_detected: bool,
    /// Number of publications so far
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct TargetState {
    published: TargetSnapshot,
    // Previous face used for continuity; reset independently of the published target
    reference: TrackedTarget,
}

/// Single-writer, multi-reader publication of the tracked face
#[derive(Debug, Default)]
pub struct SharedTarget {
    state: RwLock<TargetState>,
}

impl SharedTarget {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn snapshot(&self) -> TargetSnapshot {
        self.state.read().published
    }

    #[must_use]
    pub fn somebody_detected(&self) -> bool {
        self.state.read().published.somebody_detected
    }

    /// Face the next selection is compared against
    #[must_use]
    pub fn reference(&self) -> TrackedTarget {
        self.state.read().reference
    }

    /// Select among `detections` and publish the outcome atomically
    pub fn apply_detections(&self, selector: &CandidateSelector, detections: &[Detection]) -> Option<Selection> {
        let mut state = self.state.write();
        let selection = selector.select(&state.reference, detections);

        match &selection {
            Some(selection) => {
                let target = selection.to_target();
                state.published.target = target;
                state.published.somebody_detected = true;
                state.reference = target;
            }
            None => state.published.somebody_detected = false,
        }
        state.published.sequence += 1;

        selection
    }

    /// Forget the previous face so the next selection starts from the origin
    pub fn reset_reference(&self) {
        self.state.write().reference = TrackedTarget::default();
    }
}

/// Counters of the detection thread
#[derive(Debug, Default)]
pub struct DetectionStats {
    frames: AtomicU64,
    frames_with_faces: AtomicU64,
    failures: AtomicU64,
}

impl DetectionStats {
    /// Frames run through the detector
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Frames in which a face was selected
    #[must_use]
    pub fn frames_with_faces(&self) -> u64 {
        self.frames_with_faces.load(Ordering::Relaxed)
    }

    /// Ticks skipped because the camera or detector failed
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Cut `bbox` out of `frame`, clamped to the frame bounds
#[must_use]
pub fn crop_face(frame: &Frame, bbox: &BoundingBox) -> Option<Frame> {
    let clamp_x = |v: f64| v.clamp(0.0, f64::from(frame.width())) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, f64::from(frame.height())) as u32;

    let (x0, x1) = (clamp_x(bbox.x_min), clamp_x(bbox.x_max));
    let (y0, y1) = (clamp_y(bbox.y_min), clamp_y(bbox.y_max));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(imageops::crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image())
}

#[derive(Clone)]
struct DetectionWorker {
    camera: Arc<dyn FrameSource>,
    detector: Arc<Mutex<Box<dyn FaceDetector>>>,
    selector: CandidateSelector,
    score_threshold: f32,
    input_size: u32,
    shared: Arc<SharedTarget>,
    last_face: Arc<Mutex<Option<Frame>>>,
    stats: Arc<DetectionStats>,
}

impl DetectionWorker {
    fn tick(&self) -> Result<Option<Selection>> {
        let mut frame = self.camera.last_frame()?;
        if frame.width() != self.input_size || frame.height() != self.input_size {
            frame = imageops::resize(&frame, self.input_size, self.input_size, imageops::FilterType::Triangle);
        }

        let mut detections = self.detector.lock().detect(&frame)?;
        detections.retain(|d| d.score >= self.score_threshold);
        self.stats.frames.fetch_add(1, Ordering::Relaxed);

        let selection = self.shared.apply_detections(&self.selector, &detections);
        if let Some(selection) = &selection {
            self.stats.frames_with_faces.fetch_add(1, Ordering::Relaxed);
            *self.last_face.lock() = crop_face(&frame, &selection.bbox);
        }

        Ok(selection)
    }
}

/// Periodic face detection thread
pub struct DetectionLoop {
    worker: DetectionWorker,
    task: PeriodicTask,
}

impl DetectionLoop {
    /// Create a stopped detection loop
    pub fn new<C, D>(camera: C, detector: D, config: &DetectionConfig) -> Self
    where
        C: FrameSource + 'static,
        D: FaceDetector + 'static,
    {
        Self::with_shared(camera, detector, config, SharedTarget::new())
    }

    /// Create a stopped detection loop publishing into `shared`
    pub fn with_shared<C, D>(camera: C, detector: D, config: &DetectionConfig, shared: Arc<SharedTarget>) -> Self
    where
        C: FrameSource + 'static,
        D: FaceDetector + 'static,
    {
        let detector: Box<dyn FaceDetector> = Box::new(detector);
        Self {
            worker: DetectionWorker {
                camera: Arc::new(camera),
                detector: Arc::new(Mutex::new(detector)),
                selector: CandidateSelector::new(config.continuity_area_ratio),
                score_threshold: config.score_threshold,
                input_size: config.input_size,
                shared,
                last_face: Arc::new(Mutex::new(None)),
                stats: Arc::new(DetectionStats::default()),
            },
            task: PeriodicTask::new("face-detection", config.period()),
        }
    }

    /// Start detecting; returns once the detection thread is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the detection thread cannot be launched.
    pub fn start(&mut self) -> Result<()> {
        let worker = self.worker.clone();
        let stats = Arc::clone(&self.worker.stats);

        self.task.start(move || match worker.tick() {
            Ok(Some(selection)) => debug!("Face at {:?}", selection.bbox.center()),
            Ok(None) => {}
            Err(e) => {
                stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Skipping detection tick: {e}");
            }
        })
    }

    /// Stop detecting; returns once the detection thread has exited
    pub fn stop(&mut self) {
        self.task.stop();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    #[must_use]
    pub fn loop_state(&self) -> LoopState {
        self.task.state()
    }

    /// Run one detection cycle on the calling thread
    ///
    /// # Errors
    ///
    /// Returns the camera or detector error; the published target is untouched.
    pub fn process_once(&self) -> Result<Option<Selection>> {
        self.worker.tick().map_err(|e| {
            self.worker.stats.failures.fetch_add(1, Ordering::Relaxed);
            e
        })
    }

    #[must_use]
    pub fn shared(&self) -> &Arc<SharedTarget> {
        &self.worker.shared
    }

    #[must_use]
    pub fn snapshot(&self) -> TargetSnapshot {
        self.worker.shared.snapshot()
    }

    #[must_use]
    pub fn somebody_detected(&self) -> bool {
        self.worker.shared.somebody_detected()
    }

    /// Forget the previous face used for continuity
    pub fn reset_previous_target(&self) {
        self.worker.shared.reset_reference();
    }

    /// Pixels of the most recently selected face
    #[must_use]
    pub fn last_face(&self) -> Option<Frame> {
        self.worker.last_face.lock().clone()
    }

    #[must_use]
    pub fn stats(&self) -> &DetectionStats {
        &self.worker.stats
    }
}
