//! Helper fixtures and fakes for tests
#![allow(dead_code)]

use face_tracking::{
    actuation::{HeadActuator, JointTargets},
    config::Config,
    detection::{Detection, FaceDetector, Frame, FrameSource},
    geometry::BoundingBox,
    idle::IdleBehavior,
    Error, Result,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

/// A confident detection for the given box
pub fn face(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Detection {
    Detection::new(BoundingBox::new(x_min, y_min, x_max, y_max), 0.9)
}

/// A square face of side `side` centered on `(cx, cy)`
pub fn face_at(cx: f64, cy: f64, side: f64) -> Detection {
    let half = side / 2.0;
    face(cx - half, cy - half, cx + half, cy + half)
}

/// Default configuration with short periods and no pauses
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.controller.period_ms = 1;
    config.detection.period_ms = 1;
    config.orchestrator.decision_period_ms = 1;
    config.orchestrator.settle_delay_ms = 0;
    config.orchestrator.idle_pause_ms = 0;
    config.orchestrator.startup_look_at_secs = 0.0;
    config
}

/// Camera serving a blank detector-sized frame, optionally failing
#[derive(Clone)]
pub struct StaticCamera {
    frame: Frame,
    failing: Arc<AtomicBool>,
}

impl StaticCamera {
    pub fn new(size: u32) -> Self {
        Self {
            frame: Frame::new(size, size),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl FrameSource for StaticCamera {
    fn last_frame(&self) -> Result<Frame> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Camera("no frame available".to_string()));
        }
        Ok(self.frame.clone())
    }
}

/// Detector replaying queued results, then a fallback result forever
#[derive(Clone, Default)]
pub struct ScriptedDetector {
    script: Arc<Mutex<VecDeque<Result<Vec<Detection>>>>>,
    fallback: Arc<Mutex<Vec<Detection>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedDetector {
    pub fn push(&self, faces: Vec<Detection>) {
        self.script.lock().push_back(Ok(faces));
    }

    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .push_back(Err(Error::Detector(message.to_string())));
    }

    pub fn set_fallback(&self, faces: Vec<Detection>) {
        *self.fallback.lock() = faces;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.lock().clone()),
        }
    }
}

/// Head recording every command it receives
pub struct RecordingHead {
    reach: f64,
    previous: Mutex<[f64; 3]>,
    pub look_ats: Mutex<Vec<(f64, f64, f64, Duration)>>,
    pub goals: Mutex<Vec<JointTargets>>,
    pub turn_ons: AtomicUsize,
    pub turn_offs: AtomicUsize,
}

impl RecordingHead {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reach: 1.0,
            previous: Mutex::new([0.5, 0.0, 0.0]),
            look_ats: Mutex::new(Vec::new()),
            goals: Mutex::new(Vec::new()),
            turn_ons: AtomicUsize::new(0),
            turn_offs: AtomicUsize::new(0),
        })
    }

    pub fn set_previous_look_at(&self, point: [f64; 3]) {
        *self.previous.lock() = point;
    }

    pub fn goal_count(&self) -> usize {
        self.goals.lock().len()
    }
}

impl HeadActuator for RecordingHead {
    fn turn_on(&self) -> Result<()> {
        self.turn_ons.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn turn_off(&self) -> Result<()> {
        self.turn_offs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn look_at(&self, x: f64, y: f64, z: f64, duration: Duration) -> Result<()> {
        self.look_ats.lock().push((x, y, z, duration));
        *self.previous.lock() = [x, y, z];
        Ok(())
    }

    fn inverse_kinematics(&self, _x: f64, y: f64, z: f64) -> Result<JointTargets> {
        if y.abs() > self.reach || z.abs() > self.reach {
            return Err(Error::UnreachablePose { y, z });
        }
        Ok(JointTargets::new(0.0, z, y))
    }

    fn set_goal_positions(&self, joints: &JointTargets) -> Result<()> {
        self.goals.lock().push(*joints);
        Ok(())
    }

    fn previous_look_at(&self) -> [f64; 3] {
        *self.previous.lock()
    }
}

/// Idle behavior counting start and stop calls
#[derive(Clone, Default)]
pub struct CountingIdle {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
}

impl CountingIdle {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl IdleBehavior for CountingIdle {
    fn start(&mut self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
