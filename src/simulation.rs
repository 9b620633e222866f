//! Simulated collaborators for running the tracker without hardware.
//!
//! - [`SyntheticCamera`] serves a plain frame of fixed size
//! - [`SimulatedFaceDetector`] reports one face wandering across the image,
//!   which now and then leaves the field of view for a while
//! - [`SimulatedHead`] solves a simple look-at model over a bounded workspace
//! - [`RandomIdleMotion`] glances around at random while nobody is there

use crate::{
    actuation::{HeadActuator, JointTargets},
    detection::{Detection, FaceDetector, Frame, FrameSource},
    geometry::BoundingBox,
    idle::IdleBehavior,
    scheduler::PeriodicTask,
    Error, Result,
};
use image::Rgb;
use log::{debug, info};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Camera returning the same gray frame every time
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    frame: Frame,
}

impl SyntheticCamera {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Frame::from_pixel(width, height, Rgb([96, 96, 96])),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn last_frame(&self) -> Result<Frame> {
        Ok(self.frame.clone())
    }
}

/// Detector reporting a single face doing a random walk
#[derive(Debug)]
pub struct SimulatedFaceDetector {
    rng: StdRng,
    center: (f64, f64),
    side: f64,
    present: bool,
    step: f64,
    leave_probability: f64,
    return_probability: f64,
    distractor_probability: f64,
}

impl SimulatedFaceDetector {
    /// Detector seeded from system entropy
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible detector
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            center: (160.0, 160.0),
            side: 40.0,
            present: true,
            step: 3.0,
            leave_probability: 0.002,
            return_probability: 0.004,
            distractor_probability: 0.1,
        }
    }

    /// Chance per frame for the face to leave, then to come back
    #[must_use]
    pub fn with_presence(mut self, leave_probability: f64, return_probability: f64) -> Self {
        self.leave_probability = leave_probability.clamp(0.0, 1.0);
        self.return_probability = return_probability.clamp(0.0, 1.0);
        self
    }

    /// Chance per frame of an extra low-confidence detection
    #[must_use]
    pub fn with_distractors(mut self, probability: f64) -> Self {
        self.distractor_probability = probability.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    fn advance(&mut self, width: f64, height: f64) {
        let half = self.side / 2.0;
        let dx = self.rng.gen_range(-self.step..=self.step);
        let dy = self.rng.gen_range(-self.step..=self.step);
        self.center.0 = (self.center.0 + dx).clamp(half, (width - half).max(half));
        self.center.1 = (self.center.1 + dy).clamp(half, (height - half).max(half));
        self.side = (self.side + self.rng.gen_range(-1.0..=1.0)).clamp(12.0, 80.0);
    }
}

impl Default for SimulatedFaceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for SimulatedFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (width, height) = (f64::from(frame.width()), f64::from(frame.height()));

        if self.present {
            if self.rng.gen_bool(self.leave_probability) {
                self.present = false;
                debug!("Simulated face left the field of view");
            }
        } else if self.rng.gen_bool(self.return_probability) {
            self.present = true;
            self.center = (self.rng.gen_range(0.0..width), self.rng.gen_range(0.0..height));
            debug!("Simulated face came back");
        }

        let mut detections = Vec::new();
        if self.present {
            self.advance(width, height);
            let half = self.side / 2.0;
            detections.push(Detection::new(
                BoundingBox::new(
                    self.center.0 - half,
                    self.center.1 - half,
                    self.center.0 + half,
                    self.center.1 + half,
                ),
                0.9,
            ));
        }
        if self.rng.gen_bool(self.distractor_probability) {
            let x = self.rng.gen_range(0.0..width);
            let y = self.rng.gen_range(0.0..height);
            detections.push(Detection::new(BoundingBox::new(x, y, x + 10.0, y + 10.0), 0.2));
        }

        Ok(detections)
    }
}

#[derive(Debug, Clone, Copy)]
struct HeadState {
    powered: bool,
    joints: JointTargets,
    previous_look_at: [f64; 3],
}

/// Head with a look-at model over a bounded workspace
#[derive(Debug)]
pub struct SimulatedHead {
    state: Mutex<HeadState>,
    max_reach: f64,
    time_scale: f64,
}

impl SimulatedHead {
    /// Head reaching look-at points with `|y|, |z| <= max_reach`
    #[must_use]
    pub fn new(max_reach: f64) -> Self {
        Self {
            state: Mutex::new(HeadState {
                powered: false,
                joints: JointTargets::default(),
                previous_look_at: [1.0, 0.0, 0.0],
            }),
            max_reach,
            time_scale: 1.0,
        }
    }

    /// Scale blocking motion durations (0 makes them instantaneous)
    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale.max(0.0);
        self
    }

    #[must_use]
    pub fn is_powered(&self) -> bool {
        self.state.lock().powered
    }

    /// Joint goal positions last applied
    #[must_use]
    pub fn joints(&self) -> JointTargets {
        self.state.lock().joints
    }
}

impl Default for SimulatedHead {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl HeadActuator for SimulatedHead {
    fn turn_on(&self) -> Result<()> {
        self.state.lock().powered = true;
        info!("Simulated head turned on");
        Ok(())
    }

    fn turn_off(&self) -> Result<()> {
        self.state.lock().powered = false;
        info!("Simulated head turned off");
        Ok(())
    }

    fn look_at(&self, x: f64, y: f64, z: f64, duration: Duration) -> Result<()> {
        let joints = self.inverse_kinematics(x, y, z)?;
        self.set_goal_positions(&joints)?;
        thread::sleep(duration.mul_f64(self.time_scale));
        Ok(())
    }

    fn inverse_kinematics(&self, x: f64, y: f64, z: f64) -> Result<JointTargets> {
        let finite = x.is_finite() && y.is_finite() && z.is_finite();
        if !finite || x <= 0.0 || y.abs() > self.max_reach || z.abs() > self.max_reach {
            return Err(Error::UnreachablePose { y, z });
        }

        let joints = JointTargets::new(0.0, -z.atan2(x.hypot(y)), y.atan2(x));
        self.state.lock().previous_look_at = [x, y, z];
        Ok(joints)
    }

    fn set_goal_positions(&self, joints: &JointTargets) -> Result<()> {
        let mut state = self.state.lock();
        if !state.powered {
            return Err(Error::Actuator("Head is turned off".to_string()));
        }
        state.joints = *joints;
        Ok(())
    }

    fn previous_look_at(&self) -> [f64; 3] {
        self.state.lock().previous_look_at
    }
}

/// Idle behavior glancing at random points on its own thread
pub struct RandomIdleMotion {
    head: Arc<dyn HeadActuator>,
    task: PeriodicTask,
    depth: f64,
    amplitude: f64,
    move_duration: Duration,
    seed: Option<u64>,
}

impl RandomIdleMotion {
    /// Glance every `period` at points within `amplitude` of the center
    #[must_use]
    pub fn new(head: Arc<dyn HeadActuator>, depth: f64, amplitude: f64, period: Duration) -> Self {
        Self {
            head,
            task: PeriodicTask::new("idle-motion", period),
            depth,
            amplitude: amplitude.abs(),
            move_duration: period / 2,
            seed: None,
        }
    }

    /// Reproducible glances
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Glances made so far
    #[must_use]
    pub fn glances(&self) -> u64 {
        self.task.ticks()
    }
}

impl IdleBehavior for RandomIdleMotion {
    fn start(&mut self) -> Result<()> {
        if self.task.is_running() {
            return Ok(());
        }

        let head = Arc::clone(&self.head);
        let (depth, amplitude, move_duration) = (self.depth, self.amplitude, self.move_duration);
        let mut rng = self.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        self.task.start(move || {
            let y = rng.gen_range(-amplitude..=amplitude);
            let z = rng.gen_range(-amplitude..=amplitude);
            if let Err(e) = head.look_at(depth, y, z, move_duration) {
                debug!("Idle glance skipped: {e}");
            }
        })
        .map_err(|e| Error::IdleBehavior(e.to_string()))
    }

    fn stop(&mut self) -> Result<()> {
        self.task.stop();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_head_rejects_out_of_reach() {
        let head = SimulatedHead::new(0.5);
        let err = head.inverse_kinematics(0.5, 0.8, 0.0).unwrap_err();
        assert!(err.is_unreachable_pose());
        assert_eq!(head.previous_look_at(), [1.0, 0.0, 0.0]);

        let joints = head.inverse_kinematics(0.5, 0.0, 0.0).unwrap();
        assert_eq!(joints, JointTargets::default());
        assert_eq!(head.previous_look_at(), [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_simulated_head_needs_power() {
        let head = SimulatedHead::default().with_time_scale(0.0);
        assert!(matches!(
            head.set_goal_positions(&JointTargets::default()),
            Err(Error::Actuator(_))
        ));

        head.turn_on().unwrap();
        head.look_at(0.5, 0.2, 0.0, Duration::from_secs(5)).unwrap();
        assert!(head.joints().yaw > 0.0);
    }

    #[test]
    fn test_detector_is_reproducible() {
        let frame = SyntheticCamera::new(320, 320).last_frame().unwrap();
        let mut a = SimulatedFaceDetector::with_seed(7);
        let mut b = SimulatedFaceDetector::with_seed(7);

        for _ in 0..50 {
            assert_eq!(a.detect(&frame).unwrap(), b.detect(&frame).unwrap());
        }
    }

    #[test]
    fn test_absent_face_yields_no_confident_detection() {
        let frame = SyntheticCamera::new(320, 320).last_frame().unwrap();
        let mut detector = SimulatedFaceDetector::with_seed(1)
            .with_presence(1.0, 0.0)
            .with_distractors(0.0);

        assert!(detector.detect(&frame).unwrap().is_empty());
        assert!(!detector.is_present());
    }

    #[test]
    fn test_random_idle_motion_glances() {
        let head = Arc::new(SimulatedHead::default().with_time_scale(0.0));
        head.turn_on().unwrap();
        let mut idle = RandomIdleMotion::new(head.clone(), 0.5, 0.2, Duration::from_millis(2)).with_seed(3);

        idle.start().unwrap();
        assert!(idle.is_running());
        thread::sleep(Duration::from_millis(20));
        idle.stop().unwrap();

        assert!(!idle.is_running());
        assert!(idle.glances() > 0);
        let [_, y, z] = head.previous_look_at();
        assert!(y.abs() <= 0.2 && z.abs() <= 0.2);
    }
}
