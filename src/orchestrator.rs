//! Tracking supervisor.
//!
//! The [`TrackingOrchestrator`] owns the detection and control loops and runs
//! the decision loop on the calling thread. Each decision tick reads the
//! published target snapshot and either feeds it through the PD tracker,
//! waits, or hands the head over to the idle behavior once nobody has been
//! seen for longer than the patience window.

use crate::{
    actuation::{servo, HeadActuator},
    config::{Config, OrchestratorConfig},
    controller::ControlLoop,
    detection::{DetectionLoop, FaceDetector, FrameSource, TargetSnapshot},
    geometry::Point2D,
    idle::IdleBehavior,
    pid::{CommandPosition, PidUpdate},
    selection::TrackedTarget,
    Error, Result,
};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// What a decision tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A face was tracked
    Tracking,
    /// A close face was tracked and tracking mode re-asserted
    Engaged,
    /// Nobody detected, still within patience
    Waiting,
    /// Patience exhausted; idle behavior triggered
    Idle,
}

/// Supervises detection, control and idle behavior
pub struct TrackingOrchestrator {
    config: OrchestratorConfig,
    head: Arc<dyn HeadActuator>,
    detection: DetectionLoop,
    control: ControlLoop,
    idle: Box<dyn IdleBehavior>,
    goal: Point2D,
    command: CommandPosition,
    previous_offset: CommandPosition,
    target: TrackedTarget,
    no_detection_count: u32,
    idle_triggers: u64,
    command_history: VecDeque<f64>,
    shut_down: bool,
}

impl TrackingOrchestrator {
    /// Wire the loops around the given collaborators; nothing is started
    pub fn new<C, D, I>(config: &Config, camera: C, detector: D, head: Arc<dyn HeadActuator>, idle: I) -> Self
    where
        C: FrameSource + 'static,
        D: FaceDetector + 'static,
        I: IdleBehavior + 'static,
    {
        let depth = config.orchestrator.look_at_depth;
        let servo_head = Arc::clone(&head);
        let control = ControlLoop::new(Point2D::zeros(), &config.controller, config.pid, move |position| {
            servo(servo_head.as_ref(), &position, depth)
        });
        let center = config.detection.image_center();

        Self {
            config: config.orchestrator.clone(),
            head,
            detection: DetectionLoop::new(camera, detector, &config.detection),
            control,
            idle: Box::new(idle),
            goal: Point2D::new(center, center),
            command: CommandPosition::default(),
            previous_offset: CommandPosition::default(),
            target: TrackedTarget::default(),
            no_detection_count: 0,
            idle_triggers: 0,
            command_history: VecDeque::with_capacity(config.orchestrator.command_history),
            shut_down: false,
        }
    }

    /// Turn the head on and bring it to the neutral pose.
    ///
    /// # Errors
    ///
    /// Returns the actuator error if the head cannot be powered or moved.
    pub fn setup(&mut self) -> Result<()> {
        info!("Setting up the head before tracking");
        self.head.turn_on()?;
        self.head
            .look_at(self.config.look_at_depth, 0.0, 0.0, self.config.startup_look_at())?;

        let [_, y, z] = self.head.previous_look_at();
        self.control.reset(Point2D::new(y, z));
        self.command = CommandPosition::new(y, z);
        self.previous_offset = CommandPosition::default();
        self.record_command();
        self.shut_down = false;
        Ok(())
    }

    /// Start the control loop; no-op if it already runs
    ///
    /// # Errors
    ///
    /// Returns an error if the control thread cannot be launched.
    pub fn activate_tracking_mode(&mut self) -> Result<()> {
        self.control.start()
    }

    pub fn deactivate_tracking_mode(&mut self) {
        self.control.stop();
    }

    /// Copy the published target into the orchestrator
    pub fn get_target_info(&mut self) -> TargetSnapshot {
        let snapshot = self.detection.snapshot();
        self.target = snapshot.target;
        if self.command_history.is_empty() {
            self.record_command();
        }
        snapshot
    }

    /// Run one PD step toward the current target and make it the control target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the target center is not finite; the
    /// command state is left untouched.
    pub fn track(&mut self) -> Result<PidUpdate> {
        let input = self.target.center();
        if !input.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "Target center ({}, {}) is not finite",
                input.x, input.y
            )));
        }

        let update = self.control.track(self.command, self.previous_offset, &self.goal, &input);
        self.command = update.command;
        self.previous_offset = update.offset;
        self.record_command();

        debug!("Command y={:.3}, z={:.3}", self.command.y, self.command.z);
        Ok(update)
    }

    /// Hold the head on the last issued command
    pub fn look_at_previous_target(&self) {
        self.control.set_new_target(self.command.to_point());
    }

    /// Restart tracking from where the head currently looks.
    ///
    /// Resets the command to the last look-at pose, forgets the derivative
    /// history, clears the controller's update history and makes the next
    /// selection start from the origin.
    pub fn reinitialize_target(&mut self) {
        let [_, y, z] = self.head.previous_look_at();
        self.command = CommandPosition::new(y, z);
        self.previous_offset = CommandPosition::default();
        self.control.reset(Point2D::new(y, z));
        self.detection.reset_previous_target();
        debug!("Target reinitialized at y={y:.3}, z={z:.3}");
    }

    /// One decision tick.
    ///
    /// When a face is seen, the settle delay is slept after the first PD step
    /// and before the proximity check.
    ///
    /// # Errors
    ///
    /// Returns collaborator errors (idle behavior, thread launch, invalid target).
    /// The counter and outcome logic are unaffected by them.
    pub fn step(&mut self) -> Result<TickOutcome> {
        if !self.detection.somebody_detected() {
            return self.on_nobody();
        }

        if self.idle.is_running() {
            info!("Face found again, leaving idle behavior");
            self.idle.stop()?;
            self.reinitialize_target();
        }

        let snapshot = self.get_target_info();
        debug!(
            "Someone has been detected at ({:.1}, {:.1})",
            snapshot.target.center_x, snapshot.target.center_y
        );
        self.no_detection_count = 0;
        self.track()?;
        thread::sleep(self.config.settle_delay());

        if self.target.area > self.config.proximity_threshold {
            self.activate_tracking_mode()?;
            self.track()?;
            return Ok(TickOutcome::Engaged);
        }

        Ok(TickOutcome::Tracking)
    }

    fn on_nobody(&mut self) -> Result<TickOutcome> {
        if self.no_detection_count < self.config.patience {
            self.no_detection_count += 1;
            return Ok(TickOutcome::Waiting);
        }

        info!("No one detected, switching to idle behavior");
        self.no_detection_count = 0;
        self.idle_triggers += 1;
        self.idle.start()?;
        Ok(TickOutcome::Idle)
    }

    /// Start both loops and run decision ticks until `stop` is set or
    /// `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns an error if a loop thread cannot be launched. Errors raised by
    /// individual ticks are logged and the loop carries on.
    pub fn run(&mut self, stop: &AtomicBool, deadline: Option<Instant>) -> Result<()> {
        self.detection.start()?;
        self.activate_tracking_mode()?;
        thread::sleep(self.config.decision_period());

        let mut ticks = 0u64;
        while !stop.load(Ordering::SeqCst) && deadline.map_or(true, |d| Instant::now() < d) {
            match self.step() {
                Ok(TickOutcome::Idle) => thread::sleep(self.config.idle_pause()),
                Ok(_) => {}
                Err(e) => warn!("Decision tick failed: {e}"),
            }
            ticks += 1;
            thread::sleep(self.config.decision_period());
        }

        info!(
            "Decision loop finished after {ticks} ticks ({} idle triggers, {} skipped control ticks)",
            self.idle_triggers,
            self.control.skipped_ticks()
        );
        Ok(())
    }

    /// Stop every loop, the idle behavior, and turn the head off
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!("Shutting down face tracking");

        self.detection.stop();
        self.control.stop();
        if self.idle.is_running() {
            if let Err(e) = self.idle.stop() {
                warn!("Failed to stop idle behavior: {e}");
            }
        }
        if let Err(e) = self.head.turn_off() {
            warn!("Failed to turn the head off: {e}");
        }
        self.shut_down = true;
    }

    fn record_command(&mut self) {
        if self.config.command_history == 0 {
            return;
        }
        if self.command_history.len() >= self.config.command_history {
            self.command_history.pop_front();
        }
        self.command_history.push_back(self.command.y);
    }

    #[must_use]
    pub const fn no_detection_count(&self) -> u32 {
        self.no_detection_count
    }

    /// Times the patience window ran out
    #[must_use]
    pub const fn idle_triggers(&self) -> u64 {
        self.idle_triggers
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle.is_running()
    }

    #[must_use]
    pub const fn command(&self) -> CommandPosition {
        self.command
    }

    #[must_use]
    pub const fn previous_offset(&self) -> CommandPosition {
        self.previous_offset
    }

    /// Pixel position faces are steered to
    #[must_use]
    pub const fn goal(&self) -> Point2D {
        self.goal
    }

    pub fn set_goal(&mut self, goal: Point2D) {
        self.goal = goal;
    }

    #[must_use]
    pub const fn target(&self) -> &TrackedTarget {
        &self.target
    }

    /// Recently issued horizontal commands, oldest first
    #[must_use]
    pub const fn command_history(&self) -> &VecDeque<f64> {
        &self.command_history
    }

    #[must_use]
    pub const fn detection(&self) -> &DetectionLoop {
        &self.detection
    }

    #[must_use]
    pub const fn control(&self) -> &ControlLoop {
        &self.control
    }
}

impl Drop for TrackingOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
