//! Head control loop: interpolated servoing toward the latest PD command.
//!
//! The [`ControlLoop`] owns a [`ControllerState`] describing the segment the
//! head is currently travelling along. A periodic thread samples the segment
//! every tick and hands the position to the servo callback. New targets may be
//! set from any thread at any time; the segment restarts from the position the
//! head had reached, so target changes never cause a jump.

use crate::{
    config::ControllerConfig,
    geometry::Point2D,
    interpolation::Trajectory,
    pid::{CommandPosition, PidGains, PidTracker, PidUpdate},
    scheduler::{LoopState, PeriodicTask},
    Result,
};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Callback receiving the interpolated `(y, z)` position every tick
pub type ServoCallback = Box<dyn FnMut(Point2D) -> Result<()> + Send>;

/// Interpolation state shared between the control thread and its callers
#[derive(Debug, Clone)]
pub struct ControllerState {
    trajectory: Trajectory,
    window: Duration,
    alpha: f64,
    update_history: VecDeque<Instant>,
    history_capacity: usize,
    overlap_factor: f64,
    adaptive_window: bool,
}

impl ControllerState {
    /// Create a state resting at `initial`
    #[must_use]
    pub fn new(initial: Point2D, config: &ControllerConfig, now: Instant) -> Self {
        Self {
            trajectory: Trajectory::at_rest(initial, now),
            window: config.interpolation_window(),
            alpha: config.alpha.clamp(0.0, 1.0),
            update_history: VecDeque::with_capacity(config.history_capacity),
            history_capacity: config.history_capacity,
            overlap_factor: config.overlap_factor,
            adaptive_window: config.adaptive_window,
        }
    }

    #[must_use]
    pub fn position_at(&self, now: Instant) -> Point2D {
        self.trajectory.position_at(self.window, now)
    }

    #[must_use]
    pub const fn origin(&self) -> Point2D {
        self.trajectory.origin
    }

    #[must_use]
    pub const fn target(&self) -> Point2D {
        self.trajectory.target
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn update_history(&self) -> &VecDeque<Instant> {
        &self.update_history
    }

    /// Restart the segment from the current position toward `new_target`,
    /// blended with the previous target by `alpha`.
    pub fn set_new_target(&mut self, new_target: Point2D, now: Instant) {
        let blended = new_target * self.alpha + self.trajectory.target * (1.0 - self.alpha);
        self.trajectory.retarget(blended, self.window, now);

        if self.history_capacity > 0 {
            if self.update_history.len() >= self.history_capacity {
                self.update_history.pop_front();
            }
            self.update_history.push_back(now);
        }

        if self.adaptive_window {
            if let Some(window) = self.estimate_window() {
                self.window = window;
            }
        }
    }

    /// Put the head at rest on `position` and forget past updates
    pub fn reset(&mut self, position: Point2D, now: Instant) {
        self.trajectory = Trajectory::at_rest(position, now);
        self.update_history.clear();
    }

    pub fn clear_history(&mut self) {
        self.update_history.clear();
    }

    /// `mean + overlap_factor * std` of the intervals between recent updates.
    ///
    /// Needs at least two recorded updates and a representable result.
    #[must_use]
    pub fn estimate_window(&self) -> Option<Duration> {
        if self.update_history.len() < 2 {
            return None;
        }

        let intervals: Vec<f64> = self
            .update_history
            .iter()
            .zip(self.update_history.iter().skip(1))
            .map(|(earlier, later)| later.saturating_duration_since(*earlier).as_secs_f64())
            .collect();

        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<f64>() / n;
        let variance = intervals.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let estimate = self.overlap_factor.mul_add(variance.sqrt(), mean);
        if !estimate.is_finite() {
            return None;
        }
        Duration::try_from_secs_f64(estimate.max(0.0)).ok()
    }
}

/// Periodic actuation thread driven by interpolated targets
pub struct ControlLoop {
    state: Arc<Mutex<ControllerState>>,
    callback: Arc<Mutex<ServoCallback>>,
    tracker: PidTracker,
    task: PeriodicTask,
    skipped_ticks: Arc<AtomicU64>,
}

impl ControlLoop {
    /// Create a stopped control loop resting at `initial`
    pub fn new<F>(initial: Point2D, config: &ControllerConfig, gains: PidGains, callback: F) -> Self
    where
        F: FnMut(Point2D) -> Result<()> + Send + 'static,
    {
        let state = ControllerState::new(initial, config, Instant::now());
        let tracker = PidTracker::new(gains, state.window().as_secs_f64());
        let callback: ServoCallback = Box::new(callback);

        Self {
            state: Arc::new(Mutex::new(state)),
            callback: Arc::new(Mutex::new(callback)),
            tracker,
            task: PeriodicTask::new("head-control", config.period()),
            skipped_ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start servoing; returns once the control thread is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the control thread cannot be launched.
    pub fn start(&mut self) -> Result<()> {
        let state = Arc::clone(&self.state);
        let callback = Arc::clone(&self.callback);
        let skipped = Arc::clone(&self.skipped_ticks);

        self.task.start(move || {
            let position = state.lock().position_at(Instant::now());
            let mut servo = callback.lock();
            if let Err(e) = (&mut *servo)(position) {
                skipped.fetch_add(1, Ordering::Relaxed);
                if e.is_unreachable_pose() {
                    debug!("Skipping control tick: {e}");
                } else {
                    warn!("Skipping control tick: {e}");
                }
            }
        })
    }

    /// Stop servoing; returns once the control thread has exited
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

    /// Completed control ticks
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.task.ticks()
    }

    /// Ticks whose command was not applied
    #[must_use]
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn tracker(&self) -> &PidTracker {
        &self.tracker
    }

    /// Snapshot of the interpolation state
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state.lock().clone()
    }

    /// Current interpolated position
    #[must_use]
    pub fn position(&self) -> Point2D {
        self.position_at(Instant::now())
    }

    #[must_use]
    pub fn position_at(&self, now: Instant) -> Point2D {
        self.state.lock().position_at(now)
    }

    /// Move toward `new_target` starting from the current position
    pub fn set_new_target(&self, new_target: Point2D) {
        self.set_new_target_at(new_target, Instant::now());
    }

    pub fn set_new_target_at(&self, new_target: Point2D, now: Instant) {
        self.state.lock().set_new_target(new_target, now);
    }

    /// Run one PD step and make the resulting command the new target
    pub fn track(
        &self,
        command: CommandPosition,
        previous_offset: CommandPosition,
        goal: &Point2D,
        input: &Point2D,
    ) -> PidUpdate {
        let update = self.tracker.track(command, previous_offset, goal, input);
        self.set_new_target(update.command.to_point());
        update
    }

    /// Rest at `position` and clear the update history
    pub fn reset(&self, position: Point2D) {
        self.state.lock().reset(position, Instant::now());
    }

    pub fn clear_history(&self) {
        self.state.lock().clear_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ControllerConfig {
        ControllerConfig::default()
    }

    #[test]
    fn test_alpha_blends_targets() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(
            Point2D::zeros(),
            &ControllerConfig {
                alpha: 0.5,
                ..config()
            },
            t0,
        );

        state.set_new_target(Point2D::new(2.0, 4.0), t0);
        assert_eq!(state.target(), Point2D::new(1.0, 2.0));
    }

    #[test]
    fn test_alpha_is_clamped() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(
            Point2D::zeros(),
            &ControllerConfig {
                alpha: 3.0,
                ..config()
            },
            t0,
        );

        state.set_new_target(Point2D::new(2.0, 4.0), t0);
        assert_eq!(state.target(), Point2D::new(2.0, 4.0));
    }

    #[test]
    fn test_update_history_is_bounded() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(
            Point2D::zeros(),
            &ControllerConfig {
                history_capacity: 3,
                ..config()
            },
            t0,
        );

        for i in 0..5u64 {
            state.set_new_target(Point2D::new(i as f64, 0.0), t0 + Duration::from_millis(i * 10));
        }
        assert_eq!(state.update_history().len(), 3);
        assert_eq!(state.update_history()[0], t0 + Duration::from_millis(20));
    }

    #[test]
    fn test_estimate_window_from_regular_updates() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(Point2D::zeros(), &config(), t0);
        assert!(state.estimate_window().is_none());

        for i in 0..4u64 {
            state.set_new_target(Point2D::zeros(), t0 + Duration::from_millis(i * 30));
        }
        // Constant intervals: zero deviation, window equals the interval
        let window = state.estimate_window().unwrap();
        assert!((window.as_secs_f64() - 0.030).abs() < 1e-6);
        // Adaptation is off by default
        assert_eq!(state.window(), config().interpolation_window());
    }

    #[test]
    fn test_adaptive_window_applies_estimate() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(
            Point2D::zeros(),
            &ControllerConfig {
                adaptive_window: true,
                ..config()
            },
            t0,
        );

        for i in 0..3u64 {
            state.set_new_target(Point2D::zeros(), t0 + Duration::from_millis(i * 50));
        }
        assert!((state.window().as_secs_f64() - 0.050).abs() < 1e-6);
    }

    #[test]
    fn test_unbounded_estimate_keeps_current_window() {
        let t0 = Instant::now();
        let config = ControllerConfig {
            adaptive_window: true,
            overlap_factor: f64::INFINITY,
            ..config()
        };
        let mut state = ControllerState::new(Point2D::zeros(), &config, t0);

        for ms in [0u64, 10, 50] {
            state.set_new_target(Point2D::zeros(), t0 + Duration::from_millis(ms));
        }
        assert!(state.estimate_window().is_none());
        assert_eq!(state.window(), config.interpolation_window());
    }

    #[test]
    fn test_reset_rests_and_clears_history() {
        let t0 = Instant::now();
        let mut state = ControllerState::new(Point2D::zeros(), &config(), t0);
        state.set_new_target(Point2D::new(1.0, 1.0), t0);

        state.reset(Point2D::new(0.3, -0.1), t0);
        assert!(state.update_history().is_empty());
        assert_eq!(state.position_at(t0 + Duration::from_secs(1)), Point2D::new(0.3, -0.1));
    }

    #[test]
    fn test_track_sets_command_as_target() {
        let control = ControlLoop::new(Point2D::zeros(), &config(), PidGains::default(), |_| Ok(()));
        let update = control.track(
            CommandPosition::default(),
            CommandPosition::default(),
            &Point2D::new(160.0, 160.0),
            &Point2D::new(200.0, 100.0),
        );

        assert_eq!(control.state().target(), update.command.to_point());
        assert_eq!(control.state().update_history().len(), 1);
    }
}
