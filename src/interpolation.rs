//! Linear interpolation between successive head targets.

use crate::geometry::Point2D;
use std::time::{Duration, Instant};

/// Position on the segment `origin → target` at time `now`.
///
/// The ratio `(now - t0) / window` is clamped to `[0, 1]`, so the result is
/// `origin` at or before `t0` and `target` once the window has elapsed. A zero
/// window jumps straight to `target`.
#[must_use]
pub fn interpolate(origin: &Point2D, target: &Point2D, t0: Instant, window: Duration, now: Instant) -> Point2D {
    let ratio = if window.is_zero() {
        1.0
    } else {
        now.saturating_duration_since(t0).as_secs_f64() / window.as_secs_f64()
    };

    origin + (target - origin) * ratio.clamp(0.0, 1.0)
}

/// A timed segment from `origin` to `target` started at `t0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub origin: Point2D,
    pub target: Point2D,
    pub t0: Instant,
}

impl Trajectory {
    /// A trajectory resting at `position`
    #[must_use]
    pub fn at_rest(position: Point2D, now: Instant) -> Self {
        Self {
            origin: position,
            target: position,
            t0: now,
        }
    }

    /// Current position along the trajectory
    #[must_use]
    pub fn position_at(&self, window: Duration, now: Instant) -> Point2D {
        interpolate(&self.origin, &self.target, self.t0, window, now)
    }

    /// Start a new segment toward `target` from wherever the trajectory is at `now`
    pub fn retarget(&mut self, target: Point2D, window: Duration, now: Instant) {
        self.origin = self.position_at(window, now);
        self.t0 = now;
        self.target = target;
    }
}
