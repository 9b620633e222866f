//! Head actuation trait and the servo callback.
//!
//! The tracking core never talks to motors directly. It drives a
//! [`HeadActuator`], which solves the look-at kinematics and applies neck joint
//! goal positions. [`servo`] is the control loop callback: it lifts the 2-D
//! `(y, z)` command into a 3-D look-at point at a fixed depth.

use crate::{geometry::Point2D, Result};
use log::debug;
use std::time::Duration;

/// Neck joint goal positions in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointTargets {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl JointTargets {
    #[must_use]
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Robot head driven by the tracking loops.
///
/// Shared between the control thread and the orchestrator, so every method
/// takes `&self`.
pub trait HeadActuator: Send + Sync {
    /// Enable the neck motors
    fn turn_on(&self) -> Result<()>;

    /// Disable the neck motors
    fn turn_off(&self) -> Result<()>;

    /// Move to look at `(x, y, z)` over `duration`, blocking until done
    fn look_at(&self, x: f64, y: f64, z: f64, duration: Duration) -> Result<()>;

    /// Joint angles that make the head look at `(x, y, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnreachablePose`] when the point has no solution.
    fn inverse_kinematics(&self, x: f64, y: f64, z: f64) -> Result<JointTargets>;

    /// Apply neck goal positions without waiting for them to be reached
    fn set_goal_positions(&self, joints: &JointTargets) -> Result<()>;

    /// Last `(x, y, z)` point the head was asked to look at
    fn previous_look_at(&self) -> [f64; 3];
}

/// Send the interpolated `(y, z)` command to the head at `depth`.
///
/// # Errors
///
/// Propagates the actuator error; an unreachable pose leaves the joints untouched.
pub fn servo<H>(head: &H, position: &Point2D, depth: f64) -> Result<()>
where
    H: HeadActuator + ?Sized,
{
    let joints = head.inverse_kinematics(depth, position.x, position.y)?;
    debug!(
        "Servo to y={:.3}, z={:.3}: roll={:.3} pitch={:.3} yaw={:.3}",
        position.x, position.y, joints.roll, joints.pitch, joints.yaw
    );
    head.set_goal_positions(&joints)
}
