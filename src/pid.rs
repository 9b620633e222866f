//! PD tracking of the face offset into incremental head commands.
//!
//! Each call turns the pixel offset between the face center and the image
//! goal into an increment of the cumulative `(y, z)` look command:
//!
//! ```text
//! error = (input_y, input_x) - goal
//! cmd_z += round(-error_y * Kp_z + (error_y - prev_z) * dt * Kd_z, 3)
//! cmd_y += round(-error_x * Kp_y + (error_x - prev_y) * dt * Kd_y, 3)
//! ```
//!
//! Integral gains are carried in [`PidGains`] but never applied. Rounding each
//! increment to three decimals absorbs sensor noise that would otherwise make
//! the head jitter.

use crate::{
    constants::{COMMAND_DECIMALS, DEFAULT_PID_GAINS},
    geometry::Point2D,
};
use serde::{Deserialize, Serialize};

/// Controller gains for both head axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain, horizontal axis
    pub kp_y: f64,
    /// Proportional gain, vertical axis
    pub kp_z: f64,
    /// Integral gain, horizontal axis (not applied)
    pub ki_y: f64,
    /// Integral gain, vertical axis (not applied)
    pub ki_z: f64,
    /// Derivative gain, horizontal axis
    pub kd_y: f64,
    /// Derivative gain, vertical axis
    pub kd_z: f64,
}

impl PidGains {
    /// Build gains from `[Kp_y, Kp_z, Ki_y, Ki_z, Kd_y, Kd_z]`
    #[must_use]
    pub const fn from_array(gains: [f64; 6]) -> Self {
        Self {
            kp_y: gains[0],
            kp_z: gains[1],
            ki_y: gains[2],
            ki_z: gains[3],
            kd_y: gains[4],
            kd_z: gains[5],
        }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::from_array(DEFAULT_PID_GAINS)
    }
}

/// Cumulative look command (or an offset expressed on the command axes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandPosition {
    /// Horizontal component
    pub y: f64,
    /// Vertical component
    pub z: f64,
}

impl CommandPosition {
    #[must_use]
    pub const fn new(y: f64, z: f64) -> Self {
        Self { y, z }
    }

    #[must_use]
    pub fn to_point(self) -> Point2D {
        Point2D::new(self.y, self.z)
    }

    #[must_use]
    pub fn from_point(point: &Point2D) -> Self {
        Self::new(point.x, point.y)
    }

    /// Both components are finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.y.is_finite() && self.z.is_finite()
    }
}

/// Result of one tracking step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidUpdate {
    /// Updated cumulative command
    pub command: CommandPosition,
    /// Raw offset of this step, to be passed back as the previous offset
    pub offset: CommandPosition,
}

/// Round half to even at `decimals` places
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Stateless PD tracker
#[derive(Debug, Clone, Copy)]
pub struct PidTracker {
    gains: PidGains,
    dt: f64,
}

impl PidTracker {
    /// Create a tracker; `dt` is the interpolation window in seconds
    #[must_use]
    pub const fn new(gains: PidGains, dt: f64) -> Self {
        Self { gains, dt }
    }

    #[must_use]
    pub const fn gains(&self) -> &PidGains {
        &self.gains
    }

    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Compute the next cumulative command.
    ///
    /// `goal` is expressed in `(row, column)` order while `input` is the face
    /// center in `(x, y)` pixel order. Non-finite inputs propagate.
    #[must_use]
    pub fn track(
        &self,
        command: CommandPosition,
        previous_offset: CommandPosition,
        goal: &Point2D,
        input: &Point2D,
    ) -> PidUpdate {
        let error = Point2D::new(input.y, input.x) - goal;
        let (error_y, error_x) = (error[0], error[1]);
        let g = &self.gains;

        let dz = -error_y * g.kp_z + (error_y - previous_offset.z) * self.dt * g.kd_z;
        let dy = -error_x * g.kp_y + (error_x - previous_offset.y) * self.dt * g.kd_y;

        PidUpdate {
            command: CommandPosition::new(
                command.y + round_to(dy, COMMAND_DECIMALS),
                command.z + round_to(dz, COMMAND_DECIMALS),
            ),
            offset: CommandPosition::new(error_x, error_y),
        }
    }
}
