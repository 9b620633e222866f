//! Configuration management for the face tracking application

use crate::{
    constants::{
        DEFAULT_COMMAND_HISTORY, DEFAULT_CONTINUITY_AREA_RATIO, DEFAULT_CONTROL_PERIOD_MS, DEFAULT_DECISION_PERIOD_MS,
        DEFAULT_DETECTION_PERIOD_MS, DEFAULT_IDLE_PAUSE_MS, DEFAULT_INTERPOLATION_WINDOW_MS, DEFAULT_OVERLAP_FACTOR,
        DEFAULT_PATIENCE, DEFAULT_PROXIMITY_THRESHOLD, DEFAULT_SCORE_THRESHOLD, DEFAULT_SETTLE_DELAY_MS,
        DEFAULT_STARTUP_LOOK_AT_SECS, DEFAULT_UPDATE_HISTORY, DETECTOR_INPUT_SIZE, LOOK_AT_DEPTH,
    },
    pid::PidGains,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PD gains
    pub pid: PidGains,

    /// Control loop configuration
    pub controller: ControllerConfig,

    /// Detection loop configuration
    pub detection: DetectionConfig,

    /// Supervisor configuration
    pub orchestrator: OrchestratorConfig,
}

/// Control loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Servo tick period in milliseconds
    pub period_ms: u64,

    /// Time to travel from origin to target in milliseconds
    pub interpolation_window_ms: u64,

    /// Blend toward the new target (1.0 jumps straight to it)
    pub alpha: f64,

    /// Number of target update timestamps kept
    pub history_capacity: usize,

    /// Deviation multiplier for the adaptive window estimate
    pub overlap_factor: f64,

    /// Re-estimate the interpolation window from update intervals
    pub adaptive_window: bool,
}

/// Detection loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Detection tick period in milliseconds
    pub period_ms: u64,

    /// Minimum detector confidence (0.0-1.0)
    pub score_threshold: f32,

    /// Side of the square detector input in pixels
    pub input_size: u32,

    /// Area ratio above which the largest face overrides continuity
    pub continuity_area_ratio: f64,
}

/// Tracking supervisor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Decision loop period in milliseconds
    pub decision_period_ms: u64,

    /// Pause after a tracking update in milliseconds
    pub settle_delay_ms: u64,

    /// Pause when falling back to idle in milliseconds
    pub idle_pause_ms: u64,

    /// Face area (px²) above which tracking is (re)engaged
    pub proximity_threshold: f64,

    /// Empty decision ticks tolerated before idling
    pub patience: u32,

    /// Number of issued commands kept
    pub command_history: usize,

    /// Depth of the look-at point in meters
    pub look_at_depth: f64,

    /// Duration of the startup look-at in seconds
    pub startup_look_at_secs: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_CONTROL_PERIOD_MS,
            interpolation_window_ms: DEFAULT_INTERPOLATION_WINDOW_MS,
            alpha: 1.0,
            history_capacity: DEFAULT_UPDATE_HISTORY,
            overlap_factor: DEFAULT_OVERLAP_FACTOR,
            adaptive_window: false,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_DETECTION_PERIOD_MS,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            input_size: DETECTOR_INPUT_SIZE,
            continuity_area_ratio: DEFAULT_CONTINUITY_AREA_RATIO,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            decision_period_ms: DEFAULT_DECISION_PERIOD_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            idle_pause_ms: DEFAULT_IDLE_PAUSE_MS,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            patience: DEFAULT_PATIENCE,
            command_history: DEFAULT_COMMAND_HISTORY,
            look_at_depth: LOOK_AT_DEPTH,
            startup_look_at_secs: DEFAULT_STARTUP_LOOK_AT_SECS,
        }
    }
}

impl ControllerConfig {
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    #[must_use]
    pub const fn interpolation_window(&self) -> Duration {
        Duration::from_millis(self.interpolation_window_ms)
    }
}

impl DetectionConfig {
    #[must_use]
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Pixel position of the image center, the point faces are steered to
    #[must_use]
    pub fn image_center(&self) -> f64 {
        f64::from(self.input_size) / 2.0
    }
}

impl OrchestratorConfig {
    #[must_use]
    pub const fn decision_period(&self) -> Duration {
        Duration::from_millis(self.decision_period_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn idle_pause(&self) -> Duration {
        Duration::from_millis(self.idle_pause_ms)
    }

    /// Duration of the startup look-at; zero when the setting is unusable
    #[must_use]
    pub fn startup_look_at(&self) -> Duration {
        Duration::try_from_secs_f64(self.startup_look_at_secs).unwrap_or_default()
    }
}

/// Convert a number of seconds into a [`Duration`].
///
/// # Errors
///
/// Returns [`Error::ConfigError`] for negative, NaN, infinite or
/// unrepresentably large values.
pub fn duration_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::ConfigError(format!("Invalid duration {secs} s: {e}")))
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let gains = [
            self.pid.kp_y,
            self.pid.kp_z,
            self.pid.ki_y,
            self.pid.ki_z,
            self.pid.kd_y,
            self.pid.kd_z,
        ];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(Error::ConfigError("PID gains must be finite".to_string()));
        }

        // Controller
        if self.controller.period_ms == 0 {
            return Err(Error::ConfigError("Control period must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.controller.alpha) {
            return Err(Error::ConfigError("Alpha must be between 0.0 and 1.0".to_string()));
        }
        if !self.controller.overlap_factor.is_finite() || self.controller.overlap_factor < 0.0 {
            return Err(Error::ConfigError("Overlap factor must be non-negative".to_string()));
        }

        // Detection
        if self.detection.period_ms == 0 {
            return Err(Error::ConfigError("Detection period must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.detection.score_threshold) {
            return Err(Error::ConfigError(
                "Score threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.detection.input_size == 0 {
            return Err(Error::ConfigError("Detector input size must be greater than 0".to_string()));
        }
        if !(self.detection.continuity_area_ratio > 0.0) {
            return Err(Error::ConfigError("Continuity area ratio must be positive".to_string()));
        }

        // Orchestrator
        if self.orchestrator.decision_period_ms == 0 {
            return Err(Error::ConfigError("Decision period must be greater than 0".to_string()));
        }
        if !(self.orchestrator.proximity_threshold >= 0.0) {
            return Err(Error::ConfigError("Proximity threshold must be non-negative".to_string()));
        }
        if !(self.orchestrator.look_at_depth > 0.0) {
            return Err(Error::ConfigError("Look-at depth must be positive".to_string()));
        }
        duration_from_secs(self.orchestrator.startup_look_at_secs)?;

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Tracking Configuration

# PD gains (integral gains are accepted but not applied)
pid:
  kp_y: 0.0004
  kp_z: 0.0001
  ki_y: 0.0
  ki_z: 0.0
  kd_y: 0.017
  kd_z: 0.002

# Head control loop
controller:
  period_ms: 10
  interpolation_window_ms: 20
  alpha: 1.0
  history_capacity: 10
  overlap_factor: 5.0
  adaptive_window: false

# Face detection loop
detection:
  period_ms: 10
  score_threshold: 0.5
  input_size: 320
  continuity_area_ratio: 2.5

# Tracking supervisor
orchestrator:
  decision_period_ms: 20
  settle_delay_ms: 10
  idle_pause_ms: 200
  proximity_threshold: 400.0
  patience: 40
  command_history: 50
  look_at_depth: 0.5
  startup_look_at_secs: 1.5
"#;
