//! Constants used throughout the application

/// Side length of the square image fed to the face detector
pub const DETECTOR_INPUT_SIZE: u32 = 320;

/// Minimum detector confidence for a face to become a candidate
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;

/// A candidate this many times larger than the tracked face overrides continuity
pub const DEFAULT_CONTINUITY_AREA_RATIO: f64 = 2.5;

/// Detection loop period in milliseconds
pub const DEFAULT_DETECTION_PERIOD_MS: u64 = 10;

/// Control loop period in milliseconds
pub const DEFAULT_CONTROL_PERIOD_MS: u64 = 10;

/// Interpolation window (origin to target) in milliseconds
pub const DEFAULT_INTERPOLATION_WINDOW_MS: u64 = 20;

/// Number of target update timestamps kept by the controller
pub const DEFAULT_UPDATE_HISTORY: usize = 10;

/// Standard deviations added to the mean update interval when adapting the window
pub const DEFAULT_OVERLAP_FACTOR: f64 = 5.0;

/// Default PID gains: Kp_y, Kp_z, Ki_y, Ki_z, Kd_y, Kd_z
pub const DEFAULT_PID_GAINS: [f64; 6] = [0.0004, 0.0001, 0.0, 0.0, 0.017, 0.002];

/// Decimal places kept on every command increment
pub const COMMAND_DECIMALS: i32 = 3;

/// Orchestrator decision period in milliseconds
pub const DEFAULT_DECISION_PERIOD_MS: u64 = 20;

/// Pause after a tracking update in milliseconds
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 10;

/// Pause when switching to idle behavior in milliseconds
pub const DEFAULT_IDLE_PAUSE_MS: u64 = 200;

/// Face area (px²) considered close enough to engage: a 20×20 face
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 20.0 * 20.0;

/// Consecutive empty decision ticks tolerated before idling
pub const DEFAULT_PATIENCE: u32 = 40;

/// Number of issued commands kept by the orchestrator
pub const DEFAULT_COMMAND_HISTORY: usize = 50;

/// Fixed depth of the look-at point in meters
pub const LOOK_AT_DEPTH: f64 = 0.5;

/// Duration of the startup look-at in seconds
pub const DEFAULT_STARTUP_LOOK_AT_SECS: f64 = 1.5;
