//! Error types for the face tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The requested look direction has no kinematic solution
    #[error("Unreachable pose: y={y:.3}, z={z:.3}")]
    UnreachablePose {
        /// Horizontal component of the requested look direction
        y: f64,
        /// Vertical component of the requested look direction
        z: f64,
    },

    /// Joint actuation failed
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Frame acquisition failed
    #[error("Camera error: {0}")]
    Camera(String),

    /// Face detector inference failed
    #[error("Detector error: {0}")]
    Detector(String),

    /// Idle behavior could not be started or stopped
    #[error("Idle behavior error: {0}")]
    IdleBehavior(String),

    /// A periodic loop thread could not be launched
    #[error("Thread error: {0}")]
    Thread(String),
}

impl Error {
    /// Whether this error only means the commanded pose was out of reach
    #[must_use]
    pub const fn is_unreachable_pose(&self) -> bool {
        matches!(self, Self::UnreachablePose { .. })
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
