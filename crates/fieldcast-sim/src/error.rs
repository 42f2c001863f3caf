//! Error types for the simulator.

use fieldcast_field::DeviceId;
use thiserror::Error;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or driving a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An environment variable that does not parse
    #[error("Invalid environment variable {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// Operation on a device the simulation does not contain
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),
}
