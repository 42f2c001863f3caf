//! Simulation configuration.
//!
//! Values come from defaults, a JSON file (missing keys keep their
//! defaults) or `FIELDCAST_*` environment variables.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything a simulation run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for deterministic runs
    pub seed: u64,
    /// Number of devices, with ids `0..devices`
    pub devices: u64,
    /// No round is scheduled after this time
    pub end_time: f64,
    /// Mean time between rounds of a device
    pub period: f64,
    /// Relative round jitter, in `[0, 1)`
    pub jitter: f64,
    /// Neighbor messages older than this are discarded
    pub retain: f64,
    /// Devices closer than this exchange messages
    pub comm_range: f64,
    /// Width of the deployment rectangle
    pub width: f64,
    /// Height of the deployment rectangle
    pub height: f64,
    /// Random walk speed
    pub device_speed: f64,
    /// Distance strategy id
    pub algorithm: i32,
    /// Time at which the source moves from device 0 to device 1
    pub source_switch_time: f64,
    /// Radius of weighted multi-path collection
    pub wmp_radius: f64,
    /// Eligibility radius of list-arithmetic collection
    pub collection_radius: f64,
    /// Speed bound of list-arithmetic collection
    pub collection_speed: f64,
    /// Round slack of list-arithmetic collection
    pub collection_epsilon: f64,
    /// Simulated time between progress log lines
    pub log_period: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            devices: 100,
            end_time: 500.0,
            period: 1.0,
            jitter: 0.1,
            retain: 2.0,
            comm_range: 100.0,
            width: 2000.0,
            height: 200.0,
            device_speed: 30.5,
            algorithm: 0,
            source_switch_time: 250.0,
            wmp_radius: 100.0,
            collection_radius: 100.0,
            collection_speed: 30.5,
            collection_epsilon: 0.1,
            log_period: 50.0,
        }
    }
}

impl SimulationConfig {
    /// Create config from environment variables, keeping defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let env = Env { lookup };
        Ok(Self {
            seed: env.get("FIELDCAST_SEED", d.seed)?,
            devices: env.get("FIELDCAST_DEVICES", d.devices)?,
            end_time: env.get("FIELDCAST_END_TIME", d.end_time)?,
            period: env.get("FIELDCAST_PERIOD", d.period)?,
            jitter: env.get("FIELDCAST_JITTER", d.jitter)?,
            retain: env.get("FIELDCAST_RETAIN", d.retain)?,
            comm_range: env.get("FIELDCAST_COMM_RANGE", d.comm_range)?,
            width: env.get("FIELDCAST_WIDTH", d.width)?,
            height: env.get("FIELDCAST_HEIGHT", d.height)?,
            device_speed: env.get("FIELDCAST_DEVICE_SPEED", d.device_speed)?,
            algorithm: env.get("FIELDCAST_ALGORITHM", d.algorithm)?,
            source_switch_time: env.get("FIELDCAST_SOURCE_SWITCH_TIME", d.source_switch_time)?,
            wmp_radius: env.get("FIELDCAST_WMP_RADIUS", d.wmp_radius)?,
            collection_radius: env.get("FIELDCAST_COLLECTION_RADIUS", d.collection_radius)?,
            collection_speed: env.get("FIELDCAST_COLLECTION_SPEED", d.collection_speed)?,
            collection_epsilon: env.get("FIELDCAST_COLLECTION_EPSILON", d.collection_epsilon)?,
            log_period: env.get("FIELDCAST_LOG_PERIOD", d.log_period)?,
        })
    }

    /// Load config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.devices == 0 {
            return Err(invalid("devices must be at least 1"));
        }
        if !(self.period > 0.0) {
            return Err(invalid(format!("period must be positive, got {}", self.period)));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(invalid(format!("jitter must be in [0, 1), got {}", self.jitter)));
        }
        if !(self.retain > 0.0) {
            return Err(invalid(format!("retain must be positive, got {}", self.retain)));
        }
        if !(self.comm_range > 0.0) {
            return Err(invalid(format!("comm_range must be positive, got {}", self.comm_range)));
        }
        if !(self.width >= 0.0 && self.height >= 0.0) {
            return Err(invalid("deployment area must not be negative"));
        }
        if !(self.device_speed >= 0.0) {
            return Err(invalid(format!("device_speed must not be negative, got {}", self.device_speed)));
        }
        if !self.end_time.is_finite() {
            return Err(invalid("end_time must be finite"));
        }
        if !(self.log_period > 0.0) {
            return Err(invalid(format!("log_period must be positive, got {}", self.log_period)));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Parse a variable, falling back to `default` when unset or blank.
    fn get<T: FromStr>(&self, name: &'static str, default: T) -> Result<T> {
        match (self.lookup)(name) {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidEnv { name, value }),
            _ => Ok(default),
        }
    }
}
