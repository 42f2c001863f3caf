//! Fieldcast Simulator
//!
//! Runs the collection comparison on a mobile network: devices random-walk
//! inside a rectangle, run jittered asynchronous rounds and exchange
//! messages with every device in communication range. Each round estimates
//! the distance from the current source and collects with every collection
//! algorithm, storing the results for comparison.
//!
//! ```no_run
//! use fieldcast_sim::{Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::default())?;
//! sim.run();
//! let snapshot = sim.snapshot();
//! println!("{}", snapshot.total("spc_sum"));
//! # Ok::<(), fieldcast_sim::Error>(())
//! ```

pub mod case_study;
pub mod config;
pub mod error;
pub mod mobility;
pub mod simulation;

pub use case_study::{device_counting, progress_tracking, CaseStudy};
pub use config::SimulationConfig;
pub use error::{Error, Result};
pub use mobility::{RectangleWalk, Walker};
pub use simulation::{DeviceSnapshot, NetworkSnapshot, Simulation};
