//! Fieldcast Neighbor-Field Substrate
//!
//! Per-round value exchange between topologically adjacent devices, the
//! primitive every gradient and collection algorithm in Fieldcast builds on.
//!
//! # Model
//!
//! Devices run rounds independently. In a round a device:
//! 1. reads the latest export of each neighbor (and its own previous one),
//! 2. computes new values at named call sites,
//! 3. publishes them as a single frozen export.
//!
//! A neighbor only ever sees a completed export. Persistent state is the
//! device's own previous export, keyed by call-site channel, so no state is
//! shared between devices except through messages.
//!
//! # Fields
//!
//! [`Field`] is an explicit map from device id to value. There is no
//! operator overloading: element-wise arithmetic goes through
//! [`Field::map`] and [`Field::zip_with`], reductions through
//! [`Node::fold_hood`].

mod id;
mod field;
mod trace;
mod export;
mod node;
mod device;
mod lockstep;

pub use id::{DeviceId, Point};
pub use field::Field;
pub use trace::{CallPoint, ChannelKey, Trace};
pub use export::{Export, Exportable, Message};
pub use node::{NetworkView, Node, PositionTable, RoundClock, Storage};
pub use device::DeviceState;
pub use lockstep::Lockstep;
