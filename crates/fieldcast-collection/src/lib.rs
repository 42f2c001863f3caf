//! Fieldcast Collection
//!
//! Convergecast along distance gradients: every device contributes a value
//! and the devices at distance zero end up holding the aggregate.
//!
//! Aggregation behavior is supplied as a [`Policy`]; [`sum_policy`] counts,
//! [`max_policy`] tracks the largest value. The collection algorithms are:
//!
//! - [`sp_collection`]: one parent per device
//! - [`mp_collection`]: even split among closer neighbors
//! - [`wmp_collection`]: weighted split among closer neighbors
//! - [`ListCollection`]: one parent chosen by projected approach rate
//!
//! All of them stabilize when `combine` is associative and commutative and
//! `null` is its identity.

mod collection;
mod list;
pub mod policy;

pub use collection::{mp_collection, sp_collection, wmp_collection};
pub use list::{ListCollection, ListRound};
pub use policy::{max_policy, sum_policy, Policy};
