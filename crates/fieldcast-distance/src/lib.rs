//! Fieldcast Distance Estimation
//!
//! Self-stabilizing estimates of the distance from each device to the
//! nearest source, computed purely from neighbor exchanges.
//!
//! | Strategy | Behavior |
//! |---|---|
//! | [`abf_distance`] | exact relaxation; rises slowly when sources vanish |
//! | [`bis_distance`] | charges stale information by its age |
//! | [`flex_distance`] | tolerates bounded slope error to avoid churn |
//!
//! [`generic_distance`] selects one of them by numeric id.

mod abf;
mod bis;
mod dispatch;
mod flex;

pub use abf::abf_distance;
pub use bis::bis_distance;
pub use dispatch::{
    generic_distance, DistanceAlgorithm, BIS_PERIOD, BIS_SPEED, FLEX_DISTORTION, FLEX_EPSILON,
    FLEX_FREQUENCY, FLEX_RADIUS,
};
pub use flex::flex_distance;
