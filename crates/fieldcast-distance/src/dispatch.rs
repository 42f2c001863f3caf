//! Strategy selection by numeric id.

use fieldcast_field::{CallPoint, Node};
use tracing::warn;

use crate::{abf_distance, bis_distance, flex_distance};

/// Information period assumed by the bounded-information-speed strategy.
pub const BIS_PERIOD: f64 = 1.0;
/// Information speed assumed by the bounded-information-speed strategy.
pub const BIS_SPEED: f64 = 50.0;

/// Tolerated slope deviation of the flexible gradient.
pub const FLEX_EPSILON: f64 = 0.2;
/// Communication radius assumed by the flexible gradient.
pub const FLEX_RADIUS: f64 = 100.0;
/// Shortest link the flexible gradient measures, as a fraction of the radius.
pub const FLEX_DISTORTION: f64 = 0.1;
/// Rounds between unconditional flexible gradient resets.
pub const FLEX_FREQUENCY: u32 = 10;

/// The distance strategies selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceAlgorithm {
    /// Adaptive Bellman-Ford.
    Abf,
    /// Bounded information speed.
    Bis,
    /// Flexible gradient.
    Flex,
}

impl DistanceAlgorithm {
    /// Every strategy, in id order.
    pub const ALL: [DistanceAlgorithm; 3] = [Self::Abf, Self::Bis, Self::Flex];

    /// Strategy for a numeric id, if it names one.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Abf),
            1 => Some(Self::Bis),
            2 => Some(Self::Flex),
            _ => None,
        }
    }

    /// Numeric id of the strategy.
    pub fn id(self) -> i32 {
        match self {
            Self::Abf => 0,
            Self::Bis => 1,
            Self::Flex => 2,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Abf => "abf",
            Self::Bis => "bis",
            Self::Flex => "flex",
        }
    }

    /// Run the strategy with its fixed parameters at call point `call_point`.
    pub fn estimate(self, node: &mut Node<'_>, call_point: CallPoint, source: bool) -> f64 {
        match self {
            Self::Abf => abf_distance(node, call_point, source),
            Self::Bis => bis_distance(node, call_point, source, BIS_PERIOD, BIS_SPEED),
            Self::Flex => flex_distance(
                node,
                call_point,
                source,
                FLEX_EPSILON,
                FLEX_RADIUS,
                FLEX_DISTORTION,
                FLEX_FREQUENCY,
            ),
        }
    }
}

/// Distance from the nearest source using the strategy numbered `algorithm`.
///
/// Each strategy runs in its own branch scope, so switching strategy never
/// mixes their persistent state. An unknown id yields `0.0` on every device,
/// which makes every device look like a source; callers should validate ids
/// up front.
pub fn generic_distance(
    node: &mut Node<'_>,
    call_point: CallPoint,
    algorithm: i32,
    source: bool,
) -> f64 {
    node.scope(call_point, |node| match DistanceAlgorithm::from_id(algorithm) {
        Some(strategy) => {
            let branch = strategy.id() as CallPoint;
            strategy.estimate(node, branch, source)
        }
        None => {
            warn!(algorithm, device = %node.uid(), "unknown distance algorithm");
            0.0
        }
    })
}
