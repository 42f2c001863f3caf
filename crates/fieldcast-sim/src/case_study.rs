//! Collection case studies.
//!
//! Two workloads run side by side on every device, each collecting with all
//! the algorithms so their results can be compared against the ideal:
//!
//! - device counting sums `1.0` per device, the ideal being the network size;
//! - progress tracking takes the maximum of a value that shrinks over time.
//!
//! Only the current source stores collected aggregates; every other device
//! stores zero so that summing a tag over the network yields the source's
//! view.

use fieldcast_collection::{
    max_policy, mp_collection, sp_collection, sum_policy, wmp_collection, ListCollection,
};
use fieldcast_distance::generic_distance;
use fieldcast_field::{CallPoint, DeviceId, Node};

use crate::config::SimulationConfig;

/// Storage tags written by the case studies.
pub mod tags {
    /// Distance estimate of the device
    pub const CALC_DISTANCE: &str = "calc_distance";
    /// Whether the device is the current source
    pub const IS_SOURCE: &str = "is_source";

    pub const SPC_SUM: &str = "spc_sum";
    pub const MPC_SUM: &str = "mpc_sum";
    pub const WMPC_SUM: &str = "wmpc_sum";
    pub const LIST_SUM: &str = "list_sum";
    /// Each device contributes one
    pub const IDEAL_SUM: &str = "ideal_sum";

    pub const SPC_MAX: &str = "spc_max";
    pub const MPC_MAX: &str = "mpc_max";
    pub const WMPC_MAX: &str = "wmpc_max";
    /// The device's own progress value
    pub const IDEAL_MAX: &str = "ideal_max";
}

/// Time at which progress values reach their distance component alone.
pub const PROGRESS_HORIZON: f64 = 500.0;

/// The per-round program of the collection comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseStudy {
    /// Distance strategy id
    pub algorithm: i32,
    /// Time at which the source moves from device 0 to device 1
    pub source_switch_time: f64,
    /// Radius of weighted multi-path collection
    pub wmp_radius: f64,
    /// List-arithmetic collection parameters
    pub list: ListCollection,
}

impl CaseStudy {
    /// Build the program a configuration describes.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            source_switch_time: config.source_switch_time,
            wmp_radius: config.wmp_radius,
            list: ListCollection {
                radius: config.collection_radius,
                speed: config.collection_speed,
                epsilon: config.collection_epsilon,
            },
        }
    }

    /// The source device at `time`.
    pub fn source_at(&self, time: f64) -> DeviceId {
        if time < self.source_switch_time {
            DeviceId(0)
        } else {
            DeviceId(1)
        }
    }

    /// One round of the comparison on one device.
    pub fn round(&self, node: &mut Node<'_>) {
        let source_id = self.source_at(node.current_time());
        let is_source = node.uid() == source_id;

        let distance = generic_distance(node, 0, self.algorithm, is_source);
        node.store(tags::CALC_DISTANCE, distance);
        node.store(tags::IS_SOURCE, if is_source { 1.0 } else { 0.0 });

        device_counting(node, 1, is_source, distance, self.wmp_radius, &self.list);
        progress_tracking(node, 2, is_source, source_id, distance, self.wmp_radius);
    }
}

/// Count devices with every collection algorithm.
pub fn device_counting(
    node: &mut Node<'_>,
    call_point: CallPoint,
    is_source: bool,
    distance: f64,
    wmp_radius: f64,
    list: &ListCollection,
) {
    node.scope(call_point, |node| {
        let p = sum_policy();
        let spc = sp_collection(node, 0, distance, 1.0, 0.0, p.combine);
        let mpc = mp_collection(node, 1, distance, 1.0, 0.0, p.combine, p.split);
        let wmpc = wmp_collection(node, 2, distance, wmp_radius, 1.0, p.combine, p.gate);
        let listc = list.collect(node, 3, distance, 1.0, 0.0, p.combine);

        node.store(tags::SPC_SUM, at_source(is_source, spc));
        node.store(tags::MPC_SUM, at_source(is_source, mpc));
        node.store(tags::WMPC_SUM, at_source(is_source, wmpc));
        node.store(tags::LIST_SUM, at_source(is_source, listc));
        node.store(tags::IDEAL_SUM, 1.0);
    })
}

/// Track the largest progress value with the gradient collections.
///
/// A device's value is its distance to the source plus the time left until
/// [`PROGRESS_HORIZON`]; every value is non-negative before the horizon, so
/// `0` is a valid identity for the maximum.
pub fn progress_tracking(
    node: &mut Node<'_>,
    call_point: CallPoint,
    is_source: bool,
    source_id: DeviceId,
    distance: f64,
    wmp_radius: f64,
) {
    node.scope(call_point, |node| {
        let here = node.position();
        let source = node.world().position_of(source_id).unwrap_or(here);
        let value = here.distance(&source) + (PROGRESS_HORIZON - node.current_time());

        let p = max_policy(node.neighbor_count());
        let spc = sp_collection(node, 0, distance, value, 0.0, p.combine);
        let mpc = mp_collection(node, 1, distance, value, 0.0, p.combine, p.split);
        let wmpc = wmp_collection(node, 2, distance, wmp_radius, value, p.combine, p.gate);

        node.store(tags::SPC_MAX, at_source(is_source, spc));
        node.store(tags::MPC_MAX, at_source(is_source, mpc));
        node.store(tags::WMPC_MAX, at_source(is_source, wmpc));
        node.store(tags::IDEAL_MAX, value);
    })
}

fn at_source(is_source: bool, value: f64) -> f64 {
    if is_source {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcast_field::Lockstep;

    fn study() -> CaseStudy {
        CaseStudy {
            algorithm: 0,
            source_switch_time: 1000.0,
            wmp_radius: 100.0,
            list: ListCollection {
                radius: 15.0,
                speed: 0.0,
                epsilon: 0.1,
            },
        }
    }

    #[test]
    fn source_switches_once() {
        let s = study();
        assert_eq!(s.source_at(0.0), DeviceId(0));
        assert_eq!(s.source_at(999.9), DeviceId(0));
        assert_eq!(s.source_at(1000.0), DeviceId(1));
    }

    #[test]
    fn every_algorithm_counts_a_line() {
        let mut net = Lockstep::line(5, 10.0, 15.0);
        let s = study();
        let mut program = |node: &mut Node<'_>| s.round(node);
        net.run(20, &mut program);

        let source = DeviceId(0);
        for tag in [tags::SPC_SUM, tags::MPC_SUM, tags::WMPC_SUM, tags::LIST_SUM] {
            assert_eq!(net.stored(source, tag), Some(5.0), "{tag}");
            assert_eq!(net.stored(DeviceId(3), tag), Some(0.0), "{tag}");
        }
        assert_eq!(net.stored(DeviceId(4), tags::CALC_DISTANCE), Some(40.0));
        assert_eq!(net.stored(DeviceId(2), tags::IDEAL_SUM), Some(1.0));
    }

    #[test]
    fn default_list_parameters_count_a_line() {
        let config = SimulationConfig {
            source_switch_time: 1000.0,
            ..Default::default()
        };
        let s = CaseStudy::from_config(&config);
        assert!(s.list.speed > 0.0);

        let mut net = Lockstep::line(5, 10.0, 15.0);
        let mut program = |node: &mut Node<'_>| s.round(node);
        net.run(30, &mut program);

        assert_eq!(net.stored(DeviceId(0), tags::LIST_SUM), Some(5.0));
        assert_eq!(net.stored(DeviceId(0), tags::SPC_SUM), Some(5.0));
    }

    #[test]
    fn progress_reaches_the_farthest_device() {
        let mut net = Lockstep::line(4, 10.0, 15.0);
        let s = study();
        let mut program = |node: &mut Node<'_>| s.round(node);
        net.run(12, &mut program);

        // Last round ran at time 11; device 3 is 30 away from the source
        assert_eq!(net.stored(DeviceId(3), tags::IDEAL_MAX), Some(30.0 + 489.0));
        // Its value needs three hops, so the source sees the one from time 8
        assert_eq!(net.stored(DeviceId(0), tags::SPC_MAX), Some(30.0 + 492.0));
        assert_eq!(net.stored(DeviceId(0), tags::MPC_MAX), Some(30.0 + 492.0));
    }
}
