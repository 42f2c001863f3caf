//! Adaptive Bellman-Ford distance.

use fieldcast_field::{CallPoint, Node};

/// Distance from the nearest source by repeated relaxation over neighbors.
///
/// Each round a device takes the smallest neighbor estimate plus the
/// physical distance to that neighbor. Sources report zero; a device with
/// no finite neighbor estimate reports `+inf`. Estimates fall quickly but
/// rise only as fast as the smallest link length per round when a source
/// moves away.
pub fn abf_distance(node: &mut Node<'_>, call_point: CallPoint, source: bool) -> f64 {
    node.scope(call_point, |node| {
        let metric = node.nbr_dist();
        node.nbr_with(0, f64::INFINITY, |node, estimates| {
            if source {
                return 0.0;
            }
            let through = estimates.zip_with(&metric, |_, d, m| d + m);
            node.fold_hood(&through, f64::INFINITY, |best, _, d| best.min(*d))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcast_field::{DeviceId, Lockstep, Point};

    fn program(node: &mut Node<'_>) {
        let source = node.uid() == DeviceId(0);
        let d = abf_distance(node, 0, source);
        node.store("distance", d);
    }

    #[test]
    fn converges_on_a_line() {
        let mut net = Lockstep::line(5, 2.0, 2.5);
        net.run(8, &mut program);
        for i in 0..5 {
            assert_eq!(net.stored(DeviceId(i), "distance"), Some(2.0 * i as f64));
        }
    }

    #[test]
    fn isolated_device_is_unreachable() {
        let mut net = Lockstep::line(2, 1.0, 1.5);
        net.add_device(DeviceId(9), Point::new(100.0, 0.0));
        net.run(4, &mut program);
        assert_eq!(net.stored(DeviceId(9), "distance"), Some(f64::INFINITY));
        assert_eq!(net.stored(DeviceId(1), "distance"), Some(1.0));
    }

    #[test]
    fn prefers_the_shorter_path() {
        // 0 -- 1 -- 3 is longer than 0 -- 2 -- 3
        let mut net = Lockstep::new(2.1);
        net.add_device(DeviceId(0), Point::new(0.0, 0.0));
        net.add_device(DeviceId(1), Point::new(1.5, 1.0));
        net.add_device(DeviceId(2), Point::new(1.5, 0.0));
        net.add_device(DeviceId(3), Point::new(3.0, 0.0));
        net.run(6, &mut program);

        let d = net.stored(DeviceId(3), "distance").unwrap();
        assert!((d - 3.0).abs() < 1e-9, "distance {d}");
    }
}
