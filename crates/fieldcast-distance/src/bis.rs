//! Bounded-information-speed distance.

use std::cmp::Ordering;

use fieldcast_field::{CallPoint, Node};

/// Distance that never trusts information older than its travel allows.
///
/// Devices exchange `(distance, age)` pairs, where `age` is how long ago the
/// information left the source. A path through a neighbor is charged at
/// least `(age - period) * speed`: information cannot have travelled faster
/// than `speed`, so stale paths lose to fresh ones and estimates rise at a
/// bounded pace instead of counting to infinity.
pub fn bis_distance(
    node: &mut Node<'_>,
    call_point: CallPoint,
    source: bool,
    period: f64,
    speed: f64,
) -> f64 {
    node.scope(call_point, |node| {
        let links = node.nbr_dist().zip_with(&node.nbr_lag(), |_, m, l| (*m, *l));
        let local = if source {
            (0.0, 0.0)
        } else {
            (f64::INFINITY, 0.0)
        };

        let (distance, _) = node.nbr_with(0, local, |node, info| {
            let candidates = info.zip_with(&links, |_, &(d, age), &(m, l)| {
                let age = age + l;
                ((d + m).max((age - period) * speed), age)
            });
            node.fold_hood(&candidates, local, |best, _, c| {
                if lexicographic(c, &best) == Ordering::Less {
                    *c
                } else {
                    best
                }
            })
        });
        distance
    })
}

fn lexicographic(a: &(f64, f64), b: &(f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcast_field::{DeviceId, Lockstep};

    #[test]
    fn source_is_zero_and_line_is_exact() {
        // Fast information: the age bound never binds
        let mut net = Lockstep::line(4, 100.0, 150.0);
        let mut program = |node: &mut Node<'_>| {
            let source = node.uid() == DeviceId(0);
            let d = bis_distance(node, 0, source, 1.0, 50.0);
            node.store("distance", d);
        };
        net.run(8, &mut program);

        for i in 0..4 {
            assert_eq!(net.stored(DeviceId(i), "distance"), Some(100.0 * i as f64));
        }
    }

    #[test]
    fn slow_information_raises_the_estimate() {
        // Links of length 1, but information ages one unit per hop and is
        // charged at 5 units per unit of age beyond the first period
        let mut net = Lockstep::line(4, 1.0, 1.5);
        let mut program = |node: &mut Node<'_>| {
            let source = node.uid() == DeviceId(0);
            let d = bis_distance(node, 0, source, 1.0, 5.0);
            node.store("distance", d);
        };
        net.run(10, &mut program);

        assert_eq!(net.stored(DeviceId(1), "distance"), Some(1.0));
        // Three hops: age 3, bound (3 - 1) * 5 = 10 > 3
        assert_eq!(net.stored(DeviceId(3), "distance"), Some(10.0));
    }

    #[test]
    fn unreachable_stays_infinite() {
        let mut net = Lockstep::line(1, 1.0, 1.5);
        net.add_device(DeviceId(5), fieldcast_field::Point::new(50.0, 0.0));
        let mut program = |node: &mut Node<'_>| {
            let source = node.uid() == DeviceId(0);
            let d = bis_distance(node, 0, source, 1.0, 50.0);
            node.store("distance", d);
        };
        net.run(3, &mut program);
        assert_eq!(net.stored(DeviceId(5), "distance"), Some(f64::INFINITY));
        assert_eq!(net.stored(DeviceId(0), "distance"), Some(0.0));
    }
}
