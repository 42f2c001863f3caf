//! List-arithmetic collection.
//!
//! A single-path collection whose parent choice looks ahead: every neighbor
//! is scored by how fast this device is approaching the source through it,
//! given where that neighbor is projected to be at its next round. Only
//! neighbors that will still be in range are eligible, so the tree keeps
//! routing around devices that are about to leave.
//!
//! # Channels
//!
//! | Index | Published |
//! |---|---|
//! | 0 | distance |
//! | 1 | expected time of the next round |
//! | 2 | projected distance at the next round |
//! | 3 | accumulator |
//! | 4 | best score seen |
//! | 5 | relayed `(score, id)` candidates |
//! | 6 | chosen parent |
//! | 7 | scores of every neighbor |

use std::cmp::Ordering;

use fieldcast_field::{CallPoint, DeviceId, Exportable, Field, Node};
use tracing::debug;

/// Parameters of a list-arithmetic collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListCollection {
    /// Neighbors projected at or beyond this distance are not eligible parents.
    pub radius: f64,
    /// Bound on how fast devices move.
    pub speed: f64,
    /// Slack added to a neighbor's expected next round time.
    pub epsilon: f64,
}

/// What one round of list-arithmetic collection produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRound<T> {
    /// Aggregate of this device and every device routing through it.
    pub accumulator: T,
    /// Chosen parent; this device itself when it is a local root.
    pub parent: DeviceId,
    /// Best neighbor score, never below zero.
    pub threshold: f64,
}

impl ListCollection {
    /// Collect `value` towards the devices at distance zero.
    ///
    /// `null` must be an identity of `combine`, which must be associative and
    /// commutative for the aggregate to stabilize.
    pub fn collect<T, C>(
        &self,
        node: &mut Node<'_>,
        call_point: CallPoint,
        distance: f64,
        value: T,
        null: T,
        combine: C,
    ) -> T
    where
        T: Exportable,
        C: Fn(T, T) -> T,
    {
        self.round(node, call_point, distance, value, null, combine)
            .accumulator
    }

    /// Like [`ListCollection::collect`], also reporting the parent and
    /// threshold.
    pub fn round<T, C>(
        &self,
        node: &mut Node<'_>,
        call_point: CallPoint,
        distance: f64,
        value: T,
        null: T,
        combine: C,
    ) -> ListRound<T>
    where
        T: Exportable,
        C: Fn(T, T) -> T,
    {
        node.scope(call_point, |node| {
            let me = node.uid();
            let now = node.current_time();
            let next = node.next_time();

            let distances = node.nbr(0, distance);
            let deadlines = node.nbr(1, next + self.epsilon);
            let projected = node.nbr(2, distance + self.speed * (next - now));
            let reach = node
                .nbr_dist()
                .zip_with(&node.nbr_lag(), |_, link, lag| link + self.speed * lag);

            let timing = deadlines.zip_with(&projected, |_, t, p| (*t, *p));
            let scores = distances.zip_with(&timing, |id, d, &(deadline, projection)| {
                let reach = *reach.get_or(id, &f64::INFINITY);
                self.score(distance, *d, reach, deadline, projection, now)
            });

            let threshold = node.fold_hood(&scores, 0.0, |best: f64, _, s| best.max(*s));
            node.export(4, threshold);

            // A parent must outrank staying put, scored from this device's
            // previous export like any neighbor
            let own = *scores.get_or(me, &f64::NEG_INFINITY);

            // What each neighbor thinks of this device, relayed back so the
            // neighbor learns its own score of us together with our id.
            let rated = node.nbr_field(7, scores, f64::NEG_INFINITY);
            let relayed = rated.map(|_, s| (*s, me));
            let candidates = node.nbr_field(5, relayed, (f64::NEG_INFINITY, me));
            let parent = node
                .fold_hood(&candidates, (own, me), |best, id, &(score, _)| {
                    let candidate = (score, id);
                    if score > f64::NEG_INFINITY
                        && descending(&candidate, &best) == Ordering::Greater
                    {
                        candidate
                    } else {
                        best
                    }
                })
                .1;

            let parents = node.nbr_or(6, Some(parent), None);
            if let Some(Some(previous)) = parents.get(me) {
                if *previous != parent {
                    debug!(device = %me, from = %previous, to = %parent, "collection parent changed");
                }
            }

            let accumulator = node.nbr_with(3, null.clone(), |node, partial| {
                let children: Field<T> = partial.zip_with(&parents, |_, x, p| {
                    if *p == Some(me) {
                        x.clone()
                    } else {
                        null.clone()
                    }
                });
                node.fold_hood(&children, value, |acc, _, x| combine(acc, x.clone()))
            });

            ListRound {
                accumulator,
                parent,
                threshold,
            }
        })
    }

    /// Rate of approach to the source through a neighbor, or `-inf` when the
    /// neighbor is not an eligible parent.
    fn score(
        &self,
        distance: f64,
        neighbor_distance: f64,
        reach: f64,
        deadline: f64,
        projection: f64,
        now: f64,
    ) -> f64 {
        if !distance.is_finite() || !neighbor_distance.is_finite() || !(reach < self.radius) {
            return f64::NEG_INFINITY;
        }
        let window = deadline - now;
        if window <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let rate = (distance - projection) / window;
        if rate.is_nan() {
            f64::NEG_INFINITY
        } else {
            rate
        }
    }
}

/// Score first, then larger id.
fn descending(a: &(f64, DeviceId), b: &(f64, DeviceId)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::add;
    use fieldcast_field::{Lockstep, Point};

    const STATIC: ListCollection = ListCollection {
        radius: 2.0,
        speed: 0.0,
        epsilon: 0.1,
    };

    const MOVING: ListCollection = ListCollection {
        radius: 10.0,
        speed: 2.0,
        epsilon: 0.1,
    };

    fn counting(
        list: ListCollection,
        distance_of: fn(DeviceId) -> f64,
    ) -> impl FnMut(&mut Node<'_>) {
        move |node: &mut Node<'_>| {
            let distance = distance_of(node.uid());
            let round = list.round(node, 0, distance, 1.0, 0.0, add);
            node.store("sum", round.accumulator);
            node.store("parent", round.parent.value() as f64);
            node.store("threshold", round.threshold);
        }
    }

    fn by_id(id: DeviceId) -> f64 {
        id.value() as f64
    }

    #[test]
    fn line_of_three_counts_three() {
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = counting(STATIC, by_id);
        net.run(10, &mut program);

        assert_eq!(net.stored(DeviceId(0), "sum"), Some(3.0));
        assert_eq!(net.stored(DeviceId(0), "parent"), Some(0.0));
        assert_eq!(net.stored(DeviceId(1), "parent"), Some(0.0));
        assert_eq!(net.stored(DeviceId(2), "parent"), Some(1.0));
        assert!(net.stored(DeviceId(2), "threshold").unwrap() > 0.0);
    }

    #[test]
    fn disconnection_drops_the_sum_without_reset() {
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = counting(STATIC, by_id);
        net.run(10, &mut program);
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(3.0));

        net.disconnect(DeviceId(1), DeviceId(2));
        net.run(4, &mut program);
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(2.0));
        assert_eq!(net.stored(DeviceId(2), "parent"), Some(2.0));
        assert_eq!(net.stored(DeviceId(2), "sum"), Some(1.0));
    }

    #[test]
    fn speed_bound_still_forms_a_tree() {
        // Every score is negative, but a closer neighbor beats staying a root
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = counting(MOVING, by_id);
        net.run(20, &mut program);

        assert_eq!(net.stored(DeviceId(0), "sum"), Some(3.0));
        assert_eq!(net.stored(DeviceId(0), "parent"), Some(0.0));
        assert_eq!(net.stored(DeviceId(1), "parent"), Some(0.0));
        assert_eq!(net.stored(DeviceId(2), "parent"), Some(1.0));
        assert_eq!(net.stored(DeviceId(2), "threshold"), Some(0.0));
    }

    #[test]
    fn speed_bound_disconnection_drops_the_sum() {
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = counting(MOVING, by_id);
        net.run(20, &mut program);
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(3.0));

        net.disconnect(DeviceId(1), DeviceId(2));
        net.run(4, &mut program);
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(2.0));
        assert_eq!(net.stored(DeviceId(2), "parent"), Some(2.0));
    }

    #[test]
    fn farther_neighbors_never_outrank_self() {
        // With a speed bound the self score is negative too
        let mut net = Lockstep::line(2, 1.0, 1.5);
        let mut program = counting(MOVING, by_id);
        net.run(10, &mut program);
        assert_eq!(net.stored(DeviceId(0), "parent"), Some(0.0));
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(2.0));
    }

    #[test]
    fn ties_go_to_the_larger_id() {
        // 3 is equally well served by 1 and 2
        let mut net = Lockstep::new(1.5);
        net.add_device(DeviceId(0), Point::new(0.0, 0.0));
        net.add_device(DeviceId(1), Point::new(1.0, 0.5));
        net.add_device(DeviceId(2), Point::new(1.0, -0.5));
        net.add_device(DeviceId(3), Point::new(2.0, 0.0));
        let mut program = counting(STATIC, |id| match id.value() {
            0 => 0.0,
            3 => 2.0,
            _ => 1.0,
        });
        net.run(12, &mut program);

        assert_eq!(net.stored(DeviceId(3), "parent"), Some(2.0));
        assert_eq!(net.stored(DeviceId(2), "sum"), Some(2.0));
        assert_eq!(net.stored(DeviceId(1), "sum"), Some(1.0));
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(4.0));
    }

    #[test]
    fn out_of_radius_neighbors_are_not_parents() {
        // Linked, but farther than the eligibility radius
        let mut net = Lockstep::line(2, 3.0, 3.5);
        let mut program = counting(STATIC, by_id);
        net.run(8, &mut program);
        assert_eq!(net.stored(DeviceId(1), "parent"), Some(1.0));
        assert_eq!(net.stored(DeviceId(0), "sum"), Some(1.0));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let positions = [(0, 0.0), (3, 3.0), (1, 1.0), (2, 2.0)];
        let mut forward = Lockstep::new(1.5);
        let mut backward = Lockstep::new(1.5);
        for (id, x) in positions {
            forward.add_device(DeviceId(id), Point::new(x, 0.0));
        }
        for (id, x) in positions.iter().rev() {
            backward.add_device(DeviceId(*id), Point::new(*x, 0.0));
        }

        let mut program = counting(STATIC, by_id);
        forward.run(10, &mut program);
        backward.run(10, &mut program);
        for id in 0..4 {
            assert_eq!(
                forward.storage(DeviceId(id)),
                backward.storage(DeviceId(id)),
                "device {id}"
            );
        }
        assert_eq!(forward.stored(DeviceId(0), "sum"), Some(4.0));
    }

    #[test]
    fn ineligible_neighbors_score_negative_infinity() {
        let score = STATIC.score(f64::INFINITY, 1.0, 1.0, 1.1, 1.0, 1.0);
        assert_eq!(score, f64::NEG_INFINITY);
        // Overdue neighbor round
        let score = STATIC.score(2.0, 1.0, 1.0, 0.5, 1.0, 1.0);
        assert_eq!(score, f64::NEG_INFINITY);
        // Neighbor round due right now
        let score = STATIC.score(2.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(score, f64::NEG_INFINITY);
        let score = STATIC.score(2.0, 1.0, 1.0, 1.5, 1.0, 1.0);
        assert_eq!(score, 2.0);
    }
}
