//! Gradient-driven collection.
//!
//! All three variants route partial aggregates down a distance gradient
//! towards the source. They differ in how many parents a device feeds:
//! one ([`sp_collection`]), all closer neighbors evenly
//! ([`mp_collection`]) or all closer neighbors by weight
//! ([`wmp_collection`]).

use std::cmp::Ordering;

use fieldcast_field::{CallPoint, DeviceId, Exportable, Node};
use tracing::debug;

/// Single-path collection.
///
/// The parent is the neighbor with the smallest previous distance (ties on
/// id), this device included, so a local minimum is its own root. A device
/// combines `value` with the accumulators of the neighbors that chose it.
pub fn sp_collection<T, C>(
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
    node.scope(call_point, |node| {
        let me = node.uid();
        let distances = node.nbr(1, distance);
        let own = (*distances.get_or(me, &distance), me);
        let (_, parent) = distances.fold(own, |best, id, d| {
            let candidate = (*d, id);
            if ascending(&candidate, &best) == Ordering::Less {
                candidate
            } else {
                best
            }
        });

        let parents = node.nbr(2, parent);
        if parents.get(me).is_some_and(|previous| *previous != parent) {
            debug!(device = %me, %parent, "single-path parent changed");
        }

        node.nbr_with(0, null.clone(), |node, partial| {
            let children = partial.zip_with(&parents, |_, x, p| {
                if *p == me {
                    x.clone()
                } else {
                    null.clone()
                }
            });
            node.fold_hood(&children, value, |acc, _, x| combine(acc, x.clone()))
        })
    })
}

/// Multi-path collection.
///
/// A device gathers from every neighbor farther from the source and
/// publishes its aggregate divided among the neighbors closer to it, so each
/// of them receives an even share.
pub fn mp_collection<T, C, S>(
    node: &mut Node<'_>,
    call_point: CallPoint,
    distance: f64,
    value: T,
    null: T,
    combine: C,
    split: S,
) -> T
where
    T: Exportable,
    C: Fn(T, T) -> T,
    S: Fn(T, usize) -> T,
{
    node.scope(call_point, |node| {
        let distances = node.nbr(1, distance);
        let parents = node
            .fold_hood(&distances, 0usize, |n, _, d| if *d < distance { n + 1 } else { n })
            .max(1);

        node.nbr_with(0, null.clone(), |node, partial| {
            let upstream = partial.zip_with(&distances, |_, x, d| {
                if *d > distance {
                    x.clone()
                } else {
                    null.clone()
                }
            });
            let total = node.fold_hood(&upstream, value, |acc, _, x| combine(acc, x.clone()));
            split(total, parents)
        })
    })
}

/// Weighted multi-path collection.
///
/// A device weighs each closer neighbor by how close it is physically
/// (`radius - link`) and how much closer it is to the source, normalizes
/// the weights and publishes them. Every device then gathers its
/// neighbors' aggregates scaled by the weight they assigned to it.
pub fn wmp_collection<T, C, G>(
    node: &mut Node<'_>,
    call_point: CallPoint,
    distance: f64,
    radius: f64,
    value: T,
    combine: C,
    gate: G,
) -> T
where
    T: Exportable,
    C: Fn(T, T) -> T,
    G: Fn(T, f64) -> T,
{
    node.scope(call_point, |node| {
        let me = node.uid();
        let distances = node.nbr(0, distance);
        let raw = distances.zip_with(&node.nbr_dist(), |id, d, link| {
            if id == me {
                return 0.0;
            }
            let w = (radius - link).max(0.0) * (distance - d).max(0.0);
            if w.is_finite() {
                w
            } else {
                0.0
            }
        });
        let total = node.fold_hood(&raw, 0.0, |sum, _, w| sum + w);
        let weights = raw.map(|_, w| {
            if total > 0.0 && distance.is_finite() {
                w / total
            } else {
                0.0
            }
        });

        let received = node.nbr_field(1, weights, 0.0);
        node.nbr_with(2, value.clone(), |node, partial| {
            let gated = partial.zip_with(&received, |_, x, w| gate(x.clone(), *w));
            node.fold_hood(&gated, value, |acc, _, x| combine(acc, x.clone()))
        })
    })
}

fn ascending(a: &(f64, DeviceId), b: &(f64, DeviceId)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}
