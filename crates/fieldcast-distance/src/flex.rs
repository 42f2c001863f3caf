//! Flexible gradient.
//!
//! Trades accuracy for stability: an estimate is only moved when the local
//! slope of the gradient drifts outside `1 +- epsilon`, and is recomputed
//! from scratch periodically or when it is grossly wrong.

use fieldcast_field::{CallPoint, Node};

/// Distance that tolerates a bounded relative error to avoid churn.
///
/// * `epsilon`: tolerated slope deviation from 1.
/// * `radius`: communication radius of the network.
/// * `distortion`: fraction of `radius` below which link lengths are
///   rounded up, so very short links cannot amplify noise.
/// * `frequency`: rounds between unconditional resets (`0` behaves as `1`).
pub fn flex_distance(
    node: &mut Node<'_>,
    call_point: CallPoint,
    source: bool,
    epsilon: f64,
    radius: f64,
    distortion: f64,
    frequency: u32,
) -> f64 {
    node.scope(call_point, |node| {
        let floor = distortion * radius;
        let metric = node.nbr_dist().map(|_, d| d.max(floor));
        let counter = node.old(1, 0u32, |c| c.wrapping_add(1));
        let me = node.uid();

        node.nbr_with(0, f64::INFINITY, |node, estimates| {
            if source {
                return 0.0;
            }
            let local = *estimates.get_or(me, &f64::INFINITY);
            let links = estimates.zip_with(&metric, |_, d, m| (*d, *m));

            let constraint = node.fold_hood(&links, f64::INFINITY, |best, _, (d, m)| best.min(d + m));
            let (slope, d, m) = node.fold_hood(
                &links,
                (f64::NEG_INFINITY, f64::INFINITY, 0.0),
                |best, _, &(d, m)| {
                    let mut s = (local - d) / m;
                    if s.is_nan() {
                        s = f64::NEG_INFINITY;
                    }
                    if s > best.0 {
                        (s, d, m)
                    } else {
                        best
                    }
                },
            );

            let reset = counter % frequency.max(1) == 0
                || local.is_infinite()
                || local > 2.0 * constraint
                || constraint > 2.0 * local;
            if reset {
                constraint
            } else if slope > 1.0 + epsilon {
                d + m * (1.0 + epsilon)
            } else if slope < 1.0 - epsilon {
                d + m * (1.0 - epsilon)
            } else {
                local
            }
        })
    })
}
