//! Accumulation policies.
//!
//! A policy says how values meet on their way to the source: `combine`
//! merges two partial aggregates, `split` shares an aggregate among `n`
//! parents and `gate` scales it by a routing weight in `[0, 1]`.

/// Threshold numerator of the progress-tracking gate.
pub const PROGRESS_GATE_SCALE: f64 = 3.5;

/// The combine/split/gate triple driving a collection.
#[derive(Debug, Clone, Copy)]
pub struct Policy<C, S, G> {
    /// Merge two partial aggregates.
    pub combine: C,
    /// Share an aggregate among a number of parents.
    pub split: S,
    /// Scale an aggregate by a routing weight.
    pub gate: G,
}

impl<C, S, G> Policy<C, S, G> {
    /// Bundle three operations.
    pub fn new(combine: C, split: S, gate: G) -> Self {
        Self {
            combine,
            split,
            gate,
        }
    }
}

/// Plain function pointers for each operation.
pub type FnPolicy = Policy<fn(f64, f64) -> f64, fn(f64, usize) -> f64, fn(f64, f64) -> f64>;

/// Sum of values, split evenly and weighted proportionally.
///
/// The identity is `0`.
pub fn sum_policy() -> FnPolicy {
    Policy {
        combine: add,
        split: divide,
        gate: multiply,
    }
}

/// Maximum of values, never split, gated by a neighborhood-size threshold.
///
/// `neighbor_count` includes the device itself. The identity `0` only holds
/// for non-negative values.
pub fn max_policy(
    neighbor_count: usize,
) -> Policy<fn(f64, f64) -> f64, fn(f64, usize) -> f64, impl Fn(f64, f64) -> f64 + Copy> {
    Policy::new(
        maximum as fn(f64, f64) -> f64,
        keep as fn(f64, usize) -> f64,
        threshold_gate(neighbor_count),
    )
}

/// `x + y`.
pub fn add(x: f64, y: f64) -> f64 {
    x + y
}

/// `x / n`; `n` is at least 1 where collections call it.
pub fn divide(x: f64, n: usize) -> f64 {
    x / n as f64
}

/// `x` scaled by its weight.
pub fn multiply(x: f64, weight: f64) -> f64 {
    x * weight
}

/// The larger of two values.
pub fn maximum(x: f64, y: f64) -> f64 {
    x.max(y)
}

/// `x` unchanged, whatever the share count.
pub fn keep(x: f64, _n: usize) -> f64 {
    x
}

/// Pass `x` through only when its weight beats `3.5 / neighbor_count`.
pub fn threshold_gate(neighbor_count: usize) -> impl Fn(f64, f64) -> f64 + Copy {
    let threshold = PROGRESS_GATE_SCALE / neighbor_count.max(1) as f64;
    move |x, weight| if weight > threshold { x } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sum_policy_shares_and_weights() {
        let p = sum_policy();
        assert_eq!((p.combine)(2.0, 3.0), 5.0);
        assert_eq!((p.split)(6.0, 3), 2.0);
        assert_eq!((p.gate)(8.0, 0.25), 2.0);
    }

    #[test]
    fn threshold_depends_on_neighborhood() {
        // 3.5 / 5 = 0.7
        let gate = threshold_gate(5);
        assert_eq!(gate(9.0, 0.8), 9.0);
        assert_eq!(gate(9.0, 0.7), 0.0);
        assert_eq!(gate(9.0, 0.5), 0.0);

        // A lone device never passes anything: 3.5 / 1 > 1
        let lonely = threshold_gate(1);
        assert_eq!(lonely(9.0, 1.0), 0.0);
    }

    #[test]
    fn max_policy_never_splits() {
        let p = max_policy(4);
        assert_eq!((p.split)(7.5, 3), 7.5);
        assert_eq!((p.combine)(-1.0, 2.0), 2.0);
        assert_eq!((p.gate)(3.0, 1.0), 3.0);
    }

    proptest! {
        #[test]
        fn zero_is_the_sum_identity(x in -1e9f64..1e9) {
            prop_assert_eq!(add(x, 0.0), x);
            prop_assert_eq!(add(0.0, x), x);
        }

        #[test]
        fn zero_is_the_max_identity_for_non_negative_values(x in 0.0f64..1e9) {
            prop_assert_eq!(maximum(x, 0.0), x);
            prop_assert_eq!(maximum(0.0, x), x);
        }

        #[test]
        fn combine_is_commutative(x in -1e9f64..1e9, y in -1e9f64..1e9) {
            prop_assert_eq!(add(x, y), add(y, x));
            prop_assert_eq!(maximum(x, y), maximum(y, x));
        }

        #[test]
        fn max_is_idempotent(x in -1e9f64..1e9, y in -1e9f64..1e9) {
            prop_assert_eq!(maximum(x, x), x);
            prop_assert_eq!(maximum(maximum(x, y), y), maximum(x, y));
        }

        #[test]
        fn gate_passes_all_or_nothing(x in -1e9f64..1e9, w in 0.0f64..1.0, n in 1usize..64) {
            let gated = threshold_gate(n)(x, w);
            prop_assert!(gated == x || gated == 0.0);
        }
    }
}
