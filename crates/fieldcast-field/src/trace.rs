//! Call-site identity for persistent per-device state.
//!
//! Every exported value lives on a channel named by the stack of call points
//! that led to it plus a local index. The same code path on two devices
//! therefore names the same channel, and two different paths on one device
//! never collide. Call points must be unique among siblings in a scope.

/// A caller-chosen position inside an aggregate function.
pub type CallPoint = u32;

/// Key naming one exported channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey(pub u64);

const ROOT: u64 = 0x6a09_e667_f3bc_c908;
const CHANNEL_TAG: u64 = 1 << 32;

/// The stack of call points active on a device during a round.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    stack: Vec<u64>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    fn top(&self) -> u64 {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    /// Enter a call point.
    pub fn push(&mut self, point: CallPoint) {
        let next = mix(self.top(), u64::from(point));
        self.stack.push(next);
    }

    /// Leave the innermost call point.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Channel for a local index at the current depth.
    pub fn key(&self, index: u32) -> ChannelKey {
        ChannelKey(mix(self.top(), CHANNEL_TAG | u64::from(index)))
    }
}

// splitmix64 finalizer over the rotated state plus input
fn mix(state: u64, input: u64) -> u64 {
    let mut z = state
        .rotate_left(5)
        .wrapping_add(input)
        .wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_same_key() {
        let mut a = Trace::new();
        let mut b = Trace::new();
        a.push(3);
        a.push(1);
        b.push(3);
        b.push(1);
        assert_eq!(a.key(0), b.key(0));
    }

    #[test]
    fn different_paths_differ() {
        let mut a = Trace::new();
        let mut b = Trace::new();
        a.push(1);
        a.push(2);
        b.push(2);
        b.push(1);
        assert_ne!(a.key(0), b.key(0));
        assert_ne!(a.key(0), a.key(1));
    }

    #[test]
    fn pop_restores_scope() {
        let mut t = Trace::new();
        let outer = t.key(4);
        t.push(9);
        assert_ne!(t.key(4), outer);
        assert_eq!(t.depth(), 1);
        t.pop();
        assert_eq!(t.key(4), outer);
        assert_eq!(t.depth(), 0);
    }

    #[test]
    fn scope_and_channel_do_not_collide() {
        // Entering call point 0 must not alias channel 0 of the parent scope
        let mut t = Trace::new();
        let channel = t.key(0);
        t.push(0);
        assert_ne!(t.top(), channel.0);
    }
}
