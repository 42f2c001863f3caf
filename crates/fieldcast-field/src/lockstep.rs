//! Synchronous network for driving aggregate programs in lockstep.
//!
//! Every device runs once per step against the messages of the previous
//! step; exports are then delivered to all linked devices at once. Links
//! are fixed-range connections that can be severed by hand, and a severed
//! neighbor disappears from the inbox on the very next step.

use std::collections::{BTreeMap, BTreeSet};

use crate::device::DeviceState;
use crate::export::Message;
use crate::node::{NetworkView, Node, PositionTable, RoundClock, Storage};
use crate::{DeviceId, Point};

struct Slot {
    state: DeviceState,
    position: Point,
}

/// A static network advancing all devices in synchronous rounds.
pub struct Lockstep {
    period: f64,
    range: f64,
    time: f64,
    devices: BTreeMap<DeviceId, Slot>,
    severed: BTreeSet<(DeviceId, DeviceId)>,
}

impl Lockstep {
    /// Create an empty network linking devices closer than `range`.
    pub fn new(range: f64) -> Self {
        Self {
            period: 1.0,
            range,
            time: 0.0,
            devices: BTreeMap::new(),
            severed: BTreeSet::new(),
        }
    }

    /// Devices `0..count` on the x axis, `spacing` apart.
    pub fn line(count: u64, spacing: f64, range: f64) -> Self {
        let mut net = Self::new(range);
        for i in 0..count {
            net.add_device(DeviceId(i), Point::new(i as f64 * spacing, 0.0));
        }
        net
    }

    /// Set the time between steps.
    pub fn with_period(mut self, period: f64) -> Self {
        self.period = period;
        self
    }

    /// Add a device (or move an existing one, keeping its state).
    pub fn add_device(&mut self, id: DeviceId, position: Point) {
        self.devices
            .entry(id)
            .and_modify(|slot| slot.position = position)
            .or_insert_with(|| Slot {
                state: DeviceState::new(id),
                position,
            });
    }

    /// Move a device. Returns false for unknown devices.
    pub fn move_device(&mut self, id: DeviceId, position: Point) -> bool {
        match self.devices.get_mut(&id) {
            Some(slot) => {
                slot.position = position;
                true
            }
            None => false,
        }
    }

    /// Cut the link between two devices regardless of their distance.
    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) {
        self.severed.insert(edge(a, b));
    }

    /// Undo [`Lockstep::disconnect`].
    pub fn reconnect(&mut self, a: DeviceId, b: DeviceId) {
        self.severed.remove(&edge(a, b));
    }

    /// Whether two devices currently exchange messages.
    pub fn linked(&self, a: DeviceId, b: DeviceId) -> bool {
        match (self.devices.get(&a), self.devices.get(&b)) {
            (Some(x), Some(y)) => {
                a != b && in_range(&self.severed, self.range, a, x.position, b, y.position)
            }
            _ => false,
        }
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Time of the next step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Named outputs of a device.
    pub fn storage(&self, id: DeviceId) -> Option<&Storage> {
        self.devices.get(&id).map(|slot| slot.state.storage())
    }

    /// One named output of a device.
    pub fn stored(&self, id: DeviceId, tag: &str) -> Option<f64> {
        self.storage(id).and_then(|s| s.get(tag)).copied()
    }

    /// Run every device once, then deliver all exports.
    pub fn step<F>(&mut self, program: &mut F)
    where
        F: FnMut(&mut Node<'_>),
    {
        let positions: PositionTable = self
            .devices
            .iter()
            .map(|(id, slot)| (*id, slot.position))
            .collect();
        let clock = RoundClock::new(self.time, self.time + self.period);

        let mut published = Vec::with_capacity(self.devices.len());
        for (id, slot) in self.devices.iter_mut() {
            let ((), export) = slot.state.round(clock, slot.position, &positions, |node| program(node));
            published.push((*id, slot.position, export));
        }

        for slot in self.devices.values_mut() {
            slot.state.forget_neighbors();
        }
        for (from, origin, export) in &published {
            for (to, slot) in self.devices.iter_mut() {
                if !in_range(&self.severed, self.range, *from, *origin, *to, slot.position) {
                    continue;
                }
                let message = Message::new(export.clone(), clock.time, origin.distance(&slot.position));
                slot.state.receive(*from, message);
            }
        }

        self.time += self.period;
    }

    /// Run `rounds` steps.
    pub fn run<F>(&mut self, rounds: usize, program: &mut F)
    where
        F: FnMut(&mut Node<'_>),
    {
        for _ in 0..rounds {
            self.step(program);
        }
    }
}

impl NetworkView for Lockstep {
    fn contains(&self, id: DeviceId) -> bool {
        self.devices.contains_key(&id)
    }

    fn position_of(&self, id: DeviceId) -> Option<Point> {
        self.devices.get(&id).map(|slot| slot.position)
    }
}

fn edge(a: DeviceId, b: DeviceId) -> (DeviceId, DeviceId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn in_range(
    severed: &BTreeSet<(DeviceId, DeviceId)>,
    range: f64,
    a: DeviceId,
    pa: Point,
    b: DeviceId,
    pb: Point,
) -> bool {
    a != b && pa.distance(&pb) <= range && !severed.contains(&edge(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor_count(node: &mut Node<'_>) {
        let count = node.neighbor_count() as f64;
        node.store("count", count);
    }

    #[test]
    fn line_links_adjacent_devices() {
        let net = Lockstep::line(3, 1.0, 1.5);
        assert!(net.linked(DeviceId(0), DeviceId(1)));
        assert!(net.linked(DeviceId(1), DeviceId(2)));
        assert!(!net.linked(DeviceId(0), DeviceId(2)));
        assert!(!net.linked(DeviceId(0), DeviceId(0)));
    }

    #[test]
    fn neighbors_appear_after_one_step() {
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = neighbor_count;

        net.step(&mut program);
        assert_eq!(net.stored(DeviceId(1), "count"), Some(1.0));

        net.step(&mut program);
        assert_eq!(net.stored(DeviceId(0), "count"), Some(2.0));
        assert_eq!(net.stored(DeviceId(1), "count"), Some(3.0));
        assert_eq!(net.time(), 2.0);
    }

    #[test]
    fn disconnect_takes_effect_next_step() {
        let mut net = Lockstep::line(3, 1.0, 1.5);
        let mut program = neighbor_count;
        net.run(2, &mut program);

        net.disconnect(DeviceId(2), DeviceId(1));
        assert!(!net.linked(DeviceId(1), DeviceId(2)));
        net.run(2, &mut program);
        assert_eq!(net.stored(DeviceId(1), "count"), Some(2.0));
        assert_eq!(net.stored(DeviceId(2), "count"), Some(1.0));

        net.reconnect(DeviceId(1), DeviceId(2));
        net.run(2, &mut program);
        assert_eq!(net.stored(DeviceId(2), "count"), Some(2.0));
    }

    #[test]
    fn moving_out_of_range_unlinks() {
        let mut net = Lockstep::line(2, 1.0, 1.5);
        assert!(net.move_device(DeviceId(1), Point::new(10.0, 0.0)));
        assert!(!net.linked(DeviceId(0), DeviceId(1)));
        assert!(!net.move_device(DeviceId(7), Point::ORIGIN));
        assert_eq!(net.position_of(DeviceId(1)), Some(Point::new(10.0, 0.0)));
    }
}
