//! The per-round device context.
//!
//! A [`Node`] is what an aggregate function sees while a device computes one
//! round: its identity and clock, the latest message from every neighbor,
//! and an export under construction. Persistent state is nothing more than
//! the channels of the device's own previous export, so every `nbr`/`old`
//! call site carries its memory from round to round by channel key.

use std::collections::BTreeMap;

use crate::export::{Export, Exportable, Message};
use crate::trace::{CallPoint, Trace};
use crate::{DeviceId, Field, Point};

/// Named scalar outputs a device leaves for observers.
pub type Storage = BTreeMap<&'static str, f64>;

/// Round timestamps of a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundClock {
    /// Time of the current round
    pub time: f64,
    /// Scheduled time of the next round
    pub next_time: f64,
}

impl RoundClock {
    /// Create a clock for a round at `time` followed by one at `next_time`.
    pub const fn new(time: f64, next_time: f64) -> Self {
        Self { time, next_time }
    }
}

/// Read-only view of the wider network.
///
/// Only drivers use this; the core algorithms see neighbors exclusively
/// through fields.
pub trait NetworkView {
    /// Whether a device is currently part of the network.
    fn contains(&self, id: DeviceId) -> bool;

    /// Current position of a device.
    fn position_of(&self, id: DeviceId) -> Option<Point>;
}

/// Device positions frozen at one instant.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    positions: BTreeMap<DeviceId, Point>,
}

impl PositionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
        }
    }

    /// Record a position.
    pub fn insert(&mut self, id: DeviceId, position: Point) {
        self.positions.insert(id, position);
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<(DeviceId, Point)> for PositionTable {
    fn from_iter<I: IntoIterator<Item = (DeviceId, Point)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl NetworkView for PositionTable {
    fn contains(&self, id: DeviceId) -> bool {
        self.positions.contains_key(&id)
    }

    fn position_of(&self, id: DeviceId) -> Option<Point> {
        self.positions.get(&id).copied()
    }
}

/// Context of one device during one round.
pub struct Node<'a> {
    uid: DeviceId,
    clock: RoundClock,
    position: Point,
    inbox: &'a BTreeMap<DeviceId, Message>,
    storage: &'a mut Storage,
    world: &'a dyn NetworkView,
    trace: Trace,
    export: Export,
}

impl<'a> Node<'a> {
    /// Create a round context.
    ///
    /// `inbox` holds the latest message of every neighbor and, after the
    /// first round, the device's own previous export.
    pub fn new(
        uid: DeviceId,
        clock: RoundClock,
        position: Point,
        inbox: &'a BTreeMap<DeviceId, Message>,
        storage: &'a mut Storage,
        world: &'a dyn NetworkView,
    ) -> Self {
        Self {
            uid,
            clock,
            position,
            inbox,
            storage,
            world,
            trace: Trace::new(),
            export: Export::new(),
        }
    }

    /// This device's identifier.
    pub fn uid(&self) -> DeviceId {
        self.uid
    }

    /// Time of the current round.
    pub fn current_time(&self) -> f64 {
        self.clock.time
    }

    /// Scheduled time of the next round.
    pub fn next_time(&self) -> f64 {
        self.clock.next_time
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// The wider network, for drivers.
    pub fn world(&self) -> &'a dyn NetworkView {
        self.world
    }

    /// Devices in the current neighborhood, this one included.
    pub fn neighbor_count(&self) -> usize {
        if self.inbox.contains_key(&self.uid) {
            self.inbox.len()
        } else {
            self.inbox.len() + 1
        }
    }

    /// Run `f` inside call point `point`.
    pub fn scope<R, F>(&mut self, point: CallPoint, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.trace.push(point);
        let result = f(self);
        self.trace.pop();
        result
    }

    /// Publish a value without reading anything back.
    pub fn export<T: Exportable>(&mut self, index: u32, value: T) {
        let key = self.trace.key(index);
        self.export.insert(key, value);
    }

    /// Update this device's own value from the previous round.
    ///
    /// The previous value (or `init` on the first round) is passed to `f`;
    /// the result is stored for the next round and returned.
    pub fn old<T, F>(&mut self, index: u32, init: T, f: F) -> T
    where
        T: Exportable,
        F: FnOnce(T) -> T,
    {
        let key = self.trace.key(index);
        let previous = self
            .inbox
            .get(&self.uid)
            .and_then(|m| m.export.get::<T>(key))
            .cloned()
            .unwrap_or(init);
        let value = f(previous);
        self.export.insert(key, value.clone());
        value
    }

    /// Publish `value` and read every neighbor's last published value.
    ///
    /// Neighbors that never published on this channel read as `value`.
    pub fn nbr<T: Exportable>(&mut self, index: u32, value: T) -> Field<T> {
        self.nbr_or(index, value.clone(), value)
    }

    /// Like [`Node::nbr`], with an explicit value for absent neighbors.
    pub fn nbr_or<T: Exportable>(&mut self, index: u32, value: T, absent: T) -> Field<T> {
        let key = self.trace.key(index);
        let field = self.gather(|msg| msg.export.get::<T>(key).cloned(), &absent);
        self.export.insert(key, value);
        field
    }

    /// Read neighbors' last values, compute this round's value from them and
    /// publish it.
    ///
    /// Neighbors that never published read as `init`.
    pub fn nbr_with<T, F>(&mut self, index: u32, init: T, f: F) -> T
    where
        T: Exportable,
        F: FnOnce(&mut Self, Field<T>) -> T,
    {
        let key = self.trace.key(index);
        let field = self.gather(|msg| msg.export.get::<T>(key).cloned(), &init);
        let value = f(self, field);
        self.export.insert(key, value.clone());
        value
    }

    /// Publish a per-neighbor field and read what each neighbor's field
    /// holds for this device.
    ///
    /// Neighbors whose field has no entry for this device read as `absent`.
    pub fn nbr_field<T: Exportable>(&mut self, index: u32, field: Field<T>, absent: T) -> Field<T> {
        let key = self.trace.key(index);
        let me = self.uid;
        let read = self.gather(
            |msg| {
                msg.export
                    .get::<Field<T>>(key)
                    .and_then(|f| f.get(me))
                    .cloned()
            },
            &absent,
        );
        self.export.insert(key, field);
        read
    }

    /// Identifier of every device in the neighborhood.
    pub fn nbr_uid(&self) -> Field<DeviceId> {
        self.domain(|id, _| id)
    }

    /// Physical distance to every neighbor (zero for this device).
    pub fn nbr_dist(&self) -> Field<f64> {
        self.domain(|_, msg| msg.map_or(0.0, |m| m.distance))
    }

    /// Age of every neighbor's latest message.
    pub fn nbr_lag(&self) -> Field<f64> {
        let now = self.clock.time;
        self.domain(|_, msg| msg.map_or(0.0, |m| m.lag(now)))
    }

    /// Reduce a field over neighbors, leaving out this device.
    pub fn fold_hood<T, A, F>(&self, field: &Field<T>, seed: A, f: F) -> A
    where
        F: FnMut(A, DeviceId, &T) -> A,
    {
        field.fold_except(self.uid, seed, f)
    }

    /// Record a named output.
    pub fn store(&mut self, tag: &'static str, value: f64) {
        self.storage.insert(tag, value);
    }

    /// Read a named output.
    pub fn stored(&self, tag: &'static str) -> Option<f64> {
        self.storage.get(tag).copied()
    }

    /// Finish the round, yielding what was published.
    pub fn into_export(self) -> Export {
        self.export
    }

    fn gather<T, R>(&self, read: R, absent: &T) -> Field<T>
    where
        T: Clone,
        R: Fn(&Message) -> Option<T>,
    {
        self.domain(|_, msg| msg.and_then(&read).unwrap_or_else(|| absent.clone()))
    }

    fn domain<T, F>(&self, mut f: F) -> Field<T>
    where
        F: FnMut(DeviceId, Option<&Message>) -> T,
    {
        let mut field: Field<T> = self
            .inbox
            .iter()
            .map(|(id, msg)| (*id, f(*id, Some(msg))))
            .collect();
        if !field.contains(self.uid) {
            field.insert(self.uid, f(self.uid, None));
        }
        field
    }
}
