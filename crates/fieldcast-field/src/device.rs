//! Persistent state owned by one device.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace_span};

use crate::export::{Export, Message};
use crate::node::{NetworkView, Node, RoundClock, Storage};
use crate::{DeviceId, Point};

/// Everything a device keeps between rounds.
///
/// The inbox holds the latest message from each neighbor plus the device's
/// own previous export; that own export is the only per-call-site memory
/// the device has.
#[derive(Debug, Default)]
pub struct DeviceState {
    uid: DeviceId,
    inbox: BTreeMap<DeviceId, Message>,
    storage: Storage,
    rounds: u64,
}

impl DeviceState {
    /// Create a device that has not run yet.
    pub fn new(uid: DeviceId) -> Self {
        Self {
            uid,
            inbox: BTreeMap::new(),
            storage: Storage::new(),
            rounds: 0,
        }
    }

    /// The device's identifier.
    pub fn uid(&self) -> DeviceId {
        self.uid
    }

    /// Number of completed rounds.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Named outputs left by the program.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Devices other than this one with a message in the inbox.
    pub fn neighbors(&self) -> impl Iterator<Item = DeviceId> + '_ {
        let me = self.uid;
        self.inbox.keys().copied().filter(move |id| *id != me)
    }

    /// Accept a neighbor's message, replacing its previous one.
    pub fn receive(&mut self, from: DeviceId, message: Message) {
        self.inbox.insert(from, message);
    }

    /// Drop neighbor messages older than `retain` at time `now`.
    ///
    /// Returns how many messages were dropped.
    pub fn expire(&mut self, now: f64, retain: f64) -> usize {
        let me = self.uid;
        let before = self.inbox.len();
        self.inbox.retain(|id, msg| *id == me || msg.lag(now) <= retain);
        let dropped = before - self.inbox.len();
        if dropped > 0 {
            debug!(device = %me, dropped, "expired stale neighbor messages");
        }
        dropped
    }

    /// Drop every neighbor message, keeping the device's own export.
    pub fn forget_neighbors(&mut self) {
        let me = self.uid;
        self.inbox.retain(|id, _| *id == me);
    }

    /// Run one round of `program`.
    ///
    /// The program sees the inbox as it was when the round started. Its
    /// export becomes this device's memory for the next round and is returned
    /// for delivery to neighbors.
    pub fn round<R, F>(
        &mut self,
        clock: RoundClock,
        position: Point,
        world: &dyn NetworkView,
        program: F,
    ) -> (R, Arc<Export>)
    where
        F: FnOnce(&mut Node<'_>) -> R,
    {
        let span = trace_span!("round", device = %self.uid, time = clock.time);
        let _guard = span.enter();

        let mut node = Node::new(
            self.uid,
            clock,
            position,
            &self.inbox,
            &mut self.storage,
            world,
        );
        let result = program(&mut node);
        let export = Arc::new(node.into_export());

        let own = Message::new(Arc::clone(&export), clock.time, 0.0);
        self.inbox.insert(self.uid, own);
        self.rounds += 1;
        (result, export)
    }
}
