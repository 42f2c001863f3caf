//! Published round state.
//!
//! An [`Export`] holds every channel a device wrote during one round. Once
//! the round completes the export is frozen behind an `Arc` and handed to
//! neighbors as a [`Message`]; a device never observes an export that is
//! still being computed.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::trace::ChannelKey;

/// Values that can travel on a channel.
pub trait Exportable: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Exportable for T {}

/// Channel values written by one device during one round.
#[derive(Debug, Clone, Default)]
pub struct Export {
    values: HashMap<ChannelKey, Arc<dyn Any + Send + Sync>>,
}

impl Export {
    /// Create an empty export.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Write a channel, replacing any earlier value.
    pub fn insert<T: Exportable>(&mut self, key: ChannelKey, value: T) {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        self.values.insert(key, value);
    }

    /// Read a channel.
    ///
    /// A value of a different type is treated as absent.
    pub fn get<T: Exportable>(&self, key: ChannelKey) -> Option<&T> {
        let value = self.values.get(&key)?;
        let typed = (**value).downcast_ref::<T>();
        if typed.is_none() {
            warn!(
                channel = key.0,
                expected = std::any::type_name::<T>(),
                "channel holds a value of another type"
            );
        }
        typed
    }

    /// Whether a channel was written.
    pub fn contains(&self, key: ChannelKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Number of channels written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An export as received by a device.
#[derive(Debug, Clone)]
pub struct Message {
    /// The sender's frozen export
    pub export: Arc<Export>,
    /// Sender's round time when the export was published
    pub sent_at: f64,
    /// Physical distance between sender and receiver at delivery
    pub distance: f64,
}

impl Message {
    /// Wrap an export published at `sent_at`.
    pub fn new(export: Arc<Export>, sent_at: f64, distance: f64) -> Self {
        Self {
            export,
            sent_at,
            distance,
        }
    }

    /// Time elapsed since publication, as seen at `now`.
    pub fn lag(&self, now: f64) -> f64 {
        now - self.sent_at
    }
}
