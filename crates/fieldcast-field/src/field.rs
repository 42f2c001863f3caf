//! Neighbor fields.
//!
//! A field maps every device in a neighborhood (the local device included)
//! to a value. Fields are plain ordered maps: "arithmetic on fields" is
//! always spelled out element-wise through [`Field::map`] and
//! [`Field::zip_with`], and reductions through [`Field::fold`].
//!
//! Iteration follows device id order, so folds are reproducible. Results
//! are order-independent only when the folding operator is associative and
//! commutative.

use std::collections::BTreeMap;

use crate::DeviceId;

/// A mapping from device id to a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    entries: BTreeMap<DeviceId, T>,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Field<T> {
    /// Create an empty field.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Set the value for a device, returning the previous one.
    pub fn insert(&mut self, id: DeviceId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    /// Value for a device, if it is in the domain.
    pub fn get(&self, id: DeviceId) -> Option<&T> {
        self.entries.get(&id)
    }

    /// Value for a device, or `default` when absent.
    pub fn get_or<'a>(&'a self, id: DeviceId, default: &'a T) -> &'a T {
        self.entries.get(&id).unwrap_or(default)
    }

    /// Whether a device is in the domain.
    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of devices in the domain.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Devices in the domain, in id order.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.entries.keys().copied()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &T)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    /// Apply `f` to every entry.
    pub fn map<U, F>(&self, mut f: F) -> Field<U>
    where
        F: FnMut(DeviceId, &T) -> U,
    {
        Field {
            entries: self.entries.iter().map(|(id, v)| (*id, f(*id, v))).collect(),
        }
    }

    /// Combine two fields entry by entry over the intersection of their domains.
    pub fn zip_with<U, V, F>(&self, other: &Field<U>, mut f: F) -> Field<V>
    where
        F: FnMut(DeviceId, &T, &U) -> V,
    {
        Field {
            entries: self
                .entries
                .iter()
                .filter_map(|(id, a)| other.entries.get(id).map(|b| (*id, f(*id, a, b))))
                .collect(),
        }
    }

    /// Reduce every entry into an accumulator.
    pub fn fold<A, F>(&self, seed: A, mut f: F) -> A
    where
        F: FnMut(A, DeviceId, &T) -> A,
    {
        self.entries.iter().fold(seed, |acc, (id, v)| f(acc, *id, v))
    }

    /// Reduce every entry except `skip` (usually the local device).
    pub fn fold_except<A, F>(&self, skip: DeviceId, seed: A, mut f: F) -> A
    where
        F: FnMut(A, DeviceId, &T) -> A,
    {
        self.entries
            .iter()
            .filter(|(id, _)| **id != skip)
            .fold(seed, |acc, (id, v)| f(acc, *id, v))
    }
}

impl<T> FromIterator<(DeviceId, T)> for Field<T> {
    fn from_iter<I: IntoIterator<Item = (DeviceId, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Field<T> {
    type Item = (DeviceId, T);
    type IntoIter = std::collections::btree_map::IntoIter<DeviceId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
