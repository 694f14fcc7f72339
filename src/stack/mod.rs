//! Layer-ordered window stack
//!
//! This module provides the `ViewStack` data structure holding every live
//! window controller. Entries are stored bottom to top. Insertion keeps the
//! stack sorted by layer: a new entry is placed above every entry of its
//! own or a lower layer and below every entry of a higher layer, so equal
//! layers keep their insertion order.

use std::collections::HashMap;

use crate::layer::Layer;

/// What the stack needs to know about an entry
pub trait StackEntry {
    fn control_key(&self) -> &str;
    fn layer(&self) -> Layer;
}

/// Ordered entries with at most one slot per control key.
///
/// # Examples
///
/// ```
/// use viewstack::layer::Layer;
/// use viewstack::stack::{StackEntry, ViewStack};
///
/// struct Entry(&'static str, Layer);
///
/// impl StackEntry for Entry {
///     fn control_key(&self) -> &str { self.0 }
///     fn layer(&self) -> Layer { self.1 }
/// }
///
/// let mut stack = ViewStack::new();
/// stack.push(Entry("dialog", Layer::Dialog));
/// stack.push(Entry("hud", Layer::Main));
///
/// assert_eq!(stack.keys(), vec!["hud", "dialog"]);
/// ```
#[derive(Debug, Clone)]
pub struct ViewStack<T> {
    /// Entries ordered from bottom to top
    entries: Vec<T>,

    /// Fast lookup: control key → position in stack
    positions: HashMap<String, usize>,
}

impl<T: StackEntry> ViewStack<T> {
    /// Creates a new empty stack.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Creates a stack with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts an entry at the top of its layer band.
    ///
    /// # Returns
    ///
    /// `Some(position)` where the entry landed, or `None` (and the entry is
    /// dropped) if its control key is already present
    pub fn push(&mut self, entry: T) -> Option<usize> {
        if self.positions.contains_key(entry.control_key()) {
            return None;
        }

        let layer = entry.layer();
        let mut position = self.entries.len();
        while position > 0 && self.entries[position - 1].layer() > layer {
            position -= 1;
        }

        self.entries.insert(position, entry);
        self.rebuild_positions();
        Some(position)
    }

    /// Removes an entry by control key.
    pub fn remove(&mut self, control_key: &str) -> Option<T> {
        let pos = self.positions.remove(control_key)?;
        let entry = self.entries.remove(pos);
        self.rebuild_positions();
        Some(entry)
    }

    /// Moves an entry to the most recent position of its layer band.
    ///
    /// # Returns
    ///
    /// The new position, or `None` if the key wasn't in the stack
    pub fn reinsert(&mut self, control_key: &str) -> Option<usize> {
        let entry = self.remove(control_key)?;
        self.push(entry)
    }

    pub fn get(&self, control_key: &str) -> Option<&T> {
        self.positions
            .get(control_key)
            .map(|&pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, control_key: &str) -> Option<&mut T> {
        match self.positions.get(control_key) {
            Some(&pos) => self.entries.get_mut(pos),
            None => None,
        }
    }

    /// Entry at a position; out-of-range returns `None`
    pub fn at(&self, position: usize) -> Option<&T> {
        self.entries.get(position)
    }

    pub fn at_mut(&mut self, position: usize) -> Option<&mut T> {
        self.entries.get_mut(position)
    }

    /// Position 0 is the bottom-most entry, and `len() - 1` the top-most.
    pub fn position(&self, control_key: &str) -> Option<usize> {
        self.positions.get(control_key).copied()
    }

    pub fn contains(&self, control_key: &str) -> bool {
        self.positions.contains_key(control_key)
    }

    /// Returns an iterator over entries in bottom-to-top order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// Positions of a layer's entries, top-most first
    pub fn layer_positions(&self, layer: Layer) -> Vec<usize> {
        (0..self.entries.len())
            .rev()
            .filter(|&pos| self.entries[pos].layer() == layer)
            .collect()
    }

    /// Control keys in bottom-to-top order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(StackEntry::control_key).collect()
    }

    pub fn top(&self) -> Option<&T> {
        self.entries.last()
    }

    pub fn bottom(&self) -> Option<&T> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuilds the position lookup map.
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.positions.insert(entry.control_key().to_string(), i);
        }
    }
}

impl<T: StackEntry> Default for ViewStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
