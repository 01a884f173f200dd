//! Generational node storage
//!
//! Every inventory node lives in one arena owned by the
//! [`InventoryTree`](crate::inventory::InventoryTree). Parent links are plain
//! [`NodeId`]s into the arena, so the whole tree is dropped as a unit and a
//! stale handle is detected by its generation instead of dangling.

use std::fmt;

/// Handle to a node stored in an inventory arena
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Slots are nodes; the alias marks where a slot handle is expected
pub type SlotId = NodeId;

impl NodeId {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the raw index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Entry<T> {
    value: Option<T>,
    generation: u32,
}

/// Generational arena keyed by [`NodeId`]
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Insert a value and get its handle
    pub fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index as usize];
            entry.value = Some(value);
            NodeId::new(index, entry.generation)
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                value: Some(value),
                generation: 0,
            });
            NodeId::new(index, 0)
        }
    }

    /// Insert a value that needs to know its own handle
    pub fn insert_with(&mut self, f: impl FnOnce(NodeId) -> T) -> NodeId {
        let id = match self.free_list.last() {
            Some(&index) => NodeId::new(index, self.entries[index as usize].generation),
            None => NodeId::new(self.entries.len() as u32, 0),
        };
        let inserted = self.insert(f(id));
        debug_assert_eq!(inserted, id);
        inserted
    }

    /// Remove a value; the handle and every copy of it become stale
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation || entry.value.is_none() {
            return None;
        }

        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        entry.value.take()
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.value.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.value.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
