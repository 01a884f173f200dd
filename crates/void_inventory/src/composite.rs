//! Composite layout data
//!
//! A composite keeps two orderings of the same slot set. The index order is
//! fixed when the composite is created: children in insertion order, nested
//! composites flattened depth-first (row-major for grids). The priority order
//! is used for fill and drain traversal and is either derived from child
//! priorities or given explicitly.

use crate::arena::{NodeId, SlotId};
use crate::property::PropertyStore;
use std::collections::HashMap;

/// Child of a composite together with what the parent knows about it
#[derive(Debug, Clone)]
pub(crate) struct ChildEntry {
    pub node: NodeId,
    pub priority: i32,
    pub relative: PropertyStore,
}

/// Ordered arrangement of children
#[derive(Debug, Clone, Default)]
pub(crate) struct Composite {
    pub children: Vec<ChildEntry>,
    pub slots: Vec<SlotId>,
    pub index_of: HashMap<SlotId, usize>,
    pub priority: Vec<SlotId>,
}

impl Composite {
    /// Assemble from children, index-ordered slots and priority-ordered slots
    ///
    /// Both slot lists must hold the same set; callers derive them from the
    /// same children.
    pub fn new(children: Vec<ChildEntry>, slots: Vec<SlotId>, priority: Vec<SlotId>) -> Self {
        let index_of = slots.iter().enumerate().map(|(i, slot)| (*slot, i)).collect();
        Self {
            children,
            slots,
            index_of,
            priority,
        }
    }

    /// Position of a direct child
    pub fn position_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|c| c.node == child)
    }

    pub fn child(&self, child: NodeId) -> Option<&ChildEntry> {
        self.children.iter().find(|c| c.node == child)
    }
}

/// Composite laid out on a grid
#[derive(Debug, Clone)]
pub(crate) struct GridInventory {
    pub composite: Composite,
    pub columns: u32,
    pub rows: u32,
    /// Top-left cell of every child, by child position
    pub origins: Vec<(u32, u32)>,
}

impl GridInventory {
    /// Slot at a cell
    pub fn slot_at(&self, x: u32, y: u32) -> Option<SlotId> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.composite.slots.get((y * self.columns + x) as usize).copied()
    }

    /// Cell of a slot
    pub fn position_of(&self, slot: SlotId) -> Option<(u32, u32)> {
        let index = *self.composite.index_of.get(&slot)? as u32;
        Some((index % self.columns, index / self.columns))
    }
}

/// Traverse children by priority, highest first, and flatten their own
/// priority orders; ties keep insertion order
pub(crate) fn priority_order(children: &[(i32, &[SlotId])]) -> Vec<SlotId> {
    let mut order: Vec<usize> = (0..children.len()).collect();
    // sort_by is stable
    order.sort_by(|a, b| children[*b].0.cmp(&children[*a].0));
    order
        .into_iter()
        .flat_map(|i| children[i].1.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: std::ops::Range<u32>) -> Vec<SlotId> {
        range.map(|i| NodeId::new(i, 0)).collect()
    }

    #[test]
    fn test_priority_order_highest_first() {
        let grid = ids(0..3);
        let hotbar = ids(3..5);
        let order = priority_order(&[(1000, &grid), (1050, &hotbar)]);
        assert_eq!(order, vec![hotbar[0], hotbar[1], grid[0], grid[1], grid[2]]);
    }

    #[test]
    fn test_priority_ties_keep_insertion_order() {
        let a = ids(0..1);
        let b = ids(1..2);
        let c = ids(2..3);
        let order = priority_order(&[(1000, &a), (1000, &b), (1000, &c)]);
        assert_eq!(order, vec![a[0], b[0], c[0]]);
    }

    #[test]
    fn test_index_map_is_dense() {
        let slots = ids(0..4);
        let composite = Composite::new(Vec::new(), slots.clone(), slots.clone());
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(composite.index_of[slot], i);
        }
    }

    #[test]
    fn test_grid_cells() {
        let slots = ids(0..6);
        let grid = GridInventory {
            composite: Composite::new(Vec::new(), slots.clone(), slots.clone()),
            columns: 3,
            rows: 2,
            origins: Vec::new(),
        };
        assert_eq!(grid.slot_at(1, 1), Some(slots[4]));
        assert_eq!(grid.position_of(slots[5]), Some((2, 1)));
        assert!(grid.slot_at(3, 0).is_none());
    }
}
