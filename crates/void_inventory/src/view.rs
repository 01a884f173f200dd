//! Derived inventory views
//!
//! A view is a list of slot handles into a tree. It shares the slots of the
//! nodes it was derived from, so reading and writing through a view reads
//! and writes those nodes. Its index space is its own: position in the list,
//! which follows the fill order of the source.

use crate::arena::{NodeId, SlotId};
use crate::inventory::InventoryTree;
use crate::item::{ItemKind, StackRecord};
use crate::ops::FastOffer;
use crate::query::Query;
use crate::transaction::TransactionResult;
use std::collections::HashSet;

/// Read/write view over slots of a tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InventoryView {
    members: Vec<NodeId>,
    slots: Vec<SlotId>,
}

impl InventoryView {
    /// The empty view; every query without matches returns exactly this
    pub const EMPTY: InventoryView = InventoryView {
        members: Vec::new(),
        slots: Vec::new(),
    };

    /// Build a view, collapsing to [`EMPTY`](Self::EMPTY) without slots
    pub(crate) fn new(members: Vec<NodeId>, slots: Vec<SlotId>) -> Self {
        if slots.is_empty() {
            return Self::EMPTY;
        }
        let mut seen = HashSet::with_capacity(slots.len());
        let slots = slots.into_iter().filter(|s| seen.insert(*s)).collect();
        Self { members, slots }
    }

    /// View over an explicit slot list
    pub fn from_slots(slots: Vec<SlotId>) -> Self {
        Self::new(Vec::new(), slots)
    }

    /// View over a whole node in fill order
    pub fn of(tree: &InventoryTree, node: NodeId) -> Self {
        Self::new(vec![node], tree.priority_slots(node).to_vec())
    }

    /// Matched nodes, empty for slot-level queries
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at a view index
    pub fn slot_at(&self, index: usize) -> Option<SlotId> {
        self.slots.get(index).copied()
    }

    /// View index of a slot
    pub fn index_of(&self, slot: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| *s == slot)
    }

    pub fn contains_slot(&self, slot: SlotId) -> bool {
        self.slots.contains(&slot)
    }

    /// This view followed by the slots of `other` it does not already have
    pub fn union(&self, other: &InventoryView) -> InventoryView {
        let mut members = self.members.clone();
        members.extend(other.members.iter().filter(|m| !self.members.contains(*m)));
        let mut slots = self.slots.clone();
        slots.extend_from_slice(&other.slots);
        Self::new(members, slots)
    }

    /// This view without the given slots
    pub fn without(&self, excluded: &[SlotId]) -> InventoryView {
        let slots = self
            .slots
            .iter()
            .copied()
            .filter(|s| !excluded.contains(s))
            .collect();
        Self::new(self.members.clone(), slots)
    }

    /// Narrow the view to slots matching any of the queries
    pub fn query(&self, tree: &InventoryTree, queries: &[Query]) -> InventoryView {
        if queries.is_empty() {
            return Self::EMPTY;
        }
        let slots = self
            .slots
            .iter()
            .copied()
            .filter(|slot| queries.iter().any(|q| tree.matches(*slot, q)))
            .collect();
        Self::new(Vec::new(), slots)
    }

    pub fn peek(&self, tree: &InventoryTree, limit: Option<u32>) -> Option<StackRecord> {
        tree.plan_poll_in(&self.slots, limit).map(|(stack, _)| stack)
    }

    pub fn poll(&self, tree: &mut InventoryTree, limit: Option<u32>) -> (Option<StackRecord>, TransactionResult) {
        tree.poll_in(&self.slots, limit)
    }

    pub fn offer_fast(&self, tree: &mut InventoryTree, stack: &StackRecord) -> FastOffer {
        tree.offer_in(&self.slots, stack)
    }

    pub fn offer(&self, tree: &mut InventoryTree, stack: &StackRecord) -> TransactionResult {
        self.offer_fast(tree, stack).into()
    }

    /// Replace the contents of the slot at a view index
    pub fn set_at(&self, tree: &mut InventoryTree, index: usize, stack: Option<StackRecord>) -> TransactionResult {
        match self.slot_at(index) {
            Some(slot) => tree.set(slot, stack),
            None => TransactionResult::failure(stack),
        }
    }

    /// Number of units of an item kind
    pub fn count(&self, tree: &InventoryTree, kind: &ItemKind) -> u64 {
        self.slots
            .iter()
            .filter_map(|slot| tree.contents(*slot))
            .filter(|c| c.is(kind))
            .map(|c| c.quantity() as u64)
            .sum()
    }
}
