//! Inventory queries
//!
//! Every [`Query`] resolves to one of two primitives. Slot-level queries
//! match slots by contents and are answered by
//! [`InventoryTree::query_slots`]. Child-level queries match nodes by type,
//! property, name or identity and are answered by
//! [`InventoryTree::query_children`]; a matched node is taken whole and not
//! searched further. Several queries passed to one call are OR-combined.

use crate::archetype::ArchetypeId;
use crate::arena::{NodeId, SlotId};
use crate::equipment::EquipmentType;
use crate::inventory::{InventoryTree, NodeKind};
use crate::item::{ItemKind, StackRecord};
use crate::property::{PropertyKind, PropertyValue};
use crate::slot::Slot;
use crate::view::InventoryView;
use std::fmt;
use std::sync::Arc;

/// Search predicate
#[derive(Clone)]
pub enum Query {
    /// Slots holding this item kind
    ByItemKind(ItemKind),
    /// Slots holding exactly this stack
    ByStack(StackRecord),
    /// Slots holding a stack that merges with this one, any amount
    ByStackAny(StackRecord),
    /// Slots whose contents satisfy a predicate
    ByStackMatching(Arc<dyn Fn(&StackRecord) -> bool + Send + Sync>),
    /// Nodes of a variant
    ByChildType(NodeKind),
    /// Nodes with a property value
    ByProperty {
        kind: PropertyKind,
        key: Option<String>,
        value: PropertyValue,
    },
    /// Nodes with this name key
    ByName(String),
    /// One specific node
    ByIdentity(NodeId),
    /// Nodes stamped from an archetype
    ByArchetype(ArchetypeId),
    /// Slots typed for this equipment or a related type
    ByEquipment(EquipmentType),
}

impl Query {
    /// Wrap a stack predicate
    pub fn stack_matching<F>(f: F) -> Self
    where
        F: Fn(&StackRecord) -> bool + Send + Sync + 'static,
    {
        Self::ByStackMatching(Arc::new(f))
    }

    /// Property query under the default key
    pub fn property(kind: PropertyKind, value: PropertyValue) -> Self {
        Self::ByProperty {
            kind,
            key: None,
            value,
        }
    }

    /// Check if this query matches by slot contents
    pub fn is_slot_level(&self) -> bool {
        matches!(
            self,
            Self::ByItemKind(_) | Self::ByStack(_) | Self::ByStackAny(_) | Self::ByStackMatching(_)
        )
    }

    fn matches_stack(&self, stack: &StackRecord) -> bool {
        match self {
            Self::ByItemKind(kind) => stack.is(kind),
            Self::ByStack(expected) => stack == expected,
            Self::ByStackAny(expected) => stack.can_merge(expected),
            Self::ByStackMatching(f) => f(stack),
            _ => false,
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByItemKind(kind) => f.debug_tuple("ByItemKind").field(kind).finish(),
            Self::ByStack(stack) => f.debug_tuple("ByStack").field(stack).finish(),
            Self::ByStackAny(stack) => f.debug_tuple("ByStackAny").field(stack).finish(),
            Self::ByStackMatching(_) => write!(f, "ByStackMatching(..)"),
            Self::ByChildType(kind) => f.debug_tuple("ByChildType").field(kind).finish(),
            Self::ByProperty { kind, key, value } => f
                .debug_struct("ByProperty")
                .field("kind", kind)
                .field("key", key)
                .field("value", value)
                .finish(),
            Self::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            Self::ByIdentity(node) => f.debug_tuple("ByIdentity").field(node).finish(),
            Self::ByArchetype(id) => f.debug_tuple("ByArchetype").field(id).finish(),
            Self::ByEquipment(ty) => f.debug_tuple("ByEquipment").field(ty).finish(),
        }
    }
}

impl InventoryTree {
    /// Search below `node`
    ///
    /// No queries, or no matches, give [`InventoryView::EMPTY`].
    pub fn query(&self, node: NodeId, queries: &[Query]) -> InventoryView {
        if queries.is_empty() {
            return InventoryView::EMPTY;
        }
        if queries.iter().all(Query::is_slot_level) {
            return self.query_slots(node, |_, slot| {
                slot.contents()
                    .map(|stack| queries.iter().any(|q| q.matches_stack(stack)))
                    .unwrap_or(false)
            });
        }
        self.query_children(node, |tree, child| queries.iter().any(|q| tree.matches(child, q)))
    }

    /// Slots of `node` matching a predicate, in fill order
    pub fn query_slots<F>(&self, node: NodeId, predicate: F) -> InventoryView
    where
        F: Fn(SlotId, &Slot) -> bool,
    {
        let slots = self
            .priority_slots(node)
            .iter()
            .copied()
            .filter(|id| self.slot(*id).map(|slot| predicate(*id, slot)).unwrap_or(false))
            .collect();
        InventoryView::new(Vec::new(), slots)
    }

    /// Nodes below `node` matching a predicate, outermost matches only
    pub fn query_children<F>(&self, node: NodeId, predicate: F) -> InventoryView
    where
        F: Fn(&InventoryTree, NodeId) -> bool,
    {
        let mut members = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            if predicate(self, current) {
                members.push(current);
            } else {
                stack.extend(self.children(current).into_iter().rev());
            }
        }

        let slots = members
            .iter()
            .flat_map(|member| self.priority_slots(*member).to_vec())
            .collect();
        InventoryView::new(members, slots)
    }

    /// Check a single node against a query
    ///
    /// Slot-level queries match a node when any of its slots matches.
    pub fn matches(&self, node: NodeId, query: &Query) -> bool {
        if query.is_slot_level() {
            return self
                .slots(node)
                .iter()
                .filter_map(|slot| self.contents(*slot))
                .any(|stack| query.matches_stack(stack));
        }

        match query {
            Query::ByChildType(kind) => self.kind(node) == Some(*kind),
            Query::ByProperty { kind, key, value } => match key {
                Some(key) => self.property(node, kind, Some(key)).as_ref() == Some(value),
                None => self.properties(node, kind).contains(value),
            },
            Query::ByName(name) => self.name(node) == Some(name.as_str()),
            Query::ByIdentity(id) => node == *id,
            Query::ByArchetype(id) => self.archetype(node) == Some(id),
            Query::ByEquipment(ty) => self.equipment_types(node).any(|slot_type| {
                ty.includes(slot_type) || slot_type.includes(*ty)
            }),
            _ => false,
        }
    }

    /// Equipment typing of a node, from either equipment property
    pub fn equipment_types(&self, node: NodeId) -> impl Iterator<Item = EquipmentType> {
        let mut types = self.properties(node, &PropertyKind::EquipmentSlot);
        types.extend(self.properties(node, &PropertyKind::ArmorSlot));
        types.into_iter().filter_map(|v| v.as_equipment())
    }
}
