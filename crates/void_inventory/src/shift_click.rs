//! Shift-click (quick move) resolution
//!
//! A [`ShiftClickBehavior`] picks the target view for the stack in a slot of
//! a container. The move itself is always the same: the stack is offered
//! into the target in view order and whatever does not fit stays in the
//! source slot. The behavior bound to the container's top inventory is used,
//! falling back to [`DefaultShiftClick`].

use crate::archetype::ArchetypeId;
use crate::arena::{NodeId, SlotId};
use crate::error::Result;
use crate::inventory::InventoryTree;
use crate::query::Query;
use crate::transaction::TransactionResult;
use crate::view::InventoryView;
use std::sync::Arc;

/// Strategy choosing where a shift-clicked stack goes
pub trait ShiftClickBehavior: Send + Sync {
    /// Target for the stack in `slot` of `container`
    fn target(&self, tree: &InventoryTree, container: NodeId, slot: SlotId) -> InventoryView;
}

/// Move between top and bottom, or within a resident container away from
/// the slot's own parent
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShiftClick;

impl DefaultShiftClick {
    pub fn target_of(tree: &InventoryTree, container: NodeId, slot: SlotId) -> InventoryView {
        let (Some(top), Some(bottom)) = (tree.top(container), tree.bottom(container)) else {
            return InventoryView::EMPTY;
        };

        if top != bottom {
            let other = if tree.is_within(top, slot) { bottom } else { top };
            return InventoryView::of(tree, other);
        }

        let group = tree.parent(slot).unwrap_or(slot);
        let excluded: Vec<SlotId> = if group == top {
            vec![slot]
        } else {
            tree.slots(group).to_vec()
        };
        InventoryView::of(tree, container).without(&excluded)
    }
}

impl ShiftClickBehavior for DefaultShiftClick {
    fn target(&self, tree: &InventoryTree, container: NodeId, slot: SlotId) -> InventoryView {
        Self::target_of(tree, container, slot)
    }
}

/// Player inventory behavior
///
/// A stack moved out of the main inventory goes to matching equipment slots
/// first, in the order the equipment inventories are declared, then to the
/// default target.
#[derive(Debug, Clone)]
pub struct PlayerShiftClick {
    main: ArchetypeId,
    equipment: Vec<ArchetypeId>,
}

impl PlayerShiftClick {
    pub fn new(main: ArchetypeId, equipment: Vec<ArchetypeId>) -> Self {
        Self { main, equipment }
    }

    fn equipment_target(&self, tree: &InventoryTree, container: NodeId, slot: SlotId) -> InventoryView {
        let Some(stack) = tree.contents(slot) else {
            return InventoryView::EMPTY;
        };
        let Some(item_type) = tree.context().items.equipment_type(stack.kind()) else {
            return InventoryView::EMPTY;
        };

        let matching: Vec<SlotId> = self
            .equipment
            .iter()
            .flat_map(|id| tree.query(container, &[Query::ByArchetype(id.clone())]).slots().to_vec())
            .filter(|candidate| {
                tree.equipment_types(*candidate)
                    .any(|slot_type| slot_type.includes(item_type))
            })
            .collect();
        InventoryView::from_slots(matching)
    }
}

impl ShiftClickBehavior for PlayerShiftClick {
    fn target(&self, tree: &InventoryTree, container: NodeId, slot: SlotId) -> InventoryView {
        let fallback = DefaultShiftClick::target_of(tree, container, slot);
        let in_main = tree
            .query(container, &[Query::ByArchetype(self.main.clone())])
            .contains_slot(slot);
        if !in_main {
            return fallback;
        }
        self.equipment_target(tree, container, slot).union(&fallback)
    }
}

impl InventoryTree {
    /// Move the stack in `slot` to the target chosen for `container`
    ///
    /// Fails without changes if the slot is empty, not bound by the
    /// container, or nothing in the target accepts the stack.
    pub fn shift_click(&mut self, container: NodeId, slot: SlotId) -> Result<TransactionResult> {
        let (top, bound) = {
            let c = self.container_node(container)?;
            (c.top, c.binds(slot) && slot != c.cursor)
        };
        if !bound {
            return Ok(TransactionResult::failure(None));
        }
        let Some(stack) = self.contents(slot).cloned() else {
            return Ok(TransactionResult::failure(None));
        };

        let behavior: Arc<dyn ShiftClickBehavior> = match self.entry(top).and_then(|e| e.shift_click.clone()) {
            Some(behavior) => behavior,
            None => Arc::new(DefaultShiftClick),
        };
        let target = behavior.target(self, container, slot).without(&[slot]);

        let (plan, remainder) = self.plan_offer_in(target.slots(), &stack);
        if plan.is_empty() {
            return Ok(TransactionResult::failure(None));
        }

        let mut changes = Vec::with_capacity(plan.len() + 1);
        changes.extend(self.commit(slot, remainder));
        for (target_slot, after) in plan {
            changes.extend(self.commit(target_slot, Some(after)));
        }
        Ok(TransactionResult::from_changes(changes, None))
    }
}
