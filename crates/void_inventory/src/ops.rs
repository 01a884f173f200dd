//! Peek, poll, offer and set
//!
//! Every operation first plans its slot steps without touching the tree and
//! then commits them one by one. Each commit is atomic for its slot,
//! notifies listeners and pushes deltas to viewers before the next step.

use crate::arena::{NodeId, SlotId};
use crate::inventory::{InventoryTree, Node};
use crate::item::{ItemKind, StackRecord};
use crate::transaction::{SlotTransaction, TransactionResult};

/// Outcome of [`InventoryTree::offer_fast`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastOffer {
    changes: Vec<SlotTransaction>,
    rejected: Option<StackRecord>,
}

impl FastOffer {
    /// Units nothing accepted
    pub fn rejected(&self) -> Option<&StackRecord> {
        self.rejected.as_ref()
    }

    /// Check if the whole stack was absorbed
    pub fn is_success(&self) -> bool {
        self.rejected.is_none()
    }

    pub fn changes(&self) -> &[SlotTransaction] {
        &self.changes
    }
}

impl From<FastOffer> for TransactionResult {
    fn from(offer: FastOffer) -> Self {
        TransactionResult::from_changes(offer.changes, offer.rejected)
    }
}

/// Planned poll: the gathered stack and what stays in each drained slot
type PollPlan = (StackRecord, Vec<(SlotId, Option<StackRecord>)>);

impl InventoryTree {
    /// Commit new contents into a slot
    ///
    /// Returns `None` when nothing changed.
    pub(crate) fn commit(&mut self, slot: SlotId, after: Option<StackRecord>) -> Option<SlotTransaction> {
        let entry = self.nodes.get_mut(slot)?;
        let Node::Slot(target) = &mut entry.node else {
            return None;
        };
        if target.contents() == after.as_ref() {
            return None;
        }

        let before = target.replace(after.clone());
        self.notify_slot_change(slot, &before, &after);
        self.sync_slot(slot);
        Some(SlotTransaction { slot, before, after })
    }

    fn stale(&self, node: NodeId, operation: &str) -> bool {
        if self.contains_node(node) {
            return false;
        }
        log::warn!("Inventory {} on stale node {}", operation, node);
        true
    }

    /// Plan an offer over slots in the given order
    ///
    /// Stacks that can be merged into are filled first, empty slots second.
    pub(crate) fn plan_offer_in(&self, order: &[SlotId], stack: &StackRecord) -> (Vec<(SlotId, StackRecord)>, Option<StackRecord>) {
        let items = self.items();
        let mut plan: Vec<(SlotId, StackRecord)> = Vec::new();
        let mut remaining = Some(stack.clone());

        for merge_pass in [true, false] {
            for slot_id in order {
                let Some(rest) = remaining.take() else {
                    break;
                };
                let eligible = match self.slot(*slot_id) {
                    Some(slot) if merge_pass => slot.contents().map(|c| c.can_merge(&rest)).unwrap_or(false),
                    Some(slot) => slot.is_empty() && !plan.iter().any(|(id, _)| id == slot_id),
                    None => false,
                };
                let step = match self.slot(*slot_id) {
                    Some(slot) if eligible => slot.plan_offer(&rest, items),
                    _ => None,
                };
                match step {
                    Some(step) => {
                        if let Some(after) = step.after {
                            plan.push((*slot_id, after));
                        }
                        remaining = step.rejected;
                    }
                    None => remaining = Some(rest),
                }
            }
        }
        (plan, remaining)
    }

    pub(crate) fn offer_in(&mut self, order: &[SlotId], stack: &StackRecord) -> FastOffer {
        let (plan, rejected) = self.plan_offer_in(order, stack);
        let changes = plan
            .into_iter()
            .filter_map(|(slot, after)| self.commit(slot, Some(after)))
            .collect();
        FastOffer { changes, rejected }
    }

    /// Plan a poll over slots in the given order
    ///
    /// The first non-empty slot decides the item; later slots contribute
    /// only mergeable units. Without a limit only that first slot is taken.
    pub(crate) fn plan_poll_in(&self, order: &[SlotId], limit: Option<u32>) -> Option<PollPlan> {
        let mut taken: Option<StackRecord> = None;
        let mut plan = Vec::new();
        let mut budget = limit;

        for slot_id in order {
            if budget == Some(0) {
                break;
            }
            let Some(slot) = self.slot(*slot_id) else {
                continue;
            };
            let Some(contents) = slot.contents() else {
                continue;
            };
            if let Some(first) = &taken {
                if !first.can_merge(contents) {
                    continue;
                }
            }

            let Some((part, left)) = slot.plan_poll(budget) else {
                continue;
            };
            // without a limit the first stack found sets the amount
            budget = Some(budget.unwrap_or(part.quantity()) - part.quantity());
            taken = Some(match taken {
                Some(gathered) => gathered.grown(part.quantity()),
                None => part,
            });
            plan.push((*slot_id, left));
        }
        taken.map(|stack| (stack, plan))
    }

    pub(crate) fn poll_in(&mut self, order: &[SlotId], limit: Option<u32>) -> (Option<StackRecord>, TransactionResult) {
        let Some((stack, plan)) = self.plan_poll_in(order, limit) else {
            return (None, TransactionResult::failure(None));
        };
        let changes = plan
            .into_iter()
            .filter_map(|(slot, left)| self.commit(slot, left))
            .collect();
        (Some(stack), TransactionResult::from_changes(changes, None))
    }

    /// Copy of what [`poll`](Self::poll) would take
    pub fn peek(&self, node: NodeId, limit: Option<u32>) -> Option<StackRecord> {
        self.plan_poll_in(self.priority_slots(node), limit)
            .map(|(stack, _)| stack)
    }

    /// Remove up to `limit` units in priority order
    pub fn poll(&mut self, node: NodeId, limit: Option<u32>) -> (Option<StackRecord>, TransactionResult) {
        if self.stale(node, "poll") {
            return (None, TransactionResult::failure(None));
        }
        let order = self.priority_slots(node).to_vec();
        self.poll_in(&order, limit)
    }

    /// Offer a stack, filling slots in priority order
    pub fn offer_fast(&mut self, node: NodeId, stack: &StackRecord) -> FastOffer {
        if self.stale(node, "offer") {
            return FastOffer {
                changes: Vec::new(),
                rejected: Some(stack.clone()),
            };
        }
        let order = self.priority_slots(node).to_vec();
        self.offer_in(&order, stack)
    }

    /// Offer a stack and report every slot step
    pub fn offer(&mut self, node: NodeId, stack: &StackRecord) -> TransactionResult {
        self.offer_fast(node, stack).into()
    }

    /// Replace the contents of a slot
    ///
    /// The filter still applies; a refused stack fails without any change.
    /// Units above the stack limit are rejected.
    pub fn set(&mut self, slot: SlotId, stack: Option<StackRecord>) -> TransactionResult {
        if self.stale(slot, "set") {
            return TransactionResult::failure(stack);
        }
        let Some(target) = self.slot(slot) else {
            return TransactionResult::failure(stack);
        };

        let (after, rejected) = match stack {
            None => (None, None),
            Some(stack) => match target.plan_set(&stack, self.items()) {
                Some(step) => (step.after, step.rejected),
                None => return TransactionResult::failure(Some(stack)),
            },
        };
        let changes = self.commit(slot, after).into_iter().collect();
        TransactionResult::from_changes(changes, rejected)
    }

    /// Replace the contents of the slot at an index of `node`
    pub fn set_at(&mut self, node: NodeId, index: usize, stack: Option<StackRecord>) -> TransactionResult {
        match self.slot_at(node, index) {
            Some(slot) => self.set(slot, stack),
            None => TransactionResult::failure(stack),
        }
    }

    /// Empty every slot of `node`
    pub fn clear(&mut self, node: NodeId) -> TransactionResult {
        let slots = self.slots(node).to_vec();
        let changes = slots
            .into_iter()
            .filter_map(|slot| self.commit(slot, None))
            .collect();
        TransactionResult::from_changes(changes, None)
    }

    /// Undo the changes of a transaction, last change first
    ///
    /// Slots that were removed in the meantime are skipped.
    pub fn revert(&mut self, result: &TransactionResult) -> TransactionResult {
        let changes = result
            .changes()
            .iter()
            .rev()
            .filter_map(|change| self.commit(change.slot, change.before.clone()))
            .collect();
        TransactionResult::from_changes(changes, None)
    }

    /// Check if any slot holds the item kind
    pub fn contains(&self, node: NodeId, kind: &ItemKind) -> bool {
        self.slots(node)
            .iter()
            .any(|slot| self.contents(*slot).map(|c| c.is(kind)).unwrap_or(false))
    }

    /// Number of units of an item kind
    pub fn count(&self, node: NodeId, kind: &ItemKind) -> u64 {
        self.slots(node)
            .iter()
            .filter_map(|slot| self.contents(*slot))
            .filter(|c| c.is(kind))
            .map(|c| c.quantity() as u64)
            .sum()
    }

    /// Check if any slot would accept the stack by filter
    pub fn is_valid_item(&self, node: NodeId, stack: &StackRecord) -> bool {
        let items = self.items();
        self.slots(node)
            .iter()
            .filter_map(|slot| self.slot(*slot))
            .any(|slot| slot.accepts(stack, items))
    }
}
