//! Transaction results
//!
//! Every mutating call reports which slots changed, in the order the
//! changes were committed. Each slot step is committed on its own; a
//! multi-slot operation is not atomic, so it is reported as
//! [`Outcome::PartialSuccess`] and can be rolled back with
//! [`InventoryTree::revert`](crate::inventory::InventoryTree::revert).

use crate::arena::SlotId;
use crate::item::StackRecord;
use serde::{Deserialize, Serialize};

/// Overall outcome of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Fully applied in at most one slot step
    Success,
    /// Some change was committed, but either units were rejected or the
    /// change spans several independently committed slots
    PartialSuccess,
    /// Nothing changed
    Failure,
}

/// Change of one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTransaction {
    pub slot: SlotId,
    pub before: Option<StackRecord>,
    pub after: Option<StackRecord>,
}

/// Result of a mutating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    outcome: Outcome,
    changes: Vec<SlotTransaction>,
    rejected: Option<StackRecord>,
}

impl TransactionResult {
    /// Nothing changed, the whole stack (if any) is handed back
    pub fn failure(rejected: Option<StackRecord>) -> Self {
        Self {
            outcome: Outcome::Failure,
            changes: Vec::new(),
            rejected,
        }
    }

    /// Nothing needed to change
    pub fn no_op() -> Self {
        Self {
            outcome: Outcome::Success,
            changes: Vec::new(),
            rejected: None,
        }
    }

    /// Derive the outcome from the committed changes and the remainder
    pub fn from_changes(changes: Vec<SlotTransaction>, rejected: Option<StackRecord>) -> Self {
        let outcome = match (changes.len(), rejected.is_some()) {
            (0, true) => Outcome::Failure,
            (0, false) | (1, false) => Outcome::Success,
            _ => Outcome::PartialSuccess,
        };
        Self {
            outcome,
            changes,
            rejected,
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Committed changes in operation order
    pub fn changes(&self) -> &[SlotTransaction] {
        &self.changes
    }

    /// Units that were not accepted
    pub fn rejected(&self) -> Option<&StackRecord> {
        self.rejected.as_ref()
    }

    /// Check if nothing changed
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }

    /// Check if the whole request was applied, whether in one step or many
    pub fn is_complete(&self) -> bool {
        self.outcome != Outcome::Failure && self.rejected.is_none()
    }

    /// Slots touched, in order
    pub fn touched(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.changes.iter().map(|c| c.slot)
    }
}
