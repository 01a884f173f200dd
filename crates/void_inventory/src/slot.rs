//! Slots, the leaf inventories
//!
//! A slot holds at most one [`StackRecord`]. The functions here only compute
//! what a mutation would do; committing the change and notifying listeners
//! and viewers is done by the owning tree.

use crate::equipment::EquipmentType;
use crate::item::{ItemKind, StackRecord};
use crate::registry::{ItemKindPredicate, ItemRegistry};
use std::fmt;
use std::sync::Arc;

/// Predicate deciding which stacks a slot accepts
#[derive(Clone)]
pub enum SlotFilter {
    /// Accept everything
    Any,
    /// Accept only the listed kinds
    Kinds(Arc<[ItemKind]>),
    /// Accept items whose equipment type is included by this one
    Equipment(EquipmentType),
    /// Accept items with a registry tag
    Tag(Arc<str>),
    /// Arbitrary predicate
    Custom(Arc<dyn Fn(&StackRecord) -> bool + Send + Sync>),
}

impl SlotFilter {
    /// Wrap a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&StackRecord) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Default mapping from an item predicate
    pub fn from_predicate(predicate: ItemKindPredicate) -> Self {
        match predicate {
            ItemKindPredicate::Any => Self::Any,
            ItemKindPredicate::Kinds(kinds) => Self::Kinds(kinds.into()),
            ItemKindPredicate::Equipment(ty) => Self::Equipment(ty),
            ItemKindPredicate::Tag(tag) => Self::Tag(tag.into()),
        }
    }

    /// Check a stack against this filter
    pub fn test(&self, stack: &StackRecord, items: &dyn ItemRegistry) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.iter().any(|k| stack.is(k)),
            Self::Equipment(slot_type) => items
                .equipment_type(stack.kind())
                .map(|item_type| slot_type.includes(item_type))
                .unwrap_or(false),
            Self::Tag(tag) => items.has_tag(stack.kind(), tag),
            Self::Custom(f) => f(stack),
        }
    }
}

impl Default for SlotFilter {
    fn default() -> Self {
        Self::Any
    }
}

impl fmt::Debug for SlotFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Kinds(kinds) => f.debug_tuple("Kinds").field(kinds).finish(),
            Self::Equipment(ty) => f.debug_tuple("Equipment").field(ty).finish(),
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// What a single-slot mutation would leave behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotStep {
    /// Contents after the step
    pub after: Option<StackRecord>,
    /// Units that did not fit
    pub rejected: Option<StackRecord>,
}

/// A slot
#[derive(Debug, Clone)]
pub struct Slot {
    contents: Option<StackRecord>,
    filter: SlotFilter,
    max_stack_size: u32,
}

impl Slot {
    /// Create an empty slot
    pub fn new(filter: SlotFilter, max_stack_size: u32) -> Self {
        Self {
            contents: None,
            filter,
            max_stack_size: max_stack_size.max(1),
        }
    }

    /// Current contents
    pub fn contents(&self) -> Option<&StackRecord> {
        self.contents.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }

    pub fn filter(&self) -> &SlotFilter {
        &self.filter
    }

    /// Slot stack limit
    pub fn max_stack_size(&self) -> u32 {
        self.max_stack_size
    }

    pub(crate) fn replace(&mut self, contents: Option<StackRecord>) -> Option<StackRecord> {
        std::mem::replace(&mut self.contents, contents)
    }

    /// Stack limit for a specific stack: the smaller of slot and item limits
    pub fn max_stack_for(&self, stack: &StackRecord, items: &dyn ItemRegistry) -> u32 {
        items
            .max_stack_size(stack.kind())
            .map(|max| max.min(self.max_stack_size))
            .unwrap_or(self.max_stack_size)
            .max(1)
    }

    /// Check the filter
    pub fn accepts(&self, stack: &StackRecord, items: &dyn ItemRegistry) -> bool {
        self.filter.test(stack, items)
    }

    /// Copy of up to `limit` units without removing them
    pub fn peek(&self, limit: Option<u32>) -> Option<StackRecord> {
        let contents = self.contents.as_ref()?;
        match limit {
            Some(limit) => contents.split(limit).0,
            None => Some(contents.clone()),
        }
    }

    /// Split the contents into the polled part and what stays
    pub(crate) fn plan_poll(&self, limit: Option<u32>) -> Option<(StackRecord, Option<StackRecord>)> {
        let contents = self.contents.as_ref()?;
        let (taken, left) = contents.split(limit.unwrap_or(u32::MAX));
        taken.map(|taken| (taken, left))
    }

    /// Merge a stack into the current contents
    ///
    /// `None` means nothing would be accepted.
    pub(crate) fn plan_offer(&self, stack: &StackRecord, items: &dyn ItemRegistry) -> Option<SlotStep> {
        if !self.accepts(stack, items) {
            return None;
        }

        let max = self.max_stack_for(stack, items);
        let current = match &self.contents {
            Some(existing) if existing.can_merge(stack) => existing.quantity(),
            Some(_) => return None,
            None => 0,
        };
        if current >= max {
            return None;
        }

        let accepted = stack.quantity().min(max - current);
        Some(SlotStep {
            after: stack.with_quantity(current + accepted),
            rejected: stack.with_quantity(stack.quantity() - accepted),
        })
    }

    /// Replace the contents, capped at the stack limit
    ///
    /// `None` means the filter refused the stack.
    pub(crate) fn plan_set(&self, stack: &StackRecord, items: &dyn ItemRegistry) -> Option<SlotStep> {
        if !self.accepts(stack, items) {
            return None;
        }

        let max = self.max_stack_for(stack, items);
        let kept = stack.quantity().min(max);
        Some(SlotStep {
            after: stack.with_quantity(kept),
            rejected: stack.with_quantity(stack.quantity() - kept),
        })
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new(SlotFilter::Any, 64)
    }
}
