//! Item kinds and stack records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reference to an item type owned by the item registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKind(Arc<str>);

impl ItemKind {
    /// Create a new item kind reference, e.g. `"minecraft:stone"`
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the item id
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque per-stack data (damage, enchantments, custom names...)
///
/// The core never interprets it; two stacks only merge when their data is
/// byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuxData(Arc<[u8]>);

impl Default for AuxData {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl AuxData {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if there is no data attached
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An immutable stack of items
///
/// Quantity is always at least one; "no stack" is `Option::None`.
/// Mutation happens by replacing the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackRecord {
    kind: ItemKind,
    quantity: u32,
    aux: AuxData,
}

impl StackRecord {
    /// Create a new stack; a zero quantity is raised to one
    pub fn new(kind: impl Into<ItemKind>, quantity: u32) -> Self {
        Self {
            kind: kind.into(),
            quantity: quantity.max(1),
            aux: AuxData::default(),
        }
    }

    /// Create a single item
    pub fn single(kind: impl Into<ItemKind>) -> Self {
        Self::new(kind, 1)
    }

    /// Attach opaque data
    pub fn with_aux(mut self, aux: AuxData) -> Self {
        self.aux = aux;
        self
    }

    /// Get the item kind
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Get the quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Get the opaque data
    pub fn aux(&self) -> &AuxData {
        &self.aux
    }

    /// Same record with another quantity, `None` for zero
    pub fn with_quantity(&self, quantity: u32) -> Option<StackRecord> {
        if quantity == 0 {
            return None;
        }
        Some(StackRecord {
            kind: self.kind.clone(),
            quantity,
            aux: self.aux.clone(),
        })
    }

    /// Same record with `extra` more units
    pub(crate) fn grown(&self, extra: u32) -> StackRecord {
        StackRecord {
            quantity: self.quantity.saturating_add(extra),
            ..self.clone()
        }
    }

    /// Split off up to `amount` units
    ///
    /// Returns the taken part and what is left behind.
    pub fn split(&self, amount: u32) -> (Option<StackRecord>, Option<StackRecord>) {
        let taken = amount.min(self.quantity);
        (self.with_quantity(taken), self.with_quantity(self.quantity - taken))
    }

    /// Check if stacks can be merged (same kind and identical data)
    pub fn can_merge(&self, other: &StackRecord) -> bool {
        self.kind == other.kind && self.aux == other.aux
    }

    /// Check if this is the given item kind
    pub fn is(&self, kind: &ItemKind) -> bool {
        &self.kind == kind
    }
}

impl fmt::Display for StackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.quantity, self.kind)
    }
}
