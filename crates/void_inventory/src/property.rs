//! Inventory properties
//!
//! Properties are looked up in three steps: the node's own store, then the
//! parent's relative properties for this child (slot index, grid position,
//! per-position overrides), then structural defaults such as capacity and
//! title.

use crate::equipment::EquipmentType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Key used when a property is stored without an explicit key
pub const DEFAULT_KEY: &str = "";

/// Property type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Display title
    Title,
    /// Number of slots
    Capacity,
    /// Index of a slot inside its parent
    SlotIndex,
    /// Grid position of a child
    SlotPosition,
    /// Equipment typing of a slot
    EquipmentSlot,
    /// Armor typing of a slot
    ArmorSlot,
    /// Plugin-defined property
    Custom(Arc<str>),
}

impl PropertyKind {
    /// Create a plugin-defined property kind
    pub fn custom(name: impl AsRef<str>) -> Self {
        Self::Custom(Arc::from(name.as_ref()))
    }

    /// Structural properties derive from the shape and cannot be overridden
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Capacity | Self::SlotIndex | Self::SlotPosition)
    }
}

/// Property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// Text value
    Text(String),
    /// Grid position
    Position { x: u32, y: u32 },
    /// Equipment category
    Equipment(EquipmentType),
}

impl PropertyValue {
    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get as grid position
    pub fn as_position(&self) -> Option<(u32, u32)> {
        match self {
            Self::Position { x, y } => Some((*x, *y)),
            _ => None,
        }
    }

    /// Get as equipment type
    pub fn as_equipment(&self) -> Option<EquipmentType> {
        match self {
            Self::Equipment(v) => Some(*v),
            _ => None,
        }
    }
}

/// Mapping from property type and key to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    entries: HashMap<PropertyKind, BTreeMap<String, PropertyValue>>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under the default key
    pub fn insert(&mut self, kind: PropertyKind, value: PropertyValue) {
        self.insert_keyed(kind, DEFAULT_KEY, value);
    }

    /// Store a value under an explicit key
    pub fn insert_keyed(&mut self, kind: PropertyKind, key: impl Into<String>, value: PropertyValue) {
        self.entries.entry(kind).or_default().insert(key.into(), value);
    }

    /// Look up a value
    ///
    /// Without a key the default-keyed entry wins, then the lowest key.
    pub fn get(&self, kind: &PropertyKind, key: Option<&str>) -> Option<&PropertyValue> {
        let values = self.entries.get(kind)?;
        match key {
            Some(key) => values.get(key),
            None => values
                .get(DEFAULT_KEY)
                .or_else(|| values.values().next()),
        }
    }

    /// All values of a type, ordered by key
    pub fn get_all(&self, kind: &PropertyKind) -> impl Iterator<Item = &PropertyValue> {
        self.entries.get(kind).into_iter().flat_map(|values| values.values())
    }

    /// Check if any value of this type is stored
    pub fn contains(&self, kind: &PropertyKind) -> bool {
        self.entries.get(kind).map(|v| !v.is_empty()).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|v| v.is_empty())
    }

    /// Overlay another store on top of this one
    pub fn extend(&mut self, other: &PropertyStore) {
        for (kind, values) in &other.entries {
            let target = self.entries.entry(kind.clone()).or_default();
            for (key, value) in values {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_lookup() {
        let mut store = PropertyStore::new();
        store.insert(PropertyKind::Title, PropertyValue::Text("Chest".into()));

        let title = store.get(&PropertyKind::Title, None).and_then(|v| v.as_text());
        assert_eq!(title, Some("Chest"));
        assert!(store.get(&PropertyKind::Title, Some("other")).is_none());
    }

    #[test]
    fn test_keyed_values() {
        let mut store = PropertyStore::new();
        let kind = PropertyKind::custom("tier");
        store.insert_keyed(kind.clone(), "b", PropertyValue::Int(2));
        store.insert_keyed(kind.clone(), "a", PropertyValue::Int(1));

        assert_eq!(store.get(&kind, None), Some(&PropertyValue::Int(1)));
        assert_eq!(store.get(&kind, Some("b")), Some(&PropertyValue::Int(2)));
        assert_eq!(store.get_all(&kind).count(), 2);
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = PropertyStore::new();
        base.insert(PropertyKind::Title, PropertyValue::Text("base".into()));
        let mut over = PropertyStore::new();
        over.insert(PropertyKind::Title, PropertyValue::Text("over".into()));

        base.extend(&over);
        assert_eq!(
            base.get(&PropertyKind::Title, None),
            Some(&PropertyValue::Text("over".into()))
        );
    }
}
