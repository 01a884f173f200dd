//! Registry collaborators
//!
//! Item data, display text and archetypes are owned outside of the
//! inventory core. They are injected through [`InventoryContext`] when a tree
//! is created instead of being looked up from global state.

use crate::archetype::{Archetype, ArchetypeId};
use crate::equipment::EquipmentType;
use crate::error::{InventoryError, Result};
use crate::item::ItemKind;
use crate::slot::SlotFilter;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Predicate over item kinds, turned into a [`SlotFilter`] by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKindPredicate {
    /// Every item
    Any,
    /// One of the listed kinds
    Kinds(Vec<ItemKind>),
    /// Items whose equipment type is included by this one
    Equipment(EquipmentType),
    /// Items carrying a registry tag (e.g. `"fuel"`)
    Tag(String),
}

/// Item registry contract
pub trait ItemRegistry: Send + Sync {
    /// Item-level stack limit, `None` to only use the slot limit
    fn max_stack_size(&self, _kind: &ItemKind) -> Option<u32> {
        None
    }

    /// Equipment category of an item
    fn equipment_type(&self, _kind: &ItemKind) -> Option<EquipmentType> {
        None
    }

    /// Check a registry tag
    fn has_tag(&self, _kind: &ItemKind, _tag: &str) -> bool {
        false
    }

    /// Turn an item predicate into a slot filter
    fn resolve_filter(&self, predicate: &ItemKindPredicate) -> SlotFilter {
        SlotFilter::from_predicate(predicate.clone())
    }
}

/// Display text contract
pub trait Translator: Send + Sync {
    /// Resolve a translation key
    fn translate(&self, key: &str) -> String;
}

#[derive(Debug, Clone, Default)]
struct ItemInfo {
    max_stack: Option<u32>,
    equipment: Option<EquipmentType>,
    tags: HashSet<String>,
}

/// In-memory item registry
#[derive(Debug, Clone, Default)]
pub struct SimpleItemRegistry {
    items: HashMap<ItemKind, ItemInfo>,
}

impl SimpleItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item stack limit
    pub fn with_max_stack(mut self, kind: impl Into<ItemKind>, max_stack: u32) -> Self {
        self.register_max_stack(kind, max_stack);
        self
    }

    /// Register an item equipment type
    pub fn with_equipment(mut self, kind: impl Into<ItemKind>, equipment: EquipmentType) -> Self {
        self.register_equipment(kind, equipment);
        self
    }

    /// Register an item tag
    pub fn with_tag(mut self, kind: impl Into<ItemKind>, tag: impl Into<String>) -> Self {
        self.register_tag(kind, tag);
        self
    }

    pub fn register_max_stack(&mut self, kind: impl Into<ItemKind>, max_stack: u32) {
        self.items.entry(kind.into()).or_default().max_stack = Some(max_stack.max(1));
    }

    pub fn register_equipment(&mut self, kind: impl Into<ItemKind>, equipment: EquipmentType) {
        self.items.entry(kind.into()).or_default().equipment = Some(equipment);
    }

    pub fn register_tag(&mut self, kind: impl Into<ItemKind>, tag: impl Into<String>) {
        self.items.entry(kind.into()).or_default().tags.insert(tag.into());
    }
}

impl ItemRegistry for SimpleItemRegistry {
    fn max_stack_size(&self, kind: &ItemKind) -> Option<u32> {
        self.items.get(kind)?.max_stack
    }

    fn equipment_type(&self, kind: &ItemKind) -> Option<EquipmentType> {
        self.items.get(kind)?.equipment
    }

    fn has_tag(&self, kind: &ItemKind, tag: &str) -> bool {
        self.items
            .get(kind)
            .map(|info| info.tags.contains(tag))
            .unwrap_or(false)
    }
}

/// Translator backed by a key-to-text table, falling back to the key
#[derive(Debug, Clone, Default)]
pub struct KeyTranslator {
    entries: HashMap<String, String>,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a translation
    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }
}

impl Translator for KeyTranslator {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Archetypes addressable by `(namespace, id)`
///
/// Filled once at startup and then shared, so lookups take a read lock.
#[derive(Default)]
pub struct ArchetypeRegistry {
    archetypes: RwLock<HashMap<ArchetypeId, Archetype>>,
}

impl ArchetypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named archetype
    pub fn register(&self, archetype: Archetype) -> Result<()> {
        let id = archetype.id().cloned().ok_or_else(|| InventoryError::InvalidBuilder {
            archetype: archetype.display_id(),
            message: "anonymous archetypes cannot be registered".to_string(),
        })?;

        let mut archetypes = self.archetypes.write();
        if archetypes.contains_key(&id) {
            return Err(InventoryError::DuplicateArchetype(id.to_string()));
        }
        log::debug!("Registered inventory archetype {}", id);
        archetypes.insert(id, archetype);
        Ok(())
    }

    /// Look up an archetype
    pub fn get(&self, id: &ArchetypeId) -> Option<Archetype> {
        self.archetypes.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ArchetypeId) -> bool {
        self.archetypes.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.archetypes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.read().is_empty()
    }

    /// All registered ids
    pub fn ids(&self) -> Vec<ArchetypeId> {
        self.archetypes.read().keys().cloned().collect()
    }
}

/// Collaborators injected into an inventory tree
#[derive(Clone)]
pub struct InventoryContext {
    pub items: Arc<dyn ItemRegistry>,
    pub translator: Arc<dyn Translator>,
    pub archetypes: Arc<ArchetypeRegistry>,
}

impl InventoryContext {
    pub fn new(
        items: Arc<dyn ItemRegistry>,
        translator: Arc<dyn Translator>,
        archetypes: Arc<ArchetypeRegistry>,
    ) -> Self {
        Self {
            items,
            translator,
            archetypes,
        }
    }

    /// Replace the item registry
    pub fn with_items(mut self, items: impl ItemRegistry + 'static) -> Self {
        self.items = Arc::new(items);
        self
    }

    /// Replace the translator
    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// Share an archetype registry
    pub fn with_archetypes(mut self, archetypes: Arc<ArchetypeRegistry>) -> Self {
        self.archetypes = archetypes;
        self
    }
}

impl Default for InventoryContext {
    fn default() -> Self {
        Self {
            items: Arc::new(SimpleItemRegistry::new()),
            translator: Arc::new(KeyTranslator::new()),
            archetypes: Arc::new(ArchetypeRegistry::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeBuilder;

    #[test]
    fn test_simple_registry() {
        let items = SimpleItemRegistry::new()
            .with_max_stack("minecraft:ender_pearl", 16)
            .with_equipment("minecraft:iron_helmet", EquipmentType::Headwear)
            .with_tag("minecraft:coal", "fuel");

        let pearl = ItemKind::new("minecraft:ender_pearl");
        assert_eq!(items.max_stack_size(&pearl), Some(16));
        assert_eq!(
            items.equipment_type(&ItemKind::new("minecraft:iron_helmet")),
            Some(EquipmentType::Headwear)
        );
        assert!(items.has_tag(&ItemKind::new("minecraft:coal"), "fuel"));
        assert!(!items.has_tag(&pearl, "fuel"));
    }

    #[test]
    fn test_translator_fallback() {
        let text = KeyTranslator::new().with_entry("container.chest", "Chest");
        assert_eq!(text.translate("container.chest"), "Chest");
        assert_eq!(text.translate("container.furnace"), "container.furnace");
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = ArchetypeRegistry::new();
        let slot = ArchetypeBuilder::slot().build_archetype("test", "slot").unwrap();

        registry.register(slot.clone()).unwrap();
        let err = registry.register(slot).unwrap_err();
        assert!(matches!(err, InventoryError::DuplicateArchetype(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_anonymous_cannot_register() {
        let registry = ArchetypeRegistry::new();
        let slot = ArchetypeBuilder::slot().build().unwrap();
        assert!(registry.register(slot).is_err());
        assert!(registry.is_empty());
    }
}
