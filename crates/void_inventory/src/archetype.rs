//! Archetypes and the archetype builder
//!
//! An [`Archetype`] is a frozen template describing an inventory shape. It is
//! validated once when it is built and can then be stamped out any number of
//! times with [`InventoryTree::instantiate`](crate::inventory::InventoryTree::instantiate).
//! Archetypes share their data, so cloning one or extending it through
//! [`Archetype::to_builder`] is cheap.
//!
//! # Example
//!
//! ```ignore
//! let slot = ArchetypeBuilder::slot().build_archetype("void", "slot")?;
//!
//! let mut hotbar = ArchetypeBuilder::ordered();
//! for _ in 0..9 {
//!     hotbar = hotbar.add(&slot);
//! }
//! let hotbar = hotbar.build_archetype("void", "hotbar")?;
//!
//! let main = ArchetypeBuilder::rows(9)
//!     .grid_at(0, &main_grid, DEFAULT_PRIORITY)
//!     .row(3, &hotbar, 1050)
//!     .build_archetype("void", "main")?;
//! ```

use crate::equipment::EquipmentType;
use crate::error::{InventoryError, Result};
use crate::property::{PropertyKind, PropertyStore, PropertyValue};
use crate::shift_click::ShiftClickBehavior;
use crate::slot::SlotFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Priority used when none is given; higher priorities are filled first
pub const DEFAULT_PRIORITY: i32 = 1000;

/// Stable `(namespace, id)` identifier of an archetype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId {
    pub namespace: String,
    pub id: String,
}

impl ArchetypeId {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

/// Node variant an archetype produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchetypeKind {
    /// A single slot
    Slot,
    /// Children in insertion order
    Ordered,
    /// Children laid out on a grid
    Grid { columns: u32, rows: u32 },
}

impl ArchetypeKind {
    fn builder_name(&self) -> &'static str {
        match self {
            Self::Slot => "slot",
            Self::Ordered => "ordered",
            Self::Grid { .. } => "grid",
        }
    }
}

/// Where a child sits in its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Next position of an ordered composite
    Ordered,
    /// Single grid cell
    Cell { x: u32, y: u32 },
    /// Full-width row starting at `y`
    Row { y: u32 },
    /// Sub-grid whose first row is `y`
    SubGrid { y: u32 },
}

#[derive(Clone)]
pub(crate) struct ChildSpec {
    pub placement: Placement,
    pub archetype: Archetype,
    pub priority: i32,
    /// Properties the parent reports for this child
    pub relative: PropertyStore,
}

pub(crate) struct ArchetypeData {
    pub id: Option<ArchetypeId>,
    pub kind: ArchetypeKind,
    pub name: Option<String>,
    pub properties: PropertyStore,
    pub children: Vec<ChildSpec>,
    pub filter: SlotFilter,
    pub max_stack_size: Option<u32>,
    pub priority_order: Option<Vec<usize>>,
    pub shift_click: Option<Arc<dyn ShiftClickBehavior>>,
    pub slot_count: usize,
    /// Grid cells in index order as `(child, slot offset in child)`
    pub grid_cells: Vec<(usize, usize)>,
    builder: ArchetypeBuilder,
}

/// Frozen, shareable inventory template
#[derive(Clone)]
pub struct Archetype(Arc<ArchetypeData>);

impl Archetype {
    /// Identifier, `None` for anonymous archetypes
    pub fn id(&self) -> Option<&ArchetypeId> {
        self.0.id.as_ref()
    }

    /// Identifier for messages
    pub fn display_id(&self) -> String {
        display_id(self.0.id.as_ref())
    }

    pub fn kind(&self) -> ArchetypeKind {
        self.0.kind
    }

    /// Total number of slots an instance will have
    pub fn slot_count(&self) -> usize {
        self.0.slot_count
    }

    /// Translation key of the name
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.0.properties
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    /// Start a new builder from this template
    ///
    /// The original archetype is untouched; children are shared.
    pub fn to_builder(&self) -> ArchetypeBuilder {
        self.0.builder.clone()
    }

    /// Check if two handles point at the same frozen template
    pub fn ptr_eq(&self, other: &Archetype) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn data(&self) -> &ArchetypeData {
        &self.0
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("id", &self.display_id())
            .field("kind", &self.0.kind)
            .field("slots", &self.0.slot_count)
            .finish()
    }
}

fn display_id(id: Option<&ArchetypeId>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "<anonymous>".to_string())
}

/// Misuse recorded while chaining, reported by `build`
#[derive(Debug, Clone)]
enum Misuse {
    Invalid(String),
    ChildPosition { position: usize, children: usize },
}

/// Accumulates the description of an archetype
#[derive(Clone, Default)]
pub struct ArchetypeBuilder {
    kind: Option<ArchetypeKind>,
    infer_rows: bool,
    name: Option<String>,
    properties: PropertyStore,
    children: Vec<ChildSpec>,
    filter: Option<SlotFilter>,
    max_stack_size: Option<u32>,
    declared_capacity: Option<usize>,
    priority_order: Option<Vec<usize>>,
    shift_click: Option<Arc<dyn ShiftClickBehavior>>,
    misuse: Option<Misuse>,
}

impl ArchetypeBuilder {
    /// Builder without a node variant; [`kind`](Self::kind) must be called
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for a single slot
    pub fn slot() -> Self {
        Self::new().kind(ArchetypeKind::Slot)
    }

    /// Builder for an ordered composite
    pub fn ordered() -> Self {
        Self::new().kind(ArchetypeKind::Ordered)
    }

    /// Builder for a fixed-size grid
    pub fn grid(columns: u32, rows: u32) -> Self {
        Self::new().kind(ArchetypeKind::Grid { columns, rows })
    }

    /// Builder for a grid whose row count follows from its children
    pub fn rows(columns: u32) -> Self {
        let mut builder = Self::grid(columns, 0);
        builder.infer_rows = true;
        builder
    }

    /// Select the node variant
    pub fn kind(mut self, kind: ArchetypeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn misuse(&mut self, misuse: Misuse) {
        if self.misuse.is_none() {
            self.misuse = Some(misuse);
        }
    }

    /// Set the translation key of the inventory name
    pub fn name(mut self, key: impl Into<String>) -> Self {
        self.name = Some(key.into());
        self
    }

    /// Add a property under the default key
    pub fn property(mut self, kind: PropertyKind, value: PropertyValue) -> Self {
        if kind.is_structural() {
            self.misuse(Misuse::Invalid(format!("{:?} cannot be set as a property", kind)));
            return self;
        }
        self.properties.insert(kind, value);
        self
    }

    /// Add a property under an explicit key
    pub fn property_keyed(mut self, kind: PropertyKind, key: impl Into<String>, value: PropertyValue) -> Self {
        if kind.is_structural() {
            self.misuse(Misuse::Invalid(format!("{:?} cannot be set as a property", kind)));
            return self;
        }
        self.properties.insert_keyed(kind, key, value);
        self
    }

    /// Slot filter
    pub fn filter(mut self, filter: SlotFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Slot stack limit
    pub fn max_stack_size(mut self, max: u32) -> Self {
        self.max_stack_size = Some(max.max(1));
        self
    }

    /// Type a slot for equipment: sets the equipment property and the filter
    pub fn equipment(self, ty: EquipmentType) -> Self {
        let kind = if ty.is_armor() {
            PropertyKind::ArmorSlot
        } else {
            PropertyKind::EquipmentSlot
        };
        self.property(kind, PropertyValue::Equipment(ty))
            .filter(SlotFilter::Equipment(ty))
    }

    /// Declare the number of slots an ordered composite must end up with
    pub fn capacity(mut self, slots: usize) -> Self {
        self.declared_capacity = Some(slots);
        self
    }

    /// Append a child with the default priority
    pub fn add(self, archetype: &Archetype) -> Self {
        self.add_with_priority(archetype, DEFAULT_PRIORITY)
    }

    /// Append a child; priority only affects fill order, not indices
    pub fn add_with_priority(mut self, archetype: &Archetype, priority: i32) -> Self {
        self.children.push(ChildSpec {
            placement: Placement::Ordered,
            archetype: archetype.clone(),
            priority,
            relative: PropertyStore::new(),
        });
        self
    }

    /// Prepend a child
    pub fn add_first(self, archetype: &Archetype, priority: i32) -> Self {
        self.insert(0, archetype, priority)
    }

    /// Insert a child at an explicit position
    pub fn insert(mut self, position: usize, archetype: &Archetype, priority: i32) -> Self {
        if position > self.children.len() {
            let len = self.children.len();
            self.misuse(Misuse::ChildPosition { position, children: len });
            return self;
        }
        self.children.insert(
            position,
            ChildSpec {
                placement: Placement::Ordered,
                archetype: archetype.clone(),
                priority,
                relative: PropertyStore::new(),
            },
        );
        self
    }

    /// Place a slot archetype in a grid cell
    pub fn slot_at(mut self, x: u32, y: u32, archetype: &Archetype) -> Self {
        self.children.push(ChildSpec {
            placement: Placement::Cell { x, y },
            archetype: archetype.clone(),
            priority: DEFAULT_PRIORITY,
            relative: PropertyStore::new(),
        });
        self
    }

    /// Place a full-width row
    pub fn row(mut self, y: u32, archetype: &Archetype, priority: i32) -> Self {
        self.children.push(ChildSpec {
            placement: Placement::Row { y },
            archetype: archetype.clone(),
            priority,
            relative: PropertyStore::new(),
        });
        self
    }

    /// Place a sub-grid of the same width starting at row `y`
    pub fn grid_at(mut self, y: u32, archetype: &Archetype, priority: i32) -> Self {
        self.children.push(ChildSpec {
            placement: Placement::SubGrid { y },
            archetype: archetype.clone(),
            priority,
            relative: PropertyStore::new(),
        });
        self
    }

    /// Property this composite reports for the child at `position`
    pub fn child_property(mut self, position: usize, kind: PropertyKind, value: PropertyValue) -> Self {
        let len = self.children.len();
        match self.children.get_mut(position) {
            Some(child) => child.relative.insert(kind, value),
            None => self.misuse(Misuse::ChildPosition { position, children: len }),
        }
        self
    }

    /// Explicit fill order as a permutation of slot indices
    pub fn priority_order(mut self, order: Vec<usize>) -> Self {
        self.priority_order = Some(order);
        self
    }

    /// Bind a shift-click behavior, copied to every instance
    pub fn shift_click(mut self, behavior: Arc<dyn ShiftClickBehavior>) -> Self {
        self.shift_click = Some(behavior);
        self
    }

    /// Freeze into an anonymous archetype
    pub fn build(self) -> Result<Archetype> {
        self.freeze(None)
    }

    /// Freeze into a named archetype
    pub fn build_archetype(self, namespace: impl Into<String>, id: impl Into<String>) -> Result<Archetype> {
        self.freeze(Some(ArchetypeId::new(namespace, id)))
    }

    fn freeze(self, id: Option<ArchetypeId>) -> Result<Archetype> {
        let archetype = display_id(id.as_ref());
        let kind = self.kind.ok_or_else(|| InventoryError::MissingFactory {
            archetype: archetype.clone(),
        })?;

        if let Some(misuse) = &self.misuse {
            return Err(match misuse {
                Misuse::Invalid(message) => InventoryError::InvalidBuilder {
                    archetype,
                    message: message.clone(),
                },
                Misuse::ChildPosition { position, children } => InventoryError::ChildPosition {
                    builder: kind.builder_name(),
                    archetype,
                    position: *position,
                    children: *children,
                },
            });
        }

        if kind != ArchetypeKind::Slot && (self.filter.is_some() || self.max_stack_size.is_some()) {
            return Err(InventoryError::InvalidBuilder {
                archetype,
                message: "filters and stack limits only apply to slots".to_string(),
            });
        }

        let (kind, slot_count, grid_cells) = match kind {
            ArchetypeKind::Slot => {
                if !self.children.is_empty() {
                    return Err(InventoryError::InvalidBuilder {
                        archetype,
                        message: "slots cannot have children".to_string(),
                    });
                }
                (kind, 1, Vec::new())
            }
            ArchetypeKind::Ordered => {
                let slot_count = self.validate_ordered(&archetype)?;
                (kind, slot_count, Vec::new())
            }
            ArchetypeKind::Grid { columns, rows } => {
                let (rows, cells) = self.layout_grid(&archetype, columns, rows)?;
                let kind = ArchetypeKind::Grid { columns, rows };
                (kind, cells.len(), cells)
            }
        };

        if let Some(order) = &self.priority_order {
            let mut seen = vec![false; slot_count];
            let valid = order.len() == slot_count
                && order.iter().all(|&i| i < slot_count && !std::mem::replace(&mut seen[i], true));
            if !valid {
                return Err(InventoryError::PrioritySetMismatch {
                    archetype,
                    expected: slot_count,
                    found: order.len(),
                });
            }
        }

        Ok(Archetype(Arc::new(ArchetypeData {
            id,
            kind,
            name: self.name.clone(),
            properties: self.properties.clone(),
            children: self.children.clone(),
            filter: self.filter.clone().unwrap_or_default(),
            max_stack_size: self.max_stack_size,
            priority_order: self.priority_order.clone(),
            shift_click: self.shift_click.clone(),
            slot_count,
            grid_cells,
            builder: self,
        })))
    }

    fn validate_ordered(&self, archetype: &str) -> Result<usize> {
        if self.children.iter().any(|c| c.placement != Placement::Ordered) {
            return Err(InventoryError::InvalidBuilder {
                archetype: archetype.to_string(),
                message: "grid placements used on an ordered builder".to_string(),
            });
        }

        let found: usize = self.children.iter().map(|c| c.archetype.slot_count()).sum();
        if let Some(declared) = self.declared_capacity {
            if found != declared {
                return Err(InventoryError::CapacityMismatch {
                    builder: "ordered",
                    archetype: archetype.to_string(),
                    declared,
                    found,
                });
            }
        }
        Ok(found)
    }

    fn layout_grid(&self, archetype: &str, columns: u32, rows: u32) -> Result<(u32, Vec<(usize, usize)>)> {
        let mut occupied: HashMap<(u32, u32), (usize, usize)> = HashMap::new();
        let mut max_row = 0u32;

        let mut claim = |x: u32, y: u32, cell: (usize, usize)| -> Result<()> {
            if occupied.insert((x, y), cell).is_some() {
                return Err(InventoryError::PositionOccupied {
                    archetype: archetype.to_string(),
                    x,
                    y,
                });
            }
            Ok(())
        };

        let capacity_error = |found: usize| InventoryError::CapacityMismatch {
            builder: "grid",
            archetype: archetype.to_string(),
            declared: (columns as usize).saturating_mul(rows as usize),
            found,
        };
        // row just past the last one a child covers, checked against fixed heights
        let end_row = |y: u32, height: u32| -> Option<u32> {
            let end = y.checked_add(height)?;
            (self.infer_rows || end <= rows).then_some(end)
        };

        for (ordinal, child) in self.children.iter().enumerate() {
            let shape_error = || InventoryError::ShapeMismatch {
                archetype: archetype.to_string(),
                child: child.archetype.display_id(),
                columns,
            };
            match child.placement {
                Placement::Ordered => {
                    return Err(InventoryError::InvalidBuilder {
                        archetype: archetype.to_string(),
                        message: "ordered placement used on a grid builder".to_string(),
                    });
                }
                Placement::Cell { x, y } => {
                    if child.archetype.kind() != ArchetypeKind::Slot || x >= columns {
                        return Err(shape_error());
                    }
                    let end = end_row(y, 1).ok_or_else(|| capacity_error(ordinal + 1))?;
                    claim(x, y, (ordinal, 0))?;
                    max_row = max_row.max(end);
                }
                Placement::Row { y } => {
                    let fits = match child.archetype.kind() {
                        ArchetypeKind::Ordered => child.archetype.slot_count() == columns as usize,
                        ArchetypeKind::Grid { columns: c, rows: 1 } => c == columns,
                        _ => false,
                    };
                    if !fits {
                        return Err(shape_error());
                    }
                    let end = end_row(y, 1).ok_or_else(|| capacity_error(ordinal + 1))?;
                    for x in 0..columns {
                        claim(x, y, (ordinal, x as usize))?;
                    }
                    max_row = max_row.max(end);
                }
                Placement::SubGrid { y } => {
                    let sub_rows = match child.archetype.kind() {
                        ArchetypeKind::Grid { columns: c, rows } if c == columns => rows,
                        _ => return Err(shape_error()),
                    };
                    let end = end_row(y, sub_rows).ok_or_else(|| capacity_error(ordinal + 1))?;
                    for dy in 0..sub_rows {
                        for x in 0..columns {
                            let offset = dy as usize * columns as usize + x as usize;
                            claim(x, y + dy, (ordinal, offset))?;
                        }
                    }
                    max_row = max_row.max(end);
                }
            }
        }

        let rows = if self.infer_rows { max_row } else { rows };
        let declared = (columns as usize)
            .checked_mul(rows as usize)
            .ok_or_else(|| capacity_error(occupied.len()))?;
        if max_row > rows || occupied.len() != declared {
            return Err(InventoryError::CapacityMismatch {
                builder: "grid",
                archetype: archetype.to_string(),
                declared,
                found: occupied.len(),
            });
        }

        let mut cells = Vec::with_capacity(declared);
        for y in 0..rows {
            for x in 0..columns {
                match occupied.get(&(x, y)) {
                    Some(cell) => cells.push(*cell),
                    None => {
                        return Err(InventoryError::CapacityMismatch {
                            builder: "grid",
                            archetype: archetype.to_string(),
                            declared,
                            found: occupied.len(),
                        })
                    }
                }
            }
        }
        Ok((rows, cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> Archetype {
        ArchetypeBuilder::slot().build_archetype("test", "slot").unwrap()
    }

    fn hotbar() -> Archetype {
        let slot = slot();
        let mut builder = ArchetypeBuilder::ordered();
        for _ in 0..9 {
            builder = builder.add(&slot);
        }
        builder.build_archetype("test", "hotbar").unwrap()
    }

    #[test]
    fn test_missing_factory() {
        let err = ArchetypeBuilder::new().build_archetype("test", "nothing").unwrap_err();
        assert_eq!(
            err,
            InventoryError::MissingFactory {
                archetype: "test:nothing".to_string()
            }
        );
    }

    #[test]
    fn test_ordered_slot_count() {
        let hotbar = hotbar();
        assert_eq!(hotbar.slot_count(), 9);
        assert_eq!(hotbar.kind(), ArchetypeKind::Ordered);
        assert_eq!(hotbar.id().unwrap().to_string(), "test:hotbar");
    }

    #[test]
    fn test_declared_capacity_mismatch() {
        let slot = slot();
        let err = ArchetypeBuilder::ordered()
            .capacity(2)
            .add(&slot)
            .add(&slot)
            .insert(2, &slot, DEFAULT_PRIORITY)
            .build_archetype("test", "pair")
            .unwrap_err();

        match err {
            InventoryError::CapacityMismatch { builder, archetype, declared, found } => {
                assert_eq!(builder, "ordered");
                assert_eq!(archetype, "test:pair");
                assert_eq!(declared, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_insert_past_end() {
        let err = ArchetypeBuilder::ordered()
            .insert(4, &slot(), DEFAULT_PRIORITY)
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::ChildPosition { position: 4, children: 0, .. }));
    }

    #[test]
    fn test_capacity_counts_slots_of_nested_children() {
        // two children, but the inserted hotbar brings nine slots
        let pair = ArchetypeBuilder::ordered()
            .capacity(10)
            .add(&slot())
            .insert(1, &hotbar(), DEFAULT_PRIORITY)
            .build()
            .unwrap();
        assert_eq!(pair.slot_count(), 10);

        let err = ArchetypeBuilder::ordered()
            .capacity(2)
            .add(&slot())
            .insert(1, &hotbar(), DEFAULT_PRIORITY)
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { declared: 2, found: 10, .. }));
    }

    #[test]
    fn test_child_property_past_end() {
        let err = ArchetypeBuilder::ordered()
            .add(&slot())
            .child_property(1, PropertyKind::custom("role"), PropertyValue::Int(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::ChildPosition { position: 1, children: 1, .. }));
    }

    #[test]
    fn test_grid_rejects_rows_out_of_range() {
        let slot = slot();
        let err = ArchetypeBuilder::grid(1, 1).slot_at(0, u32::MAX, &slot).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { declared: 1, .. }));

        let err = ArchetypeBuilder::grid(1, 1).slot_at(0, 1, &slot).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));

        let err = ArchetypeBuilder::rows(1).slot_at(0, u32::MAX, &slot).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));

        let err = ArchetypeBuilder::grid(9, 1).row(1, &hotbar(), DEFAULT_PRIORITY).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));

        let err = ArchetypeBuilder::rows(9).row(u32::MAX, &hotbar(), DEFAULT_PRIORITY).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));
    }

    #[test]
    fn test_sub_grid_rejects_rows_out_of_range() {
        let slot = slot();
        let mut sub = ArchetypeBuilder::grid(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                sub = sub.slot_at(x, y, &slot);
            }
        }
        let sub = sub.build().unwrap();

        let err = ArchetypeBuilder::grid(2, 2).grid_at(1, &sub, DEFAULT_PRIORITY).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { declared: 4, .. }));

        let err = ArchetypeBuilder::rows(2)
            .grid_at(u32::MAX - 1, &sub, DEFAULT_PRIORITY)
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));
    }

    #[test]
    fn test_grid_oversized_dimensions() {
        let err = ArchetypeBuilder::grid(70000, 70000).slot_at(0, 0, &slot()).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { found: 1, .. }));

        let err = ArchetypeBuilder::grid(u32::MAX, u32::MAX).slot_at(0, 0, &slot()).build().unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { .. }));
    }

    #[test]
    fn test_grid_layout() {
        let slot = slot();
        let mut builder = ArchetypeBuilder::grid(3, 2);
        for y in 0..2 {
            for x in 0..3 {
                builder = builder.slot_at(x, y, &slot);
            }
        }
        let grid = builder.build().unwrap();
        assert_eq!(grid.slot_count(), 6);
        assert_eq!(grid.kind(), ArchetypeKind::Grid { columns: 3, rows: 2 });
    }

    #[test]
    fn test_grid_missing_cell() {
        let err = ArchetypeBuilder::grid(2, 1)
            .slot_at(0, 0, &slot())
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::CapacityMismatch { declared: 2, found: 1, .. }));
    }

    #[test]
    fn test_grid_cell_taken_twice() {
        let slot = slot();
        let err = ArchetypeBuilder::grid(2, 1)
            .slot_at(0, 0, &slot)
            .slot_at(0, 0, &slot)
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::PositionOccupied { x: 0, y: 0, .. }));
    }

    #[test]
    fn test_rows_infer_height() {
        let slot = slot();
        let mut grid = ArchetypeBuilder::grid(9, 3);
        for y in 0..3 {
            for x in 0..9 {
                grid = grid.slot_at(x, y, &slot);
            }
        }
        let grid = grid.build().unwrap();

        let main = ArchetypeBuilder::rows(9)
            .grid_at(0, &grid, DEFAULT_PRIORITY)
            .row(3, &hotbar(), 1050)
            .build()
            .unwrap();
        assert_eq!(main.kind(), ArchetypeKind::Grid { columns: 9, rows: 4 });
        assert_eq!(main.slot_count(), 36);
    }

    #[test]
    fn test_row_width_must_match() {
        let err = ArchetypeBuilder::rows(5).row(0, &hotbar(), DEFAULT_PRIORITY).build().unwrap_err();
        assert!(matches!(err, InventoryError::ShapeMismatch { columns: 5, .. }));
    }

    #[test]
    fn test_priority_order_must_be_permutation() {
        let slot = slot();
        let err = ArchetypeBuilder::ordered()
            .add(&slot)
            .add(&slot)
            .priority_order(vec![0, 0])
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::PrioritySetMismatch { expected: 2, .. }));

        let ok = ArchetypeBuilder::ordered()
            .add(&slot)
            .add(&slot)
            .priority_order(vec![1, 0])
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_structural_property_rejected() {
        let err = ArchetypeBuilder::ordered()
            .property(PropertyKind::Capacity, PropertyValue::Int(3))
            .build()
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidBuilder { .. }));
    }

    #[test]
    fn test_extend_keeps_original() {
        let chest = ArchetypeBuilder::ordered()
            .add(&slot())
            .name("container.chest")
            .build_archetype("test", "chest")
            .unwrap();
        let big = chest
            .to_builder()
            .add(&slot())
            .name("container.big")
            .build_archetype("test", "big")
            .unwrap();

        assert_eq!(chest.slot_count(), 1);
        assert_eq!(chest.name(), Some("container.chest"));
        assert_eq!(big.slot_count(), 2);
        assert_eq!(big.name(), Some("container.big"));
    }
}
