//! Void Inventory - Composable Container Engine
//!
//! This crate models inventories as trees of slots. Leaf slots hold at most
//! one stack; composites (ordered lists and grids) own their children and
//! address every slot below them by a stable index, while filling and
//! draining follow a separate priority order. Containers bind two trees for
//! a viewer and keep each viewer's client in sync.
//!
//! # Features
//!
//! - Generational arena holding every node of a tree
//! - Immutable archetypes and copy-on-write builders
//! - Index order and priority order per composite
//! - All-or-nothing slot transactions with revert
//! - Queries by contents, type, property, name and identity
//! - Containers with per-viewer delta sync and shift-click
//! - Slot change, view and close listeners with panic isolation
//! - Stock game archetypes
//!
//! # Example
//!
//! ```ignore
//! use void_inventory::prelude::*;
//!
//! let slot = ArchetypeBuilder::slot().build()?;
//! let hotbar = ArchetypeBuilder::ordered()
//!     .capacity(2)
//!     .add(&slot)
//!     .add(&slot)
//!     .build_archetype("demo", "hotbar")?;
//!
//! let mut tree = InventoryTree::default();
//! let node = tree.instantiate(&hotbar);
//! let result = tree.offer(node, &StackRecord::new("stone", 80));
//! assert_eq!(result.outcome(), Outcome::PartialSuccess);
//! ```

pub mod archetype;
pub mod arena;
mod composite;
pub mod config;
pub mod container;
pub mod equipment;
pub mod error;
pub mod inventory;
pub mod item;
pub mod listener;
pub mod ops;
pub mod property;
pub mod query;
pub mod registry;
pub mod shift_click;
pub mod slot;
pub mod sync;
pub mod transaction;
pub mod vanilla;
pub mod view;

pub mod prelude {
    pub use crate::archetype::{Archetype, ArchetypeBuilder, ArchetypeId, ArchetypeKind, DEFAULT_PRIORITY};
    pub use crate::arena::{NodeId, SlotId};
    pub use crate::config::InventoryConfig;
    pub use crate::container::{ClientView, ClosedContainer};
    pub use crate::equipment::EquipmentType;
    pub use crate::error::{InventoryError, ListenerError, Result};
    pub use crate::inventory::{InventoryTree, NodeKind};
    pub use crate::item::{AuxData, ItemKind, StackRecord};
    pub use crate::listener::{
        CloseEvent, Diagnostic, FailureKind, ListenerId, SlotChange, ViewAction, ViewEvent,
    };
    pub use crate::ops::FastOffer;
    pub use crate::property::{PropertyKind, PropertyStore, PropertyValue};
    pub use crate::query::Query;
    pub use crate::registry::{
        ArchetypeRegistry, InventoryContext, ItemKindPredicate, ItemRegistry, KeyTranslator,
        SimpleItemRegistry, Translator,
    };
    pub use crate::shift_click::{DefaultShiftClick, PlayerShiftClick, ShiftClickBehavior};
    pub use crate::slot::{Slot, SlotFilter};
    pub use crate::sync::{
        ChannelTransport, ContainerSnapshot, NullTransport, SyncMessage, ViewerId, ViewerTransport,
        WireSlot, CURSOR_WIRE_INDEX,
    };
    pub use crate::transaction::{Outcome, SlotTransaction, TransactionResult};
    pub use crate::vanilla::VanillaArchetypes;
    pub use crate::view::InventoryView;
}

pub use prelude::*;
