//! Equipment types
//!
//! Equipment types form a small hierarchy; a slot typed for a parent
//! category accepts every item typed for one of its children.
//!
//! ```text
//! Any
//! └── Equipped
//!     ├── Held: MainHand, OffHand
//!     └── Worn: Headwear, Chestplate, Leggings, Boots
//! ```

use serde::{Deserialize, Serialize};

/// Equipment categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    /// Matches everything
    Any,
    /// Anything held or worn
    Equipped,
    /// Held in a hand
    Held,
    /// Main hand
    MainHand,
    /// Off hand (shield, torch)
    OffHand,
    /// Worn armor
    Worn,
    /// Helmet slot
    Headwear,
    /// Chest armor
    Chestplate,
    /// Leg armor
    Leggings,
    /// Foot armor
    Boots,
}

impl EquipmentType {
    /// Get the parent category, `None` for [`EquipmentType::Any`]
    pub fn parent(&self) -> Option<EquipmentType> {
        match self {
            Self::Any => None,
            Self::Equipped => Some(Self::Any),
            Self::Held | Self::Worn => Some(Self::Equipped),
            Self::MainHand | Self::OffHand => Some(Self::Held),
            Self::Headwear | Self::Chestplate | Self::Leggings | Self::Boots => Some(Self::Worn),
        }
    }

    /// Check if `other` is this type or one of its descendants
    pub fn includes(&self, other: EquipmentType) -> bool {
        let mut current = Some(other);
        while let Some(ty) = current {
            if ty == *self {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Check if this is an armor category
    pub fn is_armor(&self) -> bool {
        Self::Worn.includes(*self)
    }

    /// Check if this is a hand category
    pub fn is_held(&self) -> bool {
        Self::Held.includes(*self)
    }

    /// The four armor pieces in wearing order
    pub fn armor() -> [EquipmentType; 4] {
        [Self::Headwear, Self::Chestplate, Self::Leggings, Self::Boots]
    }
}
