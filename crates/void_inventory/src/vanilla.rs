//! Stock archetypes
//!
//! The usual game inventories, built from the same builders plugins use.
//! Everything is registered under [`NAMESPACE`].

use crate::archetype::{Archetype, ArchetypeBuilder, ArchetypeId, DEFAULT_PRIORITY};
use crate::equipment::EquipmentType;
use crate::error::Result;
use crate::property::{PropertyKind, PropertyValue};
use crate::registry::{ArchetypeRegistry, ItemKindPredicate, ItemRegistry};
use crate::shift_click::PlayerShiftClick;
use std::sync::Arc;

pub const NAMESPACE: &str = "minecraft";

/// Fill priority of the hotbar inside the player's main inventory
pub const HOTBAR_PRIORITY: i32 = 1050;

/// The stock archetype set
#[derive(Debug, Clone)]
pub struct VanillaArchetypes {
    pub slot: Archetype,
    pub input_slot: Archetype,
    pub output_slot: Archetype,
    pub fuel_slot: Archetype,
    pub helmet: Archetype,
    pub chestplate: Archetype,
    pub leggings: Archetype,
    pub boots: Archetype,
    pub offhand: Archetype,
    pub hotbar: Archetype,
    pub main_grid: Archetype,
    pub player_main: Archetype,
    pub armor: Archetype,
    pub player: Archetype,
    pub chest: Archetype,
    pub shulker_box: Archetype,
    pub ender_chest: Archetype,
    pub double_chest: Archetype,
    pub dispenser: Archetype,
    pub jukebox: Archetype,
    pub furnace: Archetype,
    pub crafting_grid: Archetype,
    pub crafting_table: Archetype,
}

fn grid_of(columns: u32, rows: u32, slot: &Archetype) -> ArchetypeBuilder {
    let mut builder = ArchetypeBuilder::grid(columns, rows);
    for y in 0..rows {
        for x in 0..columns {
            builder = builder.slot_at(x, y, slot);
        }
    }
    builder
}

fn armor_slot(ty: EquipmentType, id: &str) -> Result<Archetype> {
    ArchetypeBuilder::slot()
        .equipment(ty)
        .build_archetype(NAMESPACE, id)
}

impl VanillaArchetypes {
    /// Build the set, resolving item filters through `items`
    pub fn new(items: &dyn ItemRegistry) -> Result<Self> {
        let slot = ArchetypeBuilder::slot().build_archetype(NAMESPACE, "slot")?;
        let input_slot = ArchetypeBuilder::slot().build_archetype(NAMESPACE, "input_slot")?;
        let output_slot = ArchetypeBuilder::slot().build_archetype(NAMESPACE, "output_slot")?;
        let fuel_slot = ArchetypeBuilder::slot()
            .filter(items.resolve_filter(&ItemKindPredicate::Tag("fuel".to_string())))
            .build_archetype(NAMESPACE, "fuel_slot")?;

        let helmet = armor_slot(EquipmentType::Headwear, "helmet")?;
        let chestplate = armor_slot(EquipmentType::Chestplate, "chestplate")?;
        let leggings = armor_slot(EquipmentType::Leggings, "leggings")?;
        let boots = armor_slot(EquipmentType::Boots, "boots")?;
        let offhand = ArchetypeBuilder::slot()
            .equipment(EquipmentType::OffHand)
            .build_archetype(NAMESPACE, "offhand")?;

        let mut hotbar = ArchetypeBuilder::ordered().capacity(9);
        for _ in 0..9 {
            hotbar = hotbar.add(&slot);
        }
        let hotbar = hotbar.build_archetype(NAMESPACE, "hotbar")?;

        let main_grid = grid_of(9, 3, &slot).build_archetype(NAMESPACE, "main_grid")?;
        let player_main = ArchetypeBuilder::rows(9)
            .grid_at(0, &main_grid, DEFAULT_PRIORITY)
            .row(3, &hotbar, HOTBAR_PRIORITY)
            .build_archetype(NAMESPACE, "player_main")?;

        let armor = ArchetypeBuilder::ordered()
            .capacity(4)
            .add(&helmet)
            .add(&chestplate)
            .add(&leggings)
            .add(&boots)
            .build_archetype(NAMESPACE, "armor")?;

        let behavior = PlayerShiftClick::new(
            ArchetypeId::new(NAMESPACE, "player_main"),
            vec![ArchetypeId::new(NAMESPACE, "armor"), ArchetypeId::new(NAMESPACE, "offhand")],
        );
        let player = ArchetypeBuilder::ordered()
            .name("container.inventory")
            .add(&player_main)
            .add(&armor)
            .add(&offhand)
            .shift_click(Arc::new(behavior))
            .build_archetype(NAMESPACE, "player")?;

        let chest = grid_of(9, 3, &slot)
            .name("container.chest")
            .build_archetype(NAMESPACE, "chest")?;
        let shulker_box = chest
            .to_builder()
            .name("container.shulkerBox")
            .build_archetype(NAMESPACE, "shulker_box")?;
        let ender_chest = chest
            .to_builder()
            .name("container.enderchest")
            .build_archetype(NAMESPACE, "ender_chest")?;
        let double_chest = ArchetypeBuilder::rows(9)
            .name("container.chestDouble")
            .grid_at(0, &chest, DEFAULT_PRIORITY)
            .grid_at(3, &chest, DEFAULT_PRIORITY)
            .build_archetype(NAMESPACE, "double_chest")?;
        let dispenser = grid_of(3, 3, &slot)
            .name("container.dispenser")
            .build_archetype(NAMESPACE, "dispenser")?;
        let jukebox = ArchetypeBuilder::slot().build_archetype(NAMESPACE, "jukebox")?;

        let furnace = ArchetypeBuilder::ordered()
            .name("container.furnace")
            .capacity(3)
            .add(&input_slot)
            .add(&fuel_slot)
            .add(&output_slot)
            .child_property(0, PropertyKind::custom("furnace_role"), PropertyValue::Text("input".into()))
            .child_property(1, PropertyKind::custom("furnace_role"), PropertyValue::Text("fuel".into()))
            .child_property(2, PropertyKind::custom("furnace_role"), PropertyValue::Text("output".into()))
            .build_archetype(NAMESPACE, "furnace")?;

        // result slot first, so the 3x3 input grid sits at indices 1..=9
        let crafting_grid = grid_of(3, 3, &input_slot).build_archetype(NAMESPACE, "crafting_grid")?;
        let crafting_table = ArchetypeBuilder::ordered()
            .name("container.crafting")
            .capacity(10)
            .add_with_priority(&output_slot, DEFAULT_PRIORITY - 1)
            .add(&crafting_grid)
            .build_archetype(NAMESPACE, "crafting_table")?;

        Ok(Self {
            slot,
            input_slot,
            output_slot,
            fuel_slot,
            helmet,
            chestplate,
            leggings,
            boots,
            offhand,
            hotbar,
            main_grid,
            player_main,
            armor,
            player,
            chest,
            shulker_box,
            ender_chest,
            double_chest,
            dispenser,
            jukebox,
            furnace,
            crafting_grid,
            crafting_table,
        })
    }

    /// Every archetype of the set
    pub fn all(&self) -> Vec<&Archetype> {
        vec![
            &self.slot,
            &self.input_slot,
            &self.output_slot,
            &self.fuel_slot,
            &self.helmet,
            &self.chestplate,
            &self.leggings,
            &self.boots,
            &self.offhand,
            &self.hotbar,
            &self.main_grid,
            &self.player_main,
            &self.armor,
            &self.player,
            &self.chest,
            &self.shulker_box,
            &self.ender_chest,
            &self.double_chest,
            &self.dispenser,
            &self.jukebox,
            &self.furnace,
            &self.crafting_grid,
            &self.crafting_table,
        ]
    }

    /// Register the whole set
    pub fn register(&self, registry: &ArchetypeRegistry) -> Result<()> {
        for archetype in self.all() {
            registry.register(archetype.clone())?;
        }
        log::info!("Registered {} stock archetypes", self.all().len());
        Ok(())
    }
}
