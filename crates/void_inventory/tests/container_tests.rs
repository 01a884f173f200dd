//! Integration tests for void_inventory containers, listeners and shift-click

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use void_inventory::*;

fn row(count: usize) -> Archetype {
    let slot = ArchetypeBuilder::slot().build().unwrap();
    let mut builder = ArchetypeBuilder::ordered();
    for _ in 0..count {
        builder = builder.add(&slot);
    }
    builder.build().unwrap()
}

fn armor_items() -> SimpleItemRegistry {
    SimpleItemRegistry::new()
        .with_equipment("iron_helmet", EquipmentType::Headwear)
        .with_max_stack("iron_helmet", 1)
}

#[test]
fn test_viewers_are_independent() {
    let (transport, receiver) = ChannelTransport::unbounded();
    let mut tree = InventoryTree::default();
    tree.set_transport(transport);

    let chest = tree.instantiate(&row(3));
    let player = tree.instantiate(&row(2));
    let container = tree.create_container(chest, player).unwrap();
    tree.open(container, ViewerId(1)).unwrap();
    tree.open(container, ViewerId(2)).unwrap();
    assert_eq!(tree.viewers(container), vec![ViewerId(1), ViewerId(2)]);

    tree.set_at(chest, 0, Some(StackRecord::new("stone", 9)));
    let second_before = tree.client_view(container, ViewerId(2)).cloned().unwrap();
    assert_eq!(second_before.last_known(tree.slots(chest)[0]), Some(&StackRecord::new("stone", 9)));

    let closed = tree.close(ViewerId(1)).unwrap();
    assert!(!closed.discarded);
    assert!(tree.client_view(container, ViewerId(1)).is_none());
    assert_eq!(tree.client_view(container, ViewerId(2)), Some(&second_before));
    assert_eq!(second_before.len(), 6);

    // each viewer receives its own delta
    let deltas: Vec<ViewerId> = receiver
        .try_iter()
        .filter(|m| matches!(m, SyncMessage::Delta { .. }))
        .map(|m| m.viewer())
        .collect();
    assert_eq!(deltas, vec![ViewerId(1), ViewerId(2)]);
}

#[test]
fn test_last_viewer_discards_container() {
    let mut tree = InventoryTree::default();
    let chest = tree.instantiate(&row(1));
    let player = tree.instantiate(&row(1));
    let container = tree.create_container(chest, player).unwrap();
    tree.open(container, ViewerId(7)).unwrap();

    let closed = tree.close(ViewerId(7)).unwrap();
    assert!(closed.discarded);
    assert!(!tree.contains_node(container));
    assert!(tree.contains_node(chest));
    assert!(tree.close(ViewerId(7)).is_none());
}

#[test]
fn test_view_and_close_events() {
    let mut tree = InventoryTree::default();
    let chest = tree.instantiate(&row(1));
    let player = tree.instantiate(&row(1));
    let container = tree.create_container(chest, player).unwrap();

    let attached = Arc::new(AtomicUsize::new(0));
    let closes = Arc::new(AtomicUsize::new(0));
    let a = attached.clone();
    tree.on_view(container, move |event| {
        if event.action == ViewAction::Attached {
            a.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    })
    .unwrap();
    let c = closes.clone();
    tree.on_close(container, move |event| {
        assert!(event.discarded);
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    tree.open(container, ViewerId(1)).unwrap();
    tree.open(container, ViewerId(1)).unwrap();
    tree.close(ViewerId(1));

    assert_eq!(attached.load(Ordering::SeqCst), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_listener_failures_are_isolated() {
    let (sender, diagnostics) = crossbeam_channel::unbounded();
    let mut tree = InventoryTree::default();
    tree.set_diagnostics(sender);
    let node = tree.instantiate(&row(2));

    let seen = Arc::new(AtomicUsize::new(0));
    tree.on_slot_change(node, |_| panic!("listener bug")).unwrap();
    let failing = tree
        .on_slot_change(node, |_| Err(ListenerError("rejected".into())))
        .unwrap();
    let counter = seen.clone();
    tree.on_slot_change(node, move |change| {
        assert!(change.before.is_none());
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    let result = tree.set_at(node, 0, Some(StackRecord::new("stone", 2)));
    assert_eq!(result.outcome(), Outcome::Success);
    assert_eq!(tree.count(node, &"stone".into()), 2);
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    let reports: Vec<Diagnostic> = diagnostics.try_iter().collect();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().any(|d| d.kind == FailureKind::Panic && d.message.contains("listener bug")));
    assert!(reports.iter().any(|d| d.kind == FailureKind::Error && d.listener == failing));
}

#[test]
fn test_shift_click_prefers_equipment() {
    let items = armor_items();
    let vanilla = VanillaArchetypes::new(&items).unwrap();
    let context = InventoryContext::default().with_items(items);
    let mut tree = InventoryTree::new(InventoryConfig::default(), context);

    let player = tree.instantiate(&vanilla.player);
    let container = tree.create_container(player, player).unwrap();
    let main = tree.query(player, &[Query::ByArchetype(ArchetypeId::new("minecraft", "main_grid"))]);
    let helmet = tree.query(player, &[Query::ByEquipment(EquipmentType::Headwear)]);
    assert_eq!(helmet.len(), 1);

    let first = main.slot_at(0).unwrap();
    let second = main.slot_at(1).unwrap();
    tree.set(first, Some(StackRecord::single("iron_helmet")));
    tree.set(second, Some(StackRecord::single("iron_helmet")));

    let moved = tree.shift_click(container, first).unwrap();
    assert!(moved.is_complete());
    assert!(tree.contents(first).is_none());
    assert_eq!(tree.contents(helmet.slot_at(0).unwrap()), Some(&StackRecord::single("iron_helmet")));

    // helmet slot is taken now, so the second one leaves the main grid for the hotbar
    tree.shift_click(container, second).unwrap();
    let hotbar = tree.query(player, &[Query::ByArchetype(ArchetypeId::new("minecraft", "hotbar"))]);
    assert_eq!(tree.contents(hotbar.slot_at(0).unwrap()), Some(&StackRecord::single("iron_helmet")));
    assert_eq!(main.count(&tree, &"iron_helmet".into()), 0);
}

#[test]
fn test_shift_click_plain_item_skips_equipment() {
    let items = armor_items();
    let vanilla = VanillaArchetypes::new(&items).unwrap();
    let context = InventoryContext::default().with_items(items);
    let mut tree = InventoryTree::new(InventoryConfig::default(), context);

    let player = tree.instantiate(&vanilla.player);
    let container = tree.create_container(player, player).unwrap();
    let hotbar = tree.query(player, &[Query::ByArchetype(ArchetypeId::new("minecraft", "hotbar"))]);
    let source = hotbar.slot_at(4).unwrap();
    tree.set(source, Some(StackRecord::new("stone", 32)));

    tree.shift_click(container, source).unwrap();
    let main = tree.query(player, &[Query::ByArchetype(ArchetypeId::new("minecraft", "main_grid"))]);
    assert_eq!(main.count(&tree, &"stone".into()), 32);
    assert_eq!(tree.count(player, &"stone".into()), 32);
}

#[test]
fn test_chest_shift_click_to_player() {
    let vanilla = VanillaArchetypes::new(&SimpleItemRegistry::new()).unwrap();
    let mut tree = InventoryTree::default();
    let chest = tree.instantiate(&vanilla.chest);
    let player = tree.instantiate(&vanilla.player);
    let container = tree.create_container(chest, player).unwrap();

    let source = tree.slot_at(chest, 10).unwrap();
    tree.set(source, Some(StackRecord::new("stone", 5)));
    tree.shift_click(container, source).unwrap();

    // hotbar fills before the main grid
    let hotbar = tree.query(player, &[Query::ByArchetype(ArchetypeId::new("minecraft", "hotbar"))]);
    assert_eq!(hotbar.count(&tree, &"stone".into()), 5);
    assert_eq!(tree.title(container), "container.chest");
}

#[test]
fn test_snapshot_serializes() {
    let mut tree = InventoryTree::default();
    let chest = tree.instantiate(&row(1));
    let player = tree.instantiate(&row(1));
    tree.set_at(chest, 0, Some(StackRecord::new("stone", 4)));
    let container = tree.create_container(chest, player).unwrap();

    let snapshot = tree.snapshot(container).unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: ContainerSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(back.slots.len(), 2);
}
