//! Containers and viewer sessions
//!
//! A container binds a top inventory (whatever was opened) and a bottom
//! inventory (the owner's personal storage) without owning either of them.
//! It owns a cursor slot shared by all of its viewers. Every attached viewer
//! gets its own [`ClientView`] holding the wire bindings and the contents it
//! was last told about.
//!
//! A viewer has at most one open container. A container whose top and
//! bottom are the same inventory is the owner's resident personal container
//! and is never discarded; any other container is discarded when its last
//! viewer closes it, unless [`InventoryConfig::discard_idle_containers`] is
//! off.
//!
//! [`InventoryConfig::discard_idle_containers`]: crate::config::InventoryConfig::discard_idle_containers

use crate::arena::{NodeId, SlotId};
use crate::error::{InventoryError, Result};
use crate::inventory::{InventoryTree, Node, NodeEntry, NodeKind};
use crate::item::StackRecord;
use crate::listener::{CloseEvent, ViewAction, ViewEvent};
use crate::slot::{Slot, SlotFilter};
use crate::sync::{ContainerSnapshot, ViewerId, WireSlot, CURSOR_WIRE_INDEX};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

pub(crate) struct ContainerNode {
    pub top: NodeId,
    pub bottom: NodeId,
    pub cursor: SlotId,
    /// Bound slots in wire order, top first
    pub slots: Vec<SlotId>,
    pub wire_of: HashMap<SlotId, i32>,
    pub priority: Vec<SlotId>,
    pub viewers: BTreeMap<ViewerId, ClientView>,
}

impl ContainerNode {
    pub fn is_resident(&self) -> bool {
        self.top == self.bottom
    }

    pub fn children(&self) -> Vec<NodeId> {
        if self.is_resident() {
            vec![self.top]
        } else {
            vec![self.top, self.bottom]
        }
    }

    pub fn index_of(&self, slot: SlotId) -> Option<usize> {
        self.wire_of.get(&slot).map(|w| *w as usize)
    }

    /// Check if a slot is bound, cursor included
    pub fn binds(&self, slot: SlotId) -> bool {
        slot == self.cursor || self.wire_of.contains_key(&slot)
    }

    fn wire_index(&self, slot: SlotId) -> Option<i32> {
        if slot == self.cursor {
            return Some(CURSOR_WIRE_INDEX);
        }
        self.wire_of.get(&slot).copied()
    }
}

/// Synchronization state of one viewer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientView {
    slot_bindings: BTreeMap<i32, SlotId>,
    last_known: HashMap<SlotId, Option<StackRecord>>,
}

impl ClientView {
    /// Wire index to slot bindings
    pub fn slot_bindings(&self) -> &BTreeMap<i32, SlotId> {
        &self.slot_bindings
    }

    /// Slot bound to a wire index
    pub fn slot(&self, wire_index: i32) -> Option<SlotId> {
        self.slot_bindings.get(&wire_index).copied()
    }

    /// Contents this viewer was last told about
    pub fn last_known(&self, slot: SlotId) -> Option<&StackRecord> {
        self.last_known.get(&slot)?.as_ref()
    }

    /// Number of bound slots, cursor included
    pub fn len(&self) -> usize {
        self.slot_bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_bindings.is_empty()
    }
}

/// What happened when a viewer closed its container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedContainer {
    pub container: NodeId,
    pub discarded: bool,
    /// Cursor contents that could not be put back
    pub leftover: Option<StackRecord>,
}

impl InventoryTree {
    /// Create a container viewing `top` above `bottom`
    ///
    /// Pass the same node twice for the owner's resident container.
    pub fn create_container(&mut self, top: NodeId, bottom: NodeId) -> Result<NodeId> {
        for node in [top, bottom] {
            match self.kind(node) {
                None => return Err(InventoryError::UnknownNode(node)),
                Some(NodeKind::Container) => {
                    return Err(InventoryError::InvalidBuilder {
                        archetype: "<container>".to_string(),
                        message: format!("container {} cannot be viewed by another container", node),
                    })
                }
                Some(_) => {}
            }
        }

        let mut slots: Vec<SlotId> = self.slots(top).to_vec();
        let mut priority: Vec<SlotId> = self.priority_slots(top).to_vec();
        if top != bottom {
            let bound: HashSet<SlotId> = slots.iter().copied().collect();
            slots.extend(self.slots(bottom).iter().filter(|s| !bound.contains(*s)));
            priority.extend(self.priority_slots(bottom).iter().filter(|s| !bound.contains(*s)));
        }
        let wire_of = slots.iter().enumerate().map(|(i, s)| (*s, i as i32)).collect();

        let cursor_slot = Slot::new(SlotFilter::Any, self.config.default_max_stack_size);
        let cursor = self
            .nodes
            .insert_with(|id| NodeEntry::new(id, Node::Slot(cursor_slot)));
        let container = ContainerNode {
            top,
            bottom,
            cursor,
            slots,
            wire_of,
            priority,
            viewers: BTreeMap::new(),
        };
        let name = self.name(top).map(str::to_string);
        let id = self.nodes.insert_with(|id| {
            let mut entry = NodeEntry::new(id, Node::Container(container));
            entry.name = name;
            entry
        });
        if let Some(entry) = self.nodes.get_mut(cursor) {
            entry.parent = Some(id);
            entry.root = id;
        }
        self.containers.push(id);
        log::debug!("Created container {} (top {}, bottom {})", id, top, bottom);
        Ok(id)
    }

    pub(crate) fn container_node(&self, container: NodeId) -> Result<&ContainerNode> {
        match &self
            .nodes
            .get(container)
            .ok_or(InventoryError::UnknownNode(container))?
            .node
        {
            Node::Container(c) => Ok(c),
            _ => Err(InventoryError::NotAContainer(container)),
        }
    }

    fn container_node_mut(&mut self, container: NodeId) -> Option<&mut ContainerNode> {
        match &mut self.nodes.get_mut(container)?.node {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Attach a viewer
    ///
    /// A different container the viewer has open is closed first. The
    /// viewer's slots are bound in wire order and a full snapshot is pushed.
    pub fn open(&mut self, container: NodeId, viewer: ViewerId) -> Result<()> {
        self.container_node(container)?;
        match self.open_by_viewer.get(&viewer) {
            Some(open) if *open == container => return Ok(()),
            Some(_) => {
                self.close(viewer);
            }
            None => {}
        }

        let c = self.container_node(container)?;
        let mut view = ClientView::default();
        for (i, slot) in c.slots.iter().enumerate() {
            view.slot_bindings.insert(i as i32, *slot);
        }
        view.slot_bindings.insert(CURSOR_WIRE_INDEX, c.cursor);
        for slot in view.slot_bindings.values() {
            view.last_known.insert(*slot, self.contents(*slot).cloned());
        }

        for (wire_index, slot) in &view.slot_bindings {
            self.transport.bind(viewer, *wire_index, *slot);
        }
        let snapshot = self.snapshot_of(container, &view);
        self.transport.push_full_state(viewer, &snapshot);

        if let Some(c) = self.container_node_mut(container) {
            c.viewers.insert(viewer, view);
        }
        self.open_by_viewer.insert(viewer, container);
        log::debug!("{} opened container {}", viewer, container);

        self.notify_view(ViewEvent {
            container,
            viewer,
            action: ViewAction::Attached,
        });
        Ok(())
    }

    /// Detach a viewer from its open container
    ///
    /// Returns `None` when the viewer had nothing open.
    pub fn close(&mut self, viewer: ViewerId) -> Option<ClosedContainer> {
        let container = self.open_by_viewer.remove(&viewer)?;
        let c = self.container_node_mut(container)?;
        c.viewers.remove(&viewer);
        let idle = c.viewers.is_empty();
        let resident = c.is_resident();

        self.transport.release(viewer);
        log::debug!("{} closed container {}", viewer, container);
        self.notify_view(ViewEvent {
            container,
            viewer,
            action: ViewAction::Detached,
        });

        let discarded = idle && !resident && self.config.discard_idle_containers;
        self.notify_close(CloseEvent {
            container,
            viewer,
            discarded,
        });

        let leftover = if discarded {
            self.discard_container(container)
        } else {
            None
        };
        Some(ClosedContainer {
            container,
            discarded,
            leftover,
        })
    }

    /// Drop a container and its cursor, returning cursor units that did not
    /// fit back into the bottom inventory
    pub(crate) fn discard_container(&mut self, container: NodeId) -> Option<StackRecord> {
        let (cursor, bottom) = {
            let c = self.container_node(container).ok()?;
            (c.cursor, c.bottom)
        };

        let mut leftover = self.contents(cursor).cloned();
        if let Some(stack) = leftover.take() {
            leftover = if self.config.return_cursor_on_discard {
                self.commit(cursor, None);
                self.offer_fast(bottom, &stack).rejected().cloned()
            } else {
                Some(stack)
            };
        }

        self.nodes.remove(cursor);
        self.nodes.remove(container);
        self.listeners.forget(cursor);
        self.listeners.forget(container);
        self.containers.retain(|c| *c != container);
        self.open_by_viewer.retain(|_, c| *c != container);
        log::debug!("Discarded container {}", container);
        leftover
    }

    /// Container a viewer has open
    pub fn open_container(&self, viewer: ViewerId) -> Option<NodeId> {
        self.open_by_viewer.get(&viewer).copied()
    }

    /// Attached viewers, sorted
    pub fn viewers(&self, container: NodeId) -> Vec<ViewerId> {
        self.container_node(container)
            .map(|c| c.viewers.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The view of one attached viewer
    pub fn client_view(&self, container: NodeId, viewer: ViewerId) -> Option<&ClientView> {
        self.container_node(container).ok()?.viewers.get(&viewer)
    }

    pub fn top(&self, container: NodeId) -> Option<NodeId> {
        self.container_node(container).ok().map(|c| c.top)
    }

    pub fn bottom(&self, container: NodeId) -> Option<NodeId> {
        self.container_node(container).ok().map(|c| c.bottom)
    }

    /// The shared cursor slot
    pub fn cursor(&self, container: NodeId) -> Option<SlotId> {
        self.container_node(container).ok().map(|c| c.cursor)
    }

    /// Check for the owner's resident container
    pub fn is_resident(&self, container: NodeId) -> bool {
        self.container_node(container)
            .map(|c| c.is_resident())
            .unwrap_or(false)
    }

    /// Wire index of a bound slot
    pub fn wire_index(&self, container: NodeId, slot: SlotId) -> Option<i32> {
        self.container_node(container).ok()?.wire_index(slot)
    }

    /// Slot behind a wire index
    pub fn slot_at_wire(&self, container: NodeId, wire_index: i32) -> Option<SlotId> {
        let c = self.container_node(container).ok()?;
        if wire_index == CURSOR_WIRE_INDEX {
            return Some(c.cursor);
        }
        c.slots.get(usize::try_from(wire_index).ok()?).copied()
    }

    /// Current full state of a container
    pub fn snapshot(&self, container: NodeId) -> Option<ContainerSnapshot> {
        let c = self.container_node(container).ok()?;
        let slots = c
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| WireSlot {
                index: i as i32,
                contents: self.contents(*slot).cloned(),
            })
            .collect();
        Some(ContainerSnapshot {
            title: self.title(c.top),
            archetype: self.archetype(c.top).cloned(),
            slots,
            cursor: self.contents(c.cursor).cloned(),
        })
    }

    fn snapshot_of(&self, container: NodeId, view: &ClientView) -> ContainerSnapshot {
        let (title, archetype) = match self.top(container) {
            Some(top) => (self.title(top), self.archetype(top).cloned()),
            None => (self.title(container), None),
        };
        let slots = view
            .slot_bindings
            .iter()
            .filter(|(wire, _)| **wire != CURSOR_WIRE_INDEX)
            .map(|(wire, slot)| WireSlot {
                index: *wire,
                contents: view.last_known(*slot).cloned(),
            })
            .collect();
        let cursor = view
            .slot(CURSOR_WIRE_INDEX)
            .and_then(|cursor| view.last_known(cursor).cloned());
        ContainerSnapshot {
            title,
            archetype,
            slots,
            cursor,
        }
    }

    /// Push the current contents of a slot to every viewer that has it bound
    pub(crate) fn sync_slot(&mut self, slot: SlotId) {
        let contents = self.contents(slot).cloned();
        let transport = Arc::clone(&self.transport);

        for container in &self.containers {
            let Some(entry) = self.nodes.get_mut(*container) else {
                continue;
            };
            let Node::Container(c) = &mut entry.node else {
                continue;
            };
            let Some(wire_index) = c.wire_index(slot) else {
                continue;
            };
            for (viewer, view) in c.viewers.iter_mut() {
                if view.last_known.get(&slot) == Some(&contents) {
                    continue;
                }
                view.last_known.insert(slot, contents.clone());
                log::trace!("Sync slot {} of container {} to {}", wire_index, container, viewer);
                transport.push_delta(*viewer, wire_index, contents.as_ref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{Archetype, ArchetypeBuilder};
    use crate::sync::{ChannelTransport, SyncMessage};

    fn row(count: usize) -> Archetype {
        let slot = ArchetypeBuilder::slot().build().unwrap();
        let mut builder = ArchetypeBuilder::ordered();
        for _ in 0..count {
            builder = builder.add(&slot);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_wire_order_top_first() {
        let mut tree = InventoryTree::default();
        let chest = tree.instantiate(&row(3));
        let player = tree.instantiate(&row(2));
        let container = tree.create_container(chest, player).unwrap();

        assert_eq!(tree.capacity(container), 5);
        assert_eq!(tree.wire_index(container, tree.slots(chest)[0]), Some(0));
        assert_eq!(tree.wire_index(container, tree.slots(player)[0]), Some(3));
        let cursor = tree.cursor(container).unwrap();
        assert_eq!(tree.wire_index(container, cursor), Some(CURSOR_WIRE_INDEX));
        assert_eq!(tree.slot_at_wire(container, 4), Some(tree.slots(player)[1]));
        assert!(tree.slot_at_wire(container, 5).is_none());
    }

    #[test]
    fn test_open_pushes_full_state() {
        let (transport, receiver) = ChannelTransport::unbounded();
        let mut tree = InventoryTree::default();
        tree.set_transport(transport);

        let chest = tree.instantiate(&row(2));
        let player = tree.instantiate(&row(1));
        tree.set_at(chest, 1, Some(StackRecord::new("stone", 3)));
        let container = tree.create_container(chest, player).unwrap();
        tree.open(container, ViewerId(1)).unwrap();

        let messages: Vec<SyncMessage> = receiver.try_iter().collect();
        let binds = messages
            .iter()
            .filter(|m| matches!(m, SyncMessage::Bind { .. }))
            .count();
        assert_eq!(binds, 4);
        let snapshot = messages
            .iter()
            .find_map(|m| match m {
                SyncMessage::FullState { snapshot, .. } => Some(snapshot.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(snapshot.slots.len(), 3);
        assert_eq!(snapshot.slots[1].contents, Some(StackRecord::new("stone", 3)));
    }

    #[test]
    fn test_mutation_pushes_delta() {
        let (transport, receiver) = ChannelTransport::unbounded();
        let mut tree = InventoryTree::default();
        tree.set_transport(transport);

        let chest = tree.instantiate(&row(2));
        let player = tree.instantiate(&row(2));
        let container = tree.create_container(chest, player).unwrap();
        tree.open(container, ViewerId(1)).unwrap();
        receiver.try_iter().for_each(drop);

        tree.set_at(player, 1, Some(StackRecord::new("dirt", 2)));
        let messages: Vec<SyncMessage> = receiver.try_iter().collect();
        assert_eq!(
            messages,
            vec![SyncMessage::Delta {
                viewer: ViewerId(1),
                wire_index: 3,
                contents: Some(StackRecord::new("dirt", 2)),
            }]
        );
    }

    #[test]
    fn test_single_active_container() {
        let mut tree = InventoryTree::default();
        let player = tree.instantiate(&row(2));
        let first = tree.instantiate(&row(1));
        let second = tree.instantiate(&row(1));
        let a = tree.create_container(first, player).unwrap();
        let b = tree.create_container(second, player).unwrap();
        let viewer = ViewerId(9);

        tree.open(a, viewer).unwrap();
        tree.open(b, viewer).unwrap();

        assert_eq!(tree.open_container(viewer), Some(b));
        // a lost its only viewer and was discarded
        assert!(!tree.contains_node(a));
        assert_eq!(tree.viewers(b), vec![viewer]);
    }

    #[test]
    fn test_resident_container_survives_close() {
        let mut tree = InventoryTree::default();
        let player = tree.instantiate(&row(2));
        let container = tree.create_container(player, player).unwrap();
        assert!(tree.is_resident(container));
        assert_eq!(tree.capacity(container), 2);

        tree.open(container, ViewerId(1)).unwrap();
        let closed = tree.close(ViewerId(1)).unwrap();
        assert!(!closed.discarded);
        assert!(tree.contains_node(container));
    }

    #[test]
    fn test_cursor_returns_on_discard() {
        let mut tree = InventoryTree::default();
        let chest = tree.instantiate(&row(1));
        let player = tree.instantiate(&row(1));
        tree.set_at(player, 0, Some(StackRecord::new("stone", 60)));
        let container = tree.create_container(chest, player).unwrap();
        tree.open(container, ViewerId(1)).unwrap();

        let cursor = tree.cursor(container).unwrap();
        tree.set(cursor, Some(StackRecord::new("stone", 10)));

        let closed = tree.close(ViewerId(1)).unwrap();
        assert!(closed.discarded);
        assert_eq!(closed.leftover, Some(StackRecord::new("stone", 6)));
        assert_eq!(tree.count(player, &"stone".into()), 64);
        assert!(!tree.contains_node(cursor));
    }

    #[test]
    fn test_remove_referenced_inventory_fails() {
        let mut tree = InventoryTree::default();
        let chest = tree.instantiate(&row(1));
        let player = tree.instantiate(&row(1));
        let container = tree.create_container(chest, player).unwrap();

        assert_eq!(
            tree.remove(chest),
            Err(InventoryError::InUse {
                node: chest,
                container
            })
        );
        tree.remove(container).unwrap();
        tree.remove(chest).unwrap();
    }

    #[test]
    fn test_close_without_open() {
        let mut tree = InventoryTree::default();
        assert!(tree.close(ViewerId(3)).is_none());
    }
}
