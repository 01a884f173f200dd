//! The inventory tree
//!
//! [`InventoryTree`] owns every node in one arena: slots, ordered and grid
//! composites and containers. Nodes refer to each other through [`NodeId`]
//! handles; a parent link never keeps anything alive.
//!
//! The tree is a single-writer structure. It does no internal locking and
//! all mutation is expected to happen on the tick thread; reading from other
//! threads requires the caller to exclude concurrent mutation.

use crate::archetype::{Archetype, ArchetypeId, ArchetypeKind, Placement};
use crate::arena::{Arena, NodeId, SlotId};
use crate::composite::{priority_order, ChildEntry, Composite, GridInventory};
use crate::config::InventoryConfig;
use crate::container::ContainerNode;
use crate::error::{InventoryError, Result};
use crate::item::StackRecord;
use crate::listener::Listeners;
use crate::property::{PropertyKind, PropertyStore, PropertyValue, DEFAULT_KEY};
use crate::registry::{InventoryContext, ItemRegistry};
use crate::shift_click::ShiftClickBehavior;
use crate::slot::Slot;
use crate::sync::{NullTransport, ViewerId, ViewerTransport};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Slot,
    Ordered,
    Grid,
    Container,
}

pub(crate) enum Node {
    Slot(Slot),
    Ordered(Composite),
    Grid(GridInventory),
    Container(ContainerNode),
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Slot(_) => NodeKind::Slot,
            Self::Ordered(_) => NodeKind::Ordered,
            Self::Grid(_) => NodeKind::Grid,
            Self::Container(_) => NodeKind::Container,
        }
    }

    pub(crate) fn composite(&self) -> Option<&Composite> {
        match self {
            Self::Ordered(composite) => Some(composite),
            Self::Grid(grid) => Some(&grid.composite),
            _ => None,
        }
    }
}

pub(crate) struct NodeEntry {
    pub id: NodeId,
    pub node: Node,
    pub parent: Option<NodeId>,
    /// Cached root, reassigned for the whole subtree on re-parenting
    pub root: NodeId,
    pub name: Option<String>,
    pub archetype: Option<ArchetypeId>,
    pub properties: PropertyStore,
    pub shift_click: Option<Arc<dyn ShiftClickBehavior>>,
}

impl NodeEntry {
    pub(crate) fn new(id: NodeId, node: Node) -> Self {
        Self {
            id,
            node,
            parent: None,
            root: id,
            name: None,
            archetype: None,
            properties: PropertyStore::new(),
            shift_click: None,
        }
    }
}

/// Arena owning inventory nodes, their listeners and their viewers
pub struct InventoryTree {
    pub(crate) config: InventoryConfig,
    pub(crate) context: InventoryContext,
    pub(crate) nodes: Arena<NodeEntry>,
    pub(crate) listeners: Listeners,
    pub(crate) transport: Arc<dyn ViewerTransport>,
    pub(crate) containers: Vec<NodeId>,
    pub(crate) open_by_viewer: HashMap<ViewerId, NodeId>,
}

impl InventoryTree {
    /// Create a new empty tree
    pub fn new(config: InventoryConfig, context: InventoryContext) -> Self {
        Self {
            config,
            context,
            nodes: Arena::new(),
            listeners: Listeners::default(),
            transport: Arc::new(NullTransport),
            containers: Vec::new(),
            open_by_viewer: HashMap::new(),
        }
    }

    /// Replace the viewer transport
    pub fn set_transport(&mut self, transport: impl ViewerTransport + 'static) {
        self.transport = Arc::new(transport);
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn context(&self) -> &InventoryContext {
        &self.context
    }

    pub(crate) fn items(&self) -> &dyn ItemRegistry {
        self.context.items.as_ref()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Check if a handle refers to a live node
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub(crate) fn entry(&self, node: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(node)
    }

    // ---- construction ----

    /// Stamp out a live tree from an archetype
    pub fn instantiate(&mut self, archetype: &Archetype) -> NodeId {
        let root = self.build_node(archetype);
        self.assign_root(root, root);
        log::debug!(
            "Instantiated inventory {} from archetype {} ({} slots)",
            root,
            archetype.display_id(),
            archetype.slot_count()
        );
        root
    }

    /// Stamp out a registered archetype
    pub fn instantiate_id(&mut self, id: &ArchetypeId) -> Result<NodeId> {
        let archetype = self
            .context
            .archetypes
            .get(id)
            .ok_or_else(|| InventoryError::UnknownArchetype(id.to_string()))?;
        Ok(self.instantiate(&archetype))
    }

    fn build_node(&mut self, archetype: &Archetype) -> NodeId {
        let data = archetype.data();

        let node = match data.kind {
            ArchetypeKind::Slot => {
                let max = data.max_stack_size.unwrap_or(self.config.default_max_stack_size);
                Node::Slot(Slot::new(data.filter.clone(), max))
            }
            ArchetypeKind::Ordered => {
                let children: Vec<ChildEntry> = data
                    .children
                    .iter()
                    .map(|spec| ChildEntry {
                        node: self.build_node(&spec.archetype),
                        priority: spec.priority,
                        relative: spec.relative.clone(),
                    })
                    .collect();
                let slots: Vec<SlotId> = children
                    .iter()
                    .flat_map(|c| self.slots(c.node).to_vec())
                    .collect();
                let priority = self.derive_priority(&children, &slots, data.priority_order.as_deref());
                Node::Ordered(Composite::new(children, slots, priority))
            }
            ArchetypeKind::Grid { columns, rows } => {
                let mut placed: Vec<((u32, u32), ChildEntry)> = Vec::with_capacity(data.children.len());
                let mut child_slots: Vec<Vec<SlotId>> = Vec::with_capacity(data.children.len());
                for spec in &data.children {
                    let origin = match spec.placement {
                        Placement::Cell { x, y } => (x, y),
                        Placement::Row { y } | Placement::SubGrid { y } => (0, y),
                        Placement::Ordered => (0, 0),
                    };
                    let node = self.build_node(&spec.archetype);
                    child_slots.push(self.slots(node).to_vec());
                    placed.push((
                        origin,
                        ChildEntry {
                            node,
                            priority: spec.priority,
                            relative: spec.relative.clone(),
                        },
                    ));
                }

                let slots: Vec<SlotId> = data
                    .grid_cells
                    .iter()
                    .filter_map(|(child, offset)| child_slots.get(*child)?.get(*offset).copied())
                    .collect();

                // Children are kept in cell order
                placed.sort_by_key(|((x, y), _)| (*y, *x));
                let origins = placed.iter().map(|(origin, _)| *origin).collect();
                let children: Vec<ChildEntry> = placed.into_iter().map(|(_, child)| child).collect();
                let priority = self.derive_priority(&children, &slots, data.priority_order.as_deref());

                Node::Grid(GridInventory {
                    composite: Composite::new(children, slots, priority),
                    columns,
                    rows,
                    origins,
                })
            }
        };

        let children: Vec<NodeId> = node
            .composite()
            .map(|c| c.children.iter().map(|child| child.node).collect())
            .unwrap_or_default();

        let id = self.nodes.insert_with(|id| {
            let mut entry = NodeEntry::new(id, node);
            entry.name = data.name.clone();
            entry.archetype = data.id.clone();
            entry.properties = data.properties.clone();
            entry.shift_click = data.shift_click.clone();
            entry
        });
        for child in children {
            if let Some(entry) = self.nodes.get_mut(child) {
                entry.parent = Some(id);
            }
        }
        id
    }

    fn derive_priority(&self, children: &[ChildEntry], slots: &[SlotId], explicit: Option<&[usize]>) -> Vec<SlotId> {
        if let Some(order) = explicit {
            return order.iter().filter_map(|i| slots.get(*i).copied()).collect();
        }
        let lists: Vec<(i32, Vec<SlotId>)> = children
            .iter()
            .map(|c| (c.priority, self.priority_slots(c.node).to_vec()))
            .collect();
        let refs: Vec<(i32, &[SlotId])> = lists.iter().map(|(p, s)| (*p, s.as_slice())).collect();
        priority_order(&refs)
    }

    /// Build an ordered composite from existing parentless nodes
    ///
    /// This is the only way to give a node a parent after it was created.
    pub fn compose(&mut self, children: &[NodeId]) -> Result<NodeId> {
        let prioritized: Vec<(NodeId, i32)> = children
            .iter()
            .map(|c| (*c, crate::archetype::DEFAULT_PRIORITY))
            .collect();
        self.compose_prioritized(&prioritized)
    }

    /// Build an ordered composite from parentless nodes with priorities
    pub fn compose_prioritized(&mut self, children: &[(NodeId, i32)]) -> Result<NodeId> {
        let mut seen = HashSet::new();
        for (child, _) in children {
            let entry = self.nodes.get(*child).ok_or(InventoryError::UnknownNode(*child))?;
            if entry.parent.is_some() || !seen.insert(*child) {
                return Err(InventoryError::AlreadyOwned { node: *child });
            }
            if let Node::Container(_) = entry.node {
                return Err(InventoryError::InvalidBuilder {
                    archetype: "<composed>".to_string(),
                    message: format!("container {} cannot be a child", child),
                });
            }
        }

        let entries: Vec<ChildEntry> = children
            .iter()
            .map(|(node, priority)| ChildEntry {
                node: *node,
                priority: *priority,
                relative: PropertyStore::new(),
            })
            .collect();
        let slots: Vec<SlotId> = entries
            .iter()
            .flat_map(|c| self.slots(c.node).to_vec())
            .collect();
        let priority = self.derive_priority(&entries, &slots, None);
        let composite = Composite::new(entries, slots, priority);

        let id = self
            .nodes
            .insert_with(|id| NodeEntry::new(id, Node::Ordered(composite)));
        for (child, _) in children {
            if let Some(entry) = self.nodes.get_mut(*child) {
                entry.parent = Some(id);
            }
        }
        self.assign_root(id, id);
        log::debug!("Composed inventory {} from {} children", id, children.len());
        Ok(id)
    }

    fn assign_root(&mut self, node: NodeId, root: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.nodes.get_mut(current) {
                entry.root = root;
                if let Some(composite) = entry.node.composite() {
                    stack.extend(composite.children.iter().map(|c| c.node));
                }
            }
        }
    }

    /// Discard a parentless tree
    ///
    /// Fails while a container still references any node of it.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        let entry = self.nodes.get(node).ok_or(InventoryError::UnknownNode(node))?;
        if entry.parent.is_some() {
            return Err(InventoryError::AlreadyOwned { node });
        }

        if let Node::Container(container) = &entry.node {
            if !container.viewers.is_empty() {
                return Err(InventoryError::InUse { node, container: node });
            }
            self.discard_container(node);
            return Ok(());
        }

        let mut subtree = self.descendants(node);
        subtree.push(node);
        for &container in &self.containers {
            if let Some(Node::Container(c)) = self.nodes.get(container).map(|e| &e.node) {
                if subtree.contains(&c.top) || subtree.contains(&c.bottom) {
                    return Err(InventoryError::InUse { node, container });
                }
            }
        }

        for id in &subtree {
            self.nodes.remove(*id);
            self.listeners.forget(*id);
        }
        log::debug!("Removed inventory {} ({} nodes)", node, subtree.len());
        Ok(())
    }

    // ---- structure ----

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node).map(|e| e.node.kind())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    /// Topmost ancestor, the node itself when it has no parent
    pub fn root(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).map(|e| e.root)
    }

    /// Translation key of the node name
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node)?.name.as_deref()
    }

    /// Archetype the node was stamped from
    pub fn archetype(&self, node: NodeId) -> Option<&ArchetypeId> {
        self.nodes.get(node)?.archetype.as_ref()
    }

    /// Direct children in index order
    ///
    /// For containers these are the top and bottom inventories.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node).map(|e| &e.node) {
            Some(Node::Ordered(c)) => c.children.iter().map(|c| c.node).collect(),
            Some(Node::Grid(g)) => g.composite.children.iter().map(|c| c.node).collect(),
            Some(Node::Container(c)) => c.children(),
            _ => Vec::new(),
        }
    }

    /// First child
    pub fn first(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    /// Next sibling inside the parent
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let composite = self.nodes.get(parent)?.node.composite()?;
        let position = composite.position_of(node)?;
        composite.children.get(position + 1).map(|c| c.node)
    }

    /// Every node below `node`, depth-first in index order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if self.kind(current) != Some(NodeKind::Container) {
                stack.extend(self.children(current).into_iter().rev());
            }
        }
        out
    }

    /// The node and its ancestors, innermost first
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(entry) => {
                    out.push(id);
                    current = entry.parent;
                }
                None => break,
            }
        }
        out
    }

    /// Check if `node` is `ancestor` or lies below it
    pub fn is_within(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Slots in index order
    pub fn slots(&self, node: NodeId) -> &[SlotId] {
        match self.nodes.get(node) {
            Some(entry) => match &entry.node {
                Node::Slot(_) => std::slice::from_ref(&entry.id),
                Node::Ordered(c) => &c.slots,
                Node::Grid(g) => &g.composite.slots,
                Node::Container(c) => &c.slots,
            },
            None => &[],
        }
    }

    /// Slots in fill and drain order
    pub fn priority_slots(&self, node: NodeId) -> &[SlotId] {
        match self.nodes.get(node) {
            Some(entry) => match &entry.node {
                Node::Slot(_) => std::slice::from_ref(&entry.id),
                Node::Ordered(c) => &c.priority,
                Node::Grid(g) => &g.composite.priority,
                Node::Container(c) => &c.priority,
            },
            None => &[],
        }
    }

    /// Look up a slot
    pub fn slot(&self, slot: SlotId) -> Option<&Slot> {
        match &self.nodes.get(slot)?.node {
            Node::Slot(slot) => Some(slot),
            _ => None,
        }
    }

    /// Contents of a slot
    pub fn contents(&self, slot: SlotId) -> Option<&StackRecord> {
        self.slot(slot)?.contents()
    }

    /// Number of slots
    pub fn capacity(&self, node: NodeId) -> usize {
        self.slots(node).len()
    }

    /// Index of a slot inside `node`
    pub fn index_of(&self, node: NodeId, slot: SlotId) -> Option<usize> {
        match &self.nodes.get(node)?.node {
            Node::Slot(_) => (node == slot).then_some(0),
            Node::Ordered(c) => c.index_of.get(&slot).copied(),
            Node::Grid(g) => g.composite.index_of.get(&slot).copied(),
            Node::Container(c) => c.index_of(slot),
        }
    }

    /// Slot at an index of `node`
    pub fn slot_at(&self, node: NodeId, index: usize) -> Option<SlotId> {
        self.slots(node).get(index).copied()
    }

    /// Grid dimensions as `(columns, rows)`
    pub fn grid_size(&self, node: NodeId) -> Option<(u32, u32)> {
        match &self.nodes.get(node)?.node {
            Node::Grid(g) => Some((g.columns, g.rows)),
            _ => None,
        }
    }

    /// Slot at a grid cell
    pub fn slot_at_position(&self, grid: NodeId, x: u32, y: u32) -> Option<SlotId> {
        match &self.nodes.get(grid)?.node {
            Node::Grid(g) => g.slot_at(x, y),
            _ => None,
        }
    }

    /// Grid cell of any slot below `grid`
    pub fn position_in_grid(&self, grid: NodeId, slot: SlotId) -> Option<(u32, u32)> {
        match &self.nodes.get(grid)?.node {
            Node::Grid(g) => g.position_of(slot),
            _ => None,
        }
    }

    // ---- properties ----

    /// Resolve a property
    ///
    /// Lookup order: the node's own store, then what the parent reports for
    /// this child, then structural defaults (capacity, title).
    pub fn property(&self, node: NodeId, kind: &PropertyKind, key: Option<&str>) -> Option<PropertyValue> {
        let entry = self.nodes.get(node)?;
        if let Some(value) = entry.properties.get(kind, key) {
            return Some(value.clone());
        }
        if let Some(value) = self.relative_property(entry, kind, key) {
            return Some(value);
        }
        if key.map(|k| k == DEFAULT_KEY).unwrap_or(true) {
            return self.structural_property(entry, kind);
        }
        None
    }

    /// Every value of a property, local ones first
    pub fn properties(&self, node: NodeId, kind: &PropertyKind) -> Vec<PropertyValue> {
        let Some(entry) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut values: Vec<PropertyValue> = entry.properties.get_all(kind).cloned().collect();
        if let Some(parent) = entry.parent.and_then(|p| self.nodes.get(p)) {
            if let Some(child) = parent.node.composite().and_then(|c| c.child(node)) {
                values.extend(child.relative.get_all(kind).cloned());
            }
        }
        if values.is_empty() {
            values.extend(self.relative_property(entry, kind, None));
        }
        if values.is_empty() {
            values.extend(self.structural_property(entry, kind));
        }
        values
    }

    fn relative_property(&self, entry: &NodeEntry, kind: &PropertyKind, key: Option<&str>) -> Option<PropertyValue> {
        let parent = self.nodes.get(entry.parent?)?;

        let structural_key = key.map(|k| k == DEFAULT_KEY).unwrap_or(true);
        match (kind, &parent.node) {
            (PropertyKind::SlotIndex, node) if structural_key => {
                if let Node::Slot(_) = entry.node {
                    let index = node.composite()?.index_of.get(&entry.id)?;
                    return Some(PropertyValue::Int(*index as i64));
                }
            }
            (PropertyKind::SlotPosition, Node::Grid(grid)) if structural_key => {
                let position = grid.composite.position_of(entry.id)?;
                let (x, y) = grid.origins.get(position)?;
                return Some(PropertyValue::Position { x: *x, y: *y });
            }
            _ => {}
        }

        parent
            .node
            .composite()?
            .child(entry.id)?
            .relative
            .get(kind, key)
            .cloned()
    }

    fn structural_property(&self, entry: &NodeEntry, kind: &PropertyKind) -> Option<PropertyValue> {
        match kind {
            PropertyKind::Capacity => Some(PropertyValue::Int(self.capacity(entry.id) as i64)),
            PropertyKind::Title => {
                if let Node::Container(container) = &entry.node {
                    return Some(PropertyValue::Text(self.title(container.top)));
                }
                let key = entry.name.as_deref().unwrap_or(&self.config.default_name);
                Some(PropertyValue::Text(self.context.translator.translate(key)))
            }
            _ => None,
        }
    }

    /// Display title
    pub fn title(&self, node: NodeId) -> String {
        self.property(node, &PropertyKind::Title, None)
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_else(|| self.context.translator.translate(&self.config.default_name))
    }
}

impl Default for InventoryTree {
    fn default() -> Self {
        Self::new(InventoryConfig::default(), InventoryContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeBuilder, DEFAULT_PRIORITY};
    use crate::registry::KeyTranslator;

    fn slot() -> Archetype {
        ArchetypeBuilder::slot().build_archetype("test", "slot").unwrap()
    }

    fn row(count: usize) -> Archetype {
        let slot = slot();
        let mut builder = ArchetypeBuilder::ordered();
        for _ in 0..count {
            builder = builder.add(&slot);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_instantiate_links_parents() {
        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&row(3));

        assert_eq!(tree.kind(node), Some(NodeKind::Ordered));
        assert_eq!(tree.capacity(node), 3);
        for slot in tree.slots(node) {
            assert_eq!(tree.parent(*slot), Some(node));
            assert_eq!(tree.root(*slot), Some(node));
        }
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_first_and_next() {
        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&row(2));

        let first = tree.first(node).unwrap();
        let second = tree.next(first).unwrap();
        assert_eq!(tree.index_of(node, first), Some(0));
        assert_eq!(tree.index_of(node, second), Some(1));
        assert!(tree.next(second).is_none());
    }

    #[test]
    fn test_nested_index_is_depth_first() {
        let inner = row(2);
        let outer = ArchetypeBuilder::ordered()
            .add(&inner)
            .add(&slot())
            .add(&inner)
            .build()
            .unwrap();

        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&outer);
        let children = tree.children(node);

        let expected: Vec<SlotId> = children.iter().flat_map(|c| tree.slots(*c).to_vec()).collect();
        assert_eq!(tree.slots(node), expected.as_slice());
        assert_eq!(tree.capacity(node), 5);
    }

    #[test]
    fn test_priority_reorders_without_touching_index() {
        let outer = ArchetypeBuilder::ordered()
            .add_with_priority(&row(2), DEFAULT_PRIORITY)
            .add_with_priority(&slot(), 2000)
            .build()
            .unwrap();

        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&outer);
        let slots = tree.slots(node).to_vec();

        assert_eq!(tree.priority_slots(node), &[slots[2], slots[0], slots[1]]);
        assert_eq!(tree.index_of(node, slots[2]), Some(2));
    }

    #[test]
    fn test_compose_rejects_owned_nodes() {
        let mut tree = InventoryTree::default();
        let a = tree.instantiate(&row(2));
        let owned_slot = tree.slots(a)[0];

        let err = tree.compose(&[owned_slot]).unwrap_err();
        assert_eq!(err, InventoryError::AlreadyOwned { node: owned_slot });

        let err = tree.compose(&[a, a]).unwrap_err();
        assert_eq!(err, InventoryError::AlreadyOwned { node: a });
    }

    #[test]
    fn test_compose_updates_roots() {
        let mut tree = InventoryTree::default();
        let a = tree.instantiate(&row(2));
        let b = tree.instantiate(&row(1));
        let inner_slot = tree.slots(a)[1];
        assert_eq!(tree.root(inner_slot), Some(a));

        let top = tree.compose(&[a, b]).unwrap();
        assert_eq!(tree.root(inner_slot), Some(top));
        assert_eq!(tree.root(a), Some(top));
        assert_eq!(tree.capacity(top), 3);
    }

    #[test]
    fn test_title_and_capacity_defaults() {
        let context = InventoryContext::default()
            .with_translator(KeyTranslator::new().with_entry("container.chest", "Chest"));
        let mut tree = InventoryTree::new(InventoryConfig::default(), context);

        let named = ArchetypeBuilder::ordered().add(&slot()).name("container.chest").build().unwrap();
        let chest = tree.instantiate(&named);
        let plain = tree.instantiate(&row(2));

        assert_eq!(tree.title(chest), "Chest");
        assert_eq!(tree.title(plain), "inventory.name");
        assert_eq!(
            tree.property(plain, &PropertyKind::Capacity, None),
            Some(PropertyValue::Int(2))
        );
    }

    #[test]
    fn test_local_property_wins_over_parent() {
        let marker = PropertyKind::custom("marker");
        let local = ArchetypeBuilder::slot()
            .property(marker.clone(), PropertyValue::Int(1))
            .build()
            .unwrap();
        let outer = ArchetypeBuilder::ordered()
            .add(&local)
            .child_property(0, marker.clone(), PropertyValue::Int(2))
            .add(&slot())
            .child_property(1, marker.clone(), PropertyValue::Int(3))
            .build()
            .unwrap();

        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&outer);
        let slots = tree.slots(node).to_vec();

        assert_eq!(tree.property(slots[0], &marker, None), Some(PropertyValue::Int(1)));
        assert_eq!(tree.property(slots[1], &marker, None), Some(PropertyValue::Int(3)));
        assert_eq!(tree.properties(slots[0], &marker).len(), 2);
        assert_eq!(
            tree.property(slots[1], &PropertyKind::SlotIndex, None),
            Some(PropertyValue::Int(1))
        );
    }

    #[test]
    fn test_grid_positions() {
        let slot = slot();
        let mut builder = ArchetypeBuilder::grid(2, 2);
        for (x, y) in [(1, 1), (0, 0), (1, 0), (0, 1)] {
            builder = builder.slot_at(x, y, &slot);
        }
        let mut tree = InventoryTree::default();
        let grid = tree.instantiate(&builder.build().unwrap());

        assert_eq!(tree.grid_size(grid), Some((2, 2)));
        let cell = tree.slot_at_position(grid, 1, 0).unwrap();
        assert_eq!(tree.index_of(grid, cell), Some(1));
        assert_eq!(
            tree.property(cell, &PropertyKind::SlotPosition, None),
            Some(PropertyValue::Position { x: 1, y: 0 })
        );
        // equal priorities fall back to cell order
        assert_eq!(tree.priority_slots(grid), tree.slots(grid));
    }

    #[test]
    fn test_remove_tree() {
        let mut tree = InventoryTree::default();
        let node = tree.instantiate(&row(2));
        let slot = tree.slots(node)[0];

        assert!(matches!(tree.remove(slot), Err(InventoryError::AlreadyOwned { .. })));
        tree.remove(node).unwrap();
        assert!(tree.is_empty());
        assert!(tree.slot(slot).is_none());
    }

    #[test]
    fn test_instantiate_unknown_id() {
        let mut tree = InventoryTree::default();
        let err = tree.instantiate_id(&ArchetypeId::new("test", "missing")).unwrap_err();
        assert_eq!(err, InventoryError::UnknownArchetype("test:missing".to_string()));
    }
}
