//! Listener registration and dispatch
//!
//! Listeners are attached to a node and fire for events inside that node's
//! subtree. A failing listener never aborts the mutation that triggered it
//! and never prevents the remaining listeners from running; the failure is
//! logged and forwarded to the diagnostics channel set with
//! [`InventoryTree::set_diagnostics`].

use crate::arena::{NodeId, SlotId};
use crate::error::{InventoryError, ListenerError, Result};
use crate::inventory::{InventoryTree, Node};
use crate::item::StackRecord;
use crate::sync::ViewerId;
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Handle used to remove a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A slot inside the listened node changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    /// Node the listener is attached to
    pub inventory: NodeId,
    pub slot: SlotId,
    pub before: Option<StackRecord>,
    pub after: Option<StackRecord>,
}

/// Viewer attach state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Attached,
    Detached,
}

/// A viewer attached to or detached from a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEvent {
    pub container: NodeId,
    pub viewer: ViewerId,
    pub action: ViewAction,
}

/// A viewer closed a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseEvent {
    pub container: NodeId,
    pub viewer: ViewerId,
    /// The container is discarded after this event
    pub discarded: bool,
}

/// How a listener failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Returned an error
    Error,
    /// Panicked
    Panic,
}

/// Listener failure report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub listener: ListenerId,
    pub node: NodeId,
    pub event: &'static str,
    pub kind: FailureKind,
    pub message: String,
}

type Callback<E> = Arc<dyn Fn(&E) -> std::result::Result<(), ListenerError> + Send + Sync>;

struct Registry<E> {
    by_node: HashMap<NodeId, Vec<(ListenerId, Callback<E>)>>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            by_node: HashMap::new(),
        }
    }
}

impl<E> Registry<E> {
    fn add(&mut self, node: NodeId, id: ListenerId, callback: Callback<E>) {
        self.by_node.entry(node).or_default().push((id, callback));
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for listeners in self.by_node.values_mut() {
            let before = listeners.len();
            listeners.retain(|(lid, _)| *lid != id);
            removed |= listeners.len() != before;
        }
        self.by_node.retain(|_, listeners| !listeners.is_empty());
        removed
    }

    fn snapshot(&self, node: NodeId) -> Vec<(ListenerId, Callback<E>)> {
        self.by_node.get(&node).cloned().unwrap_or_default()
    }
}

/// Listeners of one inventory tree
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    slot_change: Registry<SlotChange>,
    view: Registry<ViewEvent>,
    close: Registry<CloseEvent>,
    diagnostics: Option<Sender<Diagnostic>>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    /// Drop every listener attached to a node
    pub fn forget(&mut self, node: NodeId) {
        self.slot_change.by_node.remove(&node);
        self.view.by_node.remove(&node);
        self.close.by_node.remove(&node);
    }

    fn dispatch<E>(&self, registry: &Registry<E>, node: NodeId, name: &'static str, event: &E, isolate: bool) {
        for (id, callback) in registry.snapshot(node) {
            let outcome = if isolate {
                catch_listener(|| callback(event))
            } else {
                callback(event).map_err(|e| (FailureKind::Error, e.0))
            };

            if let Err((kind, message)) = outcome {
                log::warn!("Inventory listener {:?} on {} failed during {}: {}", id, node, name, message);
                if let Some(diagnostics) = &self.diagnostics {
                    let diagnostic = Diagnostic {
                        listener: id,
                        node,
                        event: name,
                        kind,
                        message,
                    };
                    if let Err(e) = diagnostics.send(diagnostic) {
                        log::warn!("Dropped listener diagnostic for {}: receiver disconnected ({:?})", node, e.0.listener);
                    }
                }
            }
        }
    }
}

fn catch_listener<F>(f: F) -> std::result::Result<(), (FailureKind, String)>
where
    F: FnOnce() -> std::result::Result<(), ListenerError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err((FailureKind::Error, e.0)),
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            Err((FailureKind::Panic, message))
        }
    }
}

impl InventoryTree {
    /// Route listener failures to a channel owned by the caller
    pub fn set_diagnostics(&mut self, sender: Sender<Diagnostic>) {
        self.listeners.diagnostics = Some(sender);
    }

    /// Listen for slot changes anywhere below `node`
    ///
    /// Listeners on a container also see changes of every bound slot.
    pub fn on_slot_change<F>(&mut self, node: NodeId, f: F) -> Result<ListenerId>
    where
        F: Fn(&SlotChange) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        if !self.nodes.contains(node) {
            return Err(InventoryError::UnknownNode(node));
        }
        let id = self.listeners.next_id();
        self.listeners.slot_change.add(node, id, Arc::new(f));
        Ok(id)
    }

    /// Listen for viewers attaching to and detaching from a container
    pub fn on_view<F>(&mut self, container: NodeId, f: F) -> Result<ListenerId>
    where
        F: Fn(&ViewEvent) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.container_node(container)?;
        let id = self.listeners.next_id();
        self.listeners.view.add(container, id, Arc::new(f));
        Ok(id)
    }

    /// Listen for viewers closing a container
    pub fn on_close<F>(&mut self, container: NodeId, f: F) -> Result<ListenerId>
    where
        F: Fn(&CloseEvent) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.container_node(container)?;
        let id = self.listeners.next_id();
        self.listeners.close.add(container, id, Arc::new(f));
        Ok(id)
    }

    /// Remove a listener; returns false if it was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.slot_change.remove(id) | self.listeners.view.remove(id) | self.listeners.close.remove(id)
    }

    pub(crate) fn notify_slot_change(&self, slot: SlotId, before: &Option<StackRecord>, after: &Option<StackRecord>) {
        let isolate = self.config.isolate_listener_panics;
        let mut targets: Vec<NodeId> = self.ancestors(slot);
        for &container in &self.containers {
            if let Some(Node::Container(c)) = self.nodes.get(container).map(|e| &e.node) {
                if c.binds(slot) && !targets.contains(&container) {
                    targets.push(container);
                }
            }
        }

        for node in targets {
            let event = SlotChange {
                inventory: node,
                slot,
                before: before.clone(),
                after: after.clone(),
            };
            self.listeners
                .dispatch(&self.listeners.slot_change, node, "slot change", &event, isolate);
        }
    }

    pub(crate) fn notify_view(&self, event: ViewEvent) {
        let isolate = self.config.isolate_listener_panics;
        self.listeners
            .dispatch(&self.listeners.view, event.container, "view", &event, isolate);
    }

    pub(crate) fn notify_close(&self, event: CloseEvent) {
        let isolate = self.config.isolate_listener_panics;
        self.listeners
            .dispatch(&self.listeners.close, event.container, "close", &event, isolate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_listener_error() {
        let result = catch_listener(|| Err(ListenerError::from("nope")));
        assert_eq!(result, Err((FailureKind::Error, "nope".to_string())));
    }

    #[test]
    fn test_catch_listener_panic() {
        let result = catch_listener(|| panic!("listener blew up"));
        assert_eq!(result, Err((FailureKind::Panic, "listener blew up".to_string())));
    }

    #[test]
    fn test_registry_remove() {
        let mut registry: Registry<SlotChange> = Registry::default();
        let node = NodeId::new(0, 0);
        let noop: Callback<SlotChange> = Arc::new(|_: &SlotChange| Ok::<(), ListenerError>(()));
        registry.add(node, ListenerId(1), noop.clone());
        registry.add(node, ListenerId(2), noop);

        assert!(registry.remove(ListenerId(1)));
        assert!(!registry.remove(ListenerId(1)));
        assert_eq!(registry.snapshot(node).len(), 1);
    }

    #[test]
    fn test_dispatch_survives_dropped_diagnostics() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (sender, receiver) = crossbeam_channel::unbounded();
        drop(receiver);
        let mut listeners = Listeners {
            diagnostics: Some(sender),
            ..Default::default()
        };

        let node = NodeId::new(0, 0);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let failing: Callback<SlotChange> = Arc::new(|_: &SlotChange| Err::<(), _>(ListenerError::from("nope")));
        let counting: Callback<SlotChange> = Arc::new(move |_: &SlotChange| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), ListenerError>(())
        });
        listeners.slot_change.add(node, ListenerId(1), failing);
        listeners.slot_change.add(node, ListenerId(2), counting);

        let event = SlotChange {
            inventory: node,
            slot: node,
            before: None,
            after: Some(StackRecord::single("stone")),
        };
        listeners.dispatch(&listeners.slot_change, node, "slot change", &event, true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
