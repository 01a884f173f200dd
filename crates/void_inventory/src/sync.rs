//! Viewer synchronization contract
//!
//! The core never encodes packets. It tells a [`ViewerTransport`] which slot
//! sits behind which wire index, pushes a full snapshot when a viewer
//! attaches and pushes a delta for every bound slot that changes, before the
//! mutating call returns. Batching belongs to the transport.

use crate::archetype::ArchetypeId;
use crate::arena::SlotId;
use crate::item::StackRecord;
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire index of the container cursor
pub const CURSOR_WIRE_INDEX: i32 = -1;

/// Remote observer of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// One bound slot in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSlot {
    pub index: i32,
    pub contents: Option<StackRecord>,
}

/// Full container state sent when a viewer attaches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub title: String,
    /// Archetype of the top inventory
    pub archetype: Option<ArchetypeId>,
    /// Bound slots in wire order, cursor excluded
    pub slots: Vec<WireSlot>,
    pub cursor: Option<StackRecord>,
}

/// Transport collaborator
pub trait ViewerTransport: Send + Sync {
    /// A slot was bound to a wire index for a viewer
    fn bind(&self, viewer: ViewerId, wire_index: i32, slot: SlotId);

    /// A bound slot changed
    fn push_delta(&self, viewer: ViewerId, wire_index: i32, contents: Option<&StackRecord>);

    /// Initial state for a freshly attached viewer
    fn push_full_state(&self, viewer: ViewerId, snapshot: &ContainerSnapshot);

    /// The viewer detached; its bindings are gone
    fn release(&self, _viewer: ViewerId) {}
}

/// Transport that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl ViewerTransport for NullTransport {
    fn bind(&self, _viewer: ViewerId, _wire_index: i32, _slot: SlotId) {}

    fn push_delta(&self, _viewer: ViewerId, _wire_index: i32, _contents: Option<&StackRecord>) {}

    fn push_full_state(&self, _viewer: ViewerId, _snapshot: &ContainerSnapshot) {}
}

/// Outbound message produced by [`ChannelTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    Bind {
        viewer: ViewerId,
        wire_index: i32,
        slot: SlotId,
    },
    Delta {
        viewer: ViewerId,
        wire_index: i32,
        contents: Option<StackRecord>,
    },
    FullState {
        viewer: ViewerId,
        snapshot: ContainerSnapshot,
    },
    Release {
        viewer: ViewerId,
    },
}

impl SyncMessage {
    /// Viewer the message is addressed to
    pub fn viewer(&self) -> ViewerId {
        match self {
            Self::Bind { viewer, .. }
            | Self::Delta { viewer, .. }
            | Self::FullState { viewer, .. }
            | Self::Release { viewer } => *viewer,
        }
    }
}

/// Transport forwarding messages over a channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: Sender<SyncMessage>,
}

impl ChannelTransport {
    pub fn new(sender: Sender<SyncMessage>) -> Self {
        Self { sender }
    }

    /// Create a transport with an unbounded channel
    pub fn unbounded() -> (Self, Receiver<SyncMessage>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), receiver)
    }

    fn send(&self, message: SyncMessage) {
        if self.sender.send(message).is_err() {
            log::debug!("Sync channel disconnected, dropping message");
        }
    }
}

impl ViewerTransport for ChannelTransport {
    fn bind(&self, viewer: ViewerId, wire_index: i32, slot: SlotId) {
        self.send(SyncMessage::Bind {
            viewer,
            wire_index,
            slot,
        });
    }

    fn push_delta(&self, viewer: ViewerId, wire_index: i32, contents: Option<&StackRecord>) {
        self.send(SyncMessage::Delta {
            viewer,
            wire_index,
            contents: contents.cloned(),
        });
    }

    fn push_full_state(&self, viewer: ViewerId, snapshot: &ContainerSnapshot) {
        self.send(SyncMessage::FullState {
            viewer,
            snapshot: snapshot.clone(),
        });
    }

    fn release(&self, viewer: ViewerId) {
        self.send(SyncMessage::Release { viewer });
    }
}
