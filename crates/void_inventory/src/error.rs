//! Error types for inventory construction and misuse

use crate::arena::NodeId;
use thiserror::Error;

/// Inventory errors
///
/// Construction variants are fatal at build time. Ordinary operation
/// outcomes are reported through
/// [`TransactionResult`](crate::transaction::TransactionResult) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Declared capacity does not match the slots that were inserted
    #[error("Capacity mismatch in {builder} builder for archetype {archetype}: declared {declared} slots, found {found}")]
    CapacityMismatch {
        builder: &'static str,
        archetype: String,
        declared: usize,
        found: usize,
    },
    /// A child position past the children added so far
    #[error("Child position {position} in {builder} builder for archetype {archetype} is past its {children} children")]
    ChildPosition {
        builder: &'static str,
        archetype: String,
        position: usize,
        children: usize,
    },
    /// An explicit priority order is not a permutation of the slot indices
    #[error("Priority order of archetype {archetype} covers {found} slots, expected a permutation of {expected}")]
    PrioritySetMismatch {
        archetype: String,
        expected: usize,
        found: usize,
    },
    /// The builder never selected which node variant to produce
    #[error("No inventory factory selected for archetype {archetype}")]
    MissingFactory { archetype: String },
    /// A grid cell or ordered position was filled twice
    #[error("Position ({x}, {y}) of archetype {archetype} is already occupied")]
    PositionOccupied { archetype: String, x: u32, y: u32 },
    /// A row or sub-grid does not fit the grid it is placed in
    #[error("Archetype {child} does not fit a {columns} column grid in {archetype}")]
    ShapeMismatch {
        archetype: String,
        child: String,
        columns: u32,
    },
    /// A builder option was used on a node variant that does not support it
    #[error("Archetype {archetype}: {message}")]
    InvalidBuilder { archetype: String, message: String },
    /// The node already has a parent
    #[error("Node {node} is already owned by another inventory")]
    AlreadyOwned { node: NodeId },
    /// An archetype with this id is already registered
    #[error("Archetype already registered: {0}")]
    DuplicateArchetype(String),
    /// No archetype with this id is registered
    #[error("Archetype not found: {0}")]
    UnknownArchetype(String),
    /// The handle does not refer to a live node
    #[error("Unknown or stale node: {0}")]
    UnknownNode(NodeId),
    /// The node is not a container
    #[error("Node {0} is not a container")]
    NotAContainer(NodeId),
    /// The node is still referenced by a container
    #[error("Node {node} is still referenced by container {container}")]
    InUse { node: NodeId, container: NodeId },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Error returned by a listener callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl From<&str> for ListenerError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ListenerError {
    fn from(s: String) -> Self {
        Self(s)
    }
}
