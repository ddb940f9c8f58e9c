use thiserror::Error;

use crate::{Coord, Direction, NodeId};

/// Defects in the intent set presented for one cycle.
///
/// These are collaborator or grid-definition bugs, not runtime conditions:
/// a cycle that raises one is rejected whole and nothing is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArbitrationError {
    /// An intent named a direction with no neighbor in the topology.
    #[error("node {node} names port {direction} but has no neighbor there")]
    MalformedIntent {
        /// Node that issued the intent.
        node: NodeId,
        /// Direction it named.
        direction: Direction,
    },
    /// A stack node was given a non-idle intent.
    #[error("stack node {node} is passive and cannot issue intents")]
    PassiveNodeIntent {
        /// Offending stack node.
        node: NodeId,
    },
    /// The intent slice does not cover every node exactly once.
    #[error("expected {expected} intents, got {actual}")]
    IntentCountMismatch {
        /// Node count of the grid.
        expected: usize,
        /// Length of the supplied intent set.
        actual: usize,
    },
}

/// Rejected grid layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LayoutError {
    /// Two layout entries share a coordinate.
    #[error("duplicate node at {0}")]
    DuplicateCoord(Coord),
    /// The layout has no nodes.
    #[error("layout contains no nodes")]
    Empty,
}

/// Rejected stack preload requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum StackError {
    /// The node is not a stack node.
    #[error("node {0} is not a stack node")]
    NotAStack(NodeId),
}
