//! Per-cycle port declarations and the results handed back to nodes.

use crate::{Direction, NodeId, PortRef};

/// Word moved between nodes. The engine never computes on it.
pub type Value = i8;

/// What a node wants to do with its ports this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Intent {
    /// No port operation.
    #[default]
    Idle,
    /// Receive one value through the port.
    Read(PortRef),
    /// Send `value` through the port.
    Write(PortRef, Value),
}

impl Intent {
    /// Read from the neighbor in `direction`.
    #[must_use]
    pub const fn read(direction: Direction) -> Self {
        Self::Read(PortRef::Dir(direction))
    }

    /// Read from whichever neighbor wins arbitration.
    #[must_use]
    pub const fn read_any() -> Self {
        Self::Read(PortRef::Any)
    }

    /// Write `value` to the neighbor in `direction`.
    #[must_use]
    pub const fn write(direction: Direction, value: Value) -> Self {
        Self::Write(PortRef::Dir(direction), value)
    }

    /// Write `value` to whichever neighbor wins arbitration.
    #[must_use]
    pub const fn write_any(value: Value) -> Self {
        Self::Write(PortRef::Any, value)
    }

    /// Port named by this intent, if any.
    #[must_use]
    pub const fn port(self) -> Option<PortRef> {
        match self {
            Self::Idle => None,
            Self::Read(port) | Self::Write(port, _) => Some(port),
        }
    }

    /// Returns true for `Idle`.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Outcome of one cycle for a single compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CommitResult {
    /// The node's read was satisfied.
    Delivered {
        /// Value received.
        value: Value,
        /// Port the value arrived through.
        from: Direction,
    },
    /// The node's write was accepted.
    Sent {
        /// Port the value left through.
        to: Direction,
    },
    /// No counterpart this cycle; the node must present the same intent again.
    Stalled,
    /// The node was idle and took part in no transfer.
    Idle,
}

impl CommitResult {
    /// Returns true when the node may advance its control flow.
    #[must_use]
    pub const fn advances(self) -> bool {
        !matches!(self, Self::Stalled)
    }

    /// Delivered value, if this result satisfied a read.
    #[must_use]
    pub const fn delivered(self) -> Option<Value> {
        match self {
            Self::Delivered { value, .. } => Some(value),
            Self::Sent { .. } | Self::Stalled | Self::Idle => None,
        }
    }

    /// Port the transfer used, with `ANY` already resolved.
    ///
    /// Nodes that support a `LAST` port remember this after an `ANY` commit.
    #[must_use]
    pub const fn port_used(self) -> Option<Direction> {
        match self {
            Self::Delivered { from, .. } => Some(from),
            Self::Sent { to } => Some(to),
            Self::Stalled | Self::Idle => None,
        }
    }
}

/// Why a node received [`CommitResult::Stalled`].
///
/// Collaborators only ever see `Stalled`; the reason is kept for diagnostics
/// and trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StallReason {
    /// No neighbor offered a compatible counterpart.
    NoCounterpart,
    /// The node read from a stack that held no value.
    EmptyStack,
    /// A compatible counterpart existed but went to a higher-priority node.
    Contended,
}

/// A committed value exchange between one writer and one reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Transfer {
    /// Sending node. A stack node here means a pop.
    pub writer: NodeId,
    /// Receiving node. A stack node here means a push.
    pub reader: NodeId,
    /// Value moved.
    pub value: Value,
}
