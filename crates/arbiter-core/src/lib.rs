//! Cycle arbitration engine for a tile-grid virtual machine.

/// Port directions, `ANY`, and the fixed priority tables.
pub mod direction;
pub use direction::{
    priority_order, rank, Direction, PortRef, PriorityRole, DESTINATION_PRIORITY, DIRECTION_COUNT,
    SOURCE_PRIORITY,
};

/// Per-cycle intents, commit results, and transfers.
pub mod intent;
pub use intent::{CommitResult, Intent, StallReason, Transfer, Value};

/// Immutable grid topology and layout description.
pub mod grid;
pub use grid::{Coord, Grid, GridLayout, NodeId, NodeKind};

/// Passive LIFO stack nodes.
pub mod stack;
pub use stack::{StackBank, StackEffect, StackNode, StackPush};

/// Error taxonomy for intent sets, layouts, and stack preloads.
pub mod fault;
pub use fault::{ArbitrationError, LayoutError, StackError};

/// Pure per-cycle resolution of contested reads and writes.
pub mod arbiter;
pub use arbiter::{resolve, Resolution};

/// Host-facing configuration, collaborator, and trace contracts.
pub mod api;
pub use api::{
    CycleReport, EngineConfig, NodeCollaborator, RunBoundary, RunOutcome, StopReason, TraceEvent,
    TraceSink, DEFAULT_DEADLOCK_THRESHOLD, DEFAULT_MAX_CYCLES_PER_RUN,
};

/// Saturating activity counters.
pub mod diag;
pub use diag::CycleCounters;

/// Lock-step cycle driver.
pub mod stepper;
pub use stepper::CycleStepper;

#[cfg(test)]
use proptest as _;
