//! Host-facing contracts for driving the engine from an emulator.

use crate::{CommitResult, Intent, NodeId, StallReason, Transfer, Value};

/// Default number of consecutive fully stalled cycles that count as deadlock.
pub const DEFAULT_DEADLOCK_THRESHOLD: u32 = 1;

/// Default upper bound on cycles executed by one `run_until` call.
pub const DEFAULT_MAX_CYCLES_PER_RUN: u64 = 1_000_000;

/// Engine configuration. Priority tables are fixed and not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EngineConfig {
    /// Enables deterministic trace callback dispatch.
    pub tracing_enabled: bool,
    /// Consecutive cycles with every compute node stalled before reporting deadlock.
    pub deadlock_threshold: u32,
    /// Hard cap on cycles executed by a single run call.
    pub max_cycles_per_run: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: false,
            deadlock_threshold: DEFAULT_DEADLOCK_THRESHOLD,
            max_cycles_per_run: DEFAULT_MAX_CYCLES_PER_RUN,
        }
    }
}

/// The compute nodes of a grid, as seen by the engine.
///
/// The engine pulls one intent per compute node per cycle and pushes back one
/// result. Stack nodes are never polled.
pub trait NodeCollaborator {
    /// Returns the node's intent for the current cycle.
    ///
    /// A node that stalled last cycle must return the same intent again.
    fn intent_of(&mut self, node: NodeId) -> Intent;

    /// Delivers the node's result for the cycle just resolved.
    fn commit(&mut self, node: NodeId, result: CommitResult);
}

/// Everything one committed cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Zero-based index of the cycle.
    pub cycle: u64,
    /// Committed transfers in commit order.
    pub transfers: Vec<Transfer>,
    /// Result delivered to each compute node, in node order.
    pub results: Vec<(NodeId, CommitResult)>,
    /// Stalled compute nodes with the reason, in node order.
    pub stalls: Vec<(NodeId, StallReason)>,
}

impl CycleReport {
    /// Returns true when at least one compute node was polled and every one stalled.
    #[must_use]
    pub fn is_fully_stalled(&self) -> bool {
        !self.results.is_empty()
            && self
                .results
                .iter()
                .all(|(_, result)| *result == CommitResult::Stalled)
    }
}

/// Run loop boundary modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunBoundary {
    /// Stop after this many cycles.
    Cycles(u64),
    /// Stop once deadlock is detected.
    Deadlock,
}

/// Why a run call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The requested number of cycles ran.
    CycleLimit,
    /// Every compute node stalled for the configured number of cycles.
    Deadlock,
    /// `max_cycles_per_run` was reached first.
    RunCapReached,
}

/// Aggregated outcome of a run call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Cycles committed during this call.
    pub cycles: u64,
    /// Why the call returned.
    pub stop: StopReason,
}

/// Deterministic trace events emitted in commit order when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// A cycle resolved and is about to commit.
    CycleStart {
        /// Zero-based cycle index.
        cycle: u64,
    },
    /// A transfer was committed.
    TransferCommitted(Transfer),
    /// A compute node stalled.
    NodeStalled {
        /// Stalled node.
        node: NodeId,
        /// Why it stalled.
        reason: StallReason,
    },
    /// A stack applied this cycle's effects.
    StackApplied {
        /// Stack node.
        stack: NodeId,
        /// Value popped against the pre-cycle state, if any.
        popped: Option<Value>,
        /// Number of values pushed.
        pushed: usize,
        /// Depth after the cycle.
        depth: usize,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in commit order.
    fn on_event(&mut self, event: TraceEvent);
}
