//! Cross-node arbitration for one cycle.
//!
//! Resolution is a pure function of `(topology, intents, stack contents)`.
//! Passes run in a fixed order, each walking nodes in row-major index order:
//! 1. Validate the intent set
//! 2. Pair explicit writers with explicit readers, and explicit pushes
//! 3. Resolve `ANY` readers and explicit stack readers by source priority
//! 4. Resolve `ANY` writers by destination priority
//! 5. Stall everything left over, then order stack pushes
//!
//! A node settled by an earlier pass is out of the candidate pool for every
//! later choice, so no writer value is handed out twice.

mod any;
mod edge;

use std::collections::BTreeMap;

use crate::{
    ArbitrationError, CommitResult, Grid, Intent, NodeId, NodeKind, StackBank, StackEffect,
    StackPush, StallReason, Transfer, Value,
};

/// Conflict-free outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Committed transfers, in commit order.
    pub transfers: Vec<Transfer>,
    /// Result per node index; `None` for stack nodes.
    pub results: Vec<Option<CommitResult>>,
    /// Stalled compute nodes with the reason, in node order.
    pub stalls: Vec<(NodeId, StallReason)>,
    /// Per-stack effects for stacks touched this cycle, pushes already ordered.
    pub stack_effects: BTreeMap<NodeId, StackEffect>,
}

impl Resolution {
    /// Result for `node`; `None` for stack nodes and unknown ids.
    #[must_use]
    pub fn result(&self, node: NodeId) -> Option<CommitResult> {
        self.results.get(node.index()).copied().flatten()
    }

    /// Compute node results in node order.
    pub fn node_results(&self) -> impl Iterator<Item = (NodeId, CommitResult)> + '_ {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, result)| result.map(|result| (NodeId::new(index), result)))
    }

    /// Effect committed against the stack at `node`, if it was touched.
    #[must_use]
    pub fn stack_effect(&self, node: NodeId) -> Option<&StackEffect> {
        self.stack_effects.get(&node)
    }
}

/// Resolves every intent of one cycle into transfers and commit results.
///
/// `intents` is indexed by [`NodeId`]; stack nodes must carry [`Intent::Idle`].
/// `stacks` is the stack state from before this cycle and is not modified.
///
/// # Errors
///
/// Returns [`ArbitrationError`] when the intent set does not match the grid,
/// a stack node carries an intent, or an explicit port names a missing neighbor.
pub fn resolve(
    grid: &Grid,
    intents: &[Intent],
    stacks: &StackBank,
) -> Result<Resolution, ArbitrationError> {
    edge::validate(grid, intents)?;

    let mut ledger = Ledger::new(grid, intents, stacks);
    edge::pair_direct(&mut ledger);
    any::resolve_readers(&mut ledger);
    any::resolve_writers(&mut ledger);

    Ok(ledger.finish())
}

/// Whether a writer/reader pair can exchange a value right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairing {
    /// Both sides are compatible and still free.
    Open(Value),
    /// Compatible, but one side already committed this cycle.
    Claimed,
    /// The intents do not name each other.
    Incompatible,
}

/// Working state for one resolution.
struct Ledger<'a> {
    grid: &'a Grid,
    intents: &'a [Intent],
    stacks: &'a StackBank,
    /// Compute node: its intent committed. Stack node: its single pop is taken.
    settled: Vec<bool>,
    reasons: Vec<Option<StallReason>>,
    transfers: Vec<Transfer>,
    results: Vec<Option<CommitResult>>,
    stack_effects: BTreeMap<NodeId, StackEffect>,
}

impl<'a> Ledger<'a> {
    fn new(grid: &'a Grid, intents: &'a [Intent], stacks: &'a StackBank) -> Self {
        Self {
            grid,
            intents,
            stacks,
            settled: vec![false; grid.len()],
            reasons: vec![None; grid.len()],
            transfers: Vec::new(),
            results: vec![None; grid.len()],
            stack_effects: BTreeMap::new(),
        }
    }

    fn intent(&self, node: NodeId) -> Intent {
        self.intents.get(node.index()).copied().unwrap_or_default()
    }

    fn is_settled(&self, node: NodeId) -> bool {
        self.settled.get(node.index()).copied().unwrap_or(true)
    }

    /// Value `writer` would hand to `reader`, ignoring claims made this cycle.
    fn offered_value(&self, writer: NodeId, reader: NodeId) -> Option<Value> {
        let toward_reader = self.grid.direction_to(writer, reader)?;
        match self.grid.kind(writer)? {
            NodeKind::Compute => match self.intent(writer) {
                Intent::Write(port, value) if port.admits(toward_reader) => Some(value),
                Intent::Write(..) | Intent::Read(_) | Intent::Idle => None,
            },
            NodeKind::Stack => {
                if self.grid.is_stack(reader) {
                    None
                } else {
                    self.stacks.top(writer)
                }
            }
        }
    }

    /// Whether `reader` takes values from `writer`, ignoring claims made this cycle.
    fn accepts(&self, reader: NodeId, writer: NodeId) -> bool {
        let Some(toward_writer) = self.grid.direction_to(reader, writer) else {
            return false;
        };
        match self.grid.kind(reader) {
            Some(NodeKind::Compute) => {
                matches!(self.intent(reader), Intent::Read(port) if port.admits(toward_writer))
            }
            Some(NodeKind::Stack) => !self.grid.is_stack(writer),
            None => false,
        }
    }

    fn pairing(&self, writer: NodeId, reader: NodeId) -> Pairing {
        let Some(value) = self.offered_value(writer, reader) else {
            return Pairing::Incompatible;
        };
        if !self.accepts(reader, writer) {
            return Pairing::Incompatible;
        }
        // Stacks take any number of pushes, so only a compute reader can be claimed.
        let reader_claimed = !self.grid.is_stack(reader) && self.is_settled(reader);
        if self.is_settled(writer) || reader_claimed {
            Pairing::Claimed
        } else {
            Pairing::Open(value)
        }
    }

    fn commit(&mut self, writer: NodeId, reader: NodeId, value: Value) {
        let Some(toward_reader) = self.grid.direction_to(writer, reader) else {
            return;
        };
        let toward_writer = toward_reader.opposite();
        self.transfers.push(Transfer {
            writer,
            reader,
            value,
        });

        if self.grid.is_stack(writer) {
            self.stack_effects.entry(writer).or_default().pop = Some(reader);
        } else {
            self.results[writer.index()] = Some(CommitResult::Sent { to: toward_reader });
        }
        self.settled[writer.index()] = true;

        if self.grid.is_stack(reader) {
            self.stack_effects
                .entry(reader)
                .or_default()
                .pushes
                .push(StackPush {
                    writer,
                    from: toward_writer,
                    value,
                });
        } else {
            self.results[reader.index()] = Some(CommitResult::Delivered {
                value,
                from: toward_writer,
            });
            self.settled[reader.index()] = true;
        }
    }

    fn mark_stalled(&mut self, node: NodeId, reason: StallReason) {
        if !self.grid.is_stack(node) && !self.is_settled(node) {
            self.reasons[node.index()] = Some(reason);
        }
    }

    fn finish(mut self) -> Resolution {
        let mut stalls = Vec::new();
        for node in self.grid.compute_ids() {
            if self.results[node.index()].is_some() {
                continue;
            }
            let result = if self.intent(node).is_idle() {
                CommitResult::Idle
            } else {
                let reason = self.reasons[node.index()].unwrap_or(StallReason::NoCounterpart);
                stalls.push((node, reason));
                CommitResult::Stalled
            };
            self.results[node.index()] = Some(result);
        }

        for effect in self.stack_effects.values_mut() {
            effect.order_pushes();
        }

        Resolution {
            transfers: self.transfers,
            results: self.results,
            stalls,
            stack_effects: self.stack_effects,
        }
    }
}
