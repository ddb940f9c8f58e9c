use super::{Ledger, Pairing};
use crate::{priority_order, Direction, Intent, NodeId, PortRef, PriorityRole, StallReason};

/// Resolves `ANY` readers and explicit stack readers in row-major order.
///
/// Row-major order over a stack's neighbors is `UP, LEFT, RIGHT, DOWN` as seen
/// from the stack, so the first reader to claim a pop is also the one with the
/// highest source priority relative to that stack.
pub(super) fn resolve_readers(ledger: &mut Ledger<'_>) {
    let grid = ledger.grid;
    for reader in grid.compute_ids() {
        if ledger.is_settled(reader) {
            continue;
        }
        let Intent::Read(port) = ledger.intent(reader) else {
            continue;
        };

        let stack = match port {
            PortRef::Any => None,
            PortRef::Dir(direction) => match grid.neighbor(reader, direction) {
                Some(neighbor) if grid.is_stack(neighbor) => Some(neighbor),
                // Explicit compute-to-compute reads settle in the direct or writer pass.
                _ => continue,
            },
        };

        let matched = select(ledger, reader, port, PriorityRole::Source);
        if let Some(stack) = stack {
            if !matched && ledger.stacks.top(stack).is_none() {
                ledger.mark_stalled(reader, StallReason::EmptyStack);
            }
        }
    }
}

/// Resolves `ANY` writers in row-major order by destination priority.
///
/// An `ANY` writer already taken by the reader pass leaves its explicit
/// readers contended rather than unmatched.
pub(super) fn resolve_writers(ledger: &mut Ledger<'_>) {
    let grid = ledger.grid;
    for writer in grid.compute_ids() {
        let Intent::Write(PortRef::Any, _) = ledger.intent(writer) else {
            continue;
        };
        if ledger.is_settled(writer) {
            mark_losing_readers(ledger, writer);
        } else {
            select(ledger, writer, PortRef::Any, PriorityRole::Destination);
        }
    }
}

fn mark_losing_readers(ledger: &mut Ledger<'_>, writer: NodeId) {
    let grid = ledger.grid;
    for direction in Direction::ALL {
        let Some(reader) = grid.neighbor(writer, direction) else {
            continue;
        };
        if ledger.pairing(writer, reader) == Pairing::Claimed {
            ledger.mark_stalled(reader, StallReason::Contended);
        }
    }
}

/// Commits the best open counterpart of `node` through `port`.
///
/// `role` is the side `node` plays in the choice: `Source` when it reads and
/// picks a writer, `Destination` when it writes and picks a reader. Open
/// candidates that lose are marked contended, and `node` itself is marked
/// contended when every compatible counterpart was already claimed.
fn select(ledger: &mut Ledger<'_>, node: NodeId, port: PortRef, role: PriorityRole) -> bool {
    let grid = ledger.grid;
    let mut winner = None;
    let mut claimed = false;

    for &direction in priority_order(role) {
        if !port.admits(direction) {
            continue;
        }
        let Some(other) = grid.neighbor(node, direction) else {
            continue;
        };
        let (writer, reader) = match role {
            PriorityRole::Source => (other, node),
            PriorityRole::Destination => (node, other),
        };

        match ledger.pairing(writer, reader) {
            Pairing::Open(value) if winner.is_none() => winner = Some((writer, reader, value)),
            Pairing::Open(_) => ledger.mark_stalled(other, StallReason::Contended),
            Pairing::Claimed => claimed = true,
            Pairing::Incompatible => {}
        }
    }

    match winner {
        Some((writer, reader, value)) => {
            ledger.commit(writer, reader, value);
            true
        }
        None => {
            if claimed {
                ledger.mark_stalled(node, StallReason::Contended);
            }
            false
        }
    }
}
