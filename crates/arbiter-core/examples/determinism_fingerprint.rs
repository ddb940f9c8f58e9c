//! Deterministic replay fingerprint used for cross-host comparison.
//!
//! Runs a fixed mixed workload of explicit, `ANY`, and stack traffic and
//! prints an FNV-1a hash of every committed transfer and the final stacks.

use arbiter_core::{
    CommitResult, Coord, CycleStepper, Direction, EngineConfig, Grid, GridLayout, Intent,
    NodeCollaborator, NodeId, RunBoundary, TraceEvent, TraceSink,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Looping per-node programs; a node moves on only when its intent committed.
struct Looping {
    programs: Vec<Vec<Intent>>,
    ip: Vec<usize>,
}

impl NodeCollaborator for Looping {
    fn intent_of(&mut self, node: NodeId) -> Intent {
        let program = &self.programs[node.index()];
        if program.is_empty() {
            return Intent::Idle;
        }
        program[self.ip[node.index()] % program.len()]
    }

    fn commit(&mut self, node: NodeId, result: CommitResult) {
        if result.advances() {
            self.ip[node.index()] = self.ip[node.index()].wrapping_add(1);
        }
    }
}

struct Hasher(u64);

impl Hasher {
    fn bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(0x1000_0000_01B3);
        }
    }

    fn node(&mut self, node: NodeId) {
        self.bytes(&node.index().to_le_bytes());
    }
}

impl TraceSink for Hasher {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::CycleStart { cycle } => {
                self.bytes(&[0x10]);
                self.bytes(&cycle.to_le_bytes());
            }
            TraceEvent::TransferCommitted(transfer) => {
                self.bytes(&[0x11]);
                self.node(transfer.writer);
                self.node(transfer.reader);
                self.bytes(&transfer.value.to_le_bytes());
            }
            TraceEvent::NodeStalled { node, reason } => {
                self.bytes(&[0x12, reason as u8]);
                self.node(node);
            }
            TraceEvent::StackApplied {
                stack,
                popped,
                pushed,
                depth,
            } => {
                self.bytes(&[0x13]);
                self.node(stack);
                self.bytes(&popped.map_or([0, 0], |value| [1, value.to_le_bytes()[0]]));
                self.bytes(&pushed.to_le_bytes());
                self.bytes(&depth.to_le_bytes());
            }
        }
    }
}

/// Layout, row-major ids in brackets:
///
/// ```text
///     [0] [1] [2] [3]
///     [4]  S5 [6] [7]
///     [8] [9] [10] S11
/// ```
fn workload() -> (Grid, Looping) {
    let layout = GridLayout::rectangle(4, 3)
        .with_stack(Coord::new(1, 1))
        .with_stack(Coord::new(3, 2));
    let grid = Grid::from_layout(&layout).expect("fixed layout is valid");

    let mut programs = vec![Vec::new(); grid.len()];
    programs[0] = vec![Intent::write_any(3), Intent::write(Direction::Right, -7)];
    programs[1] = vec![Intent::read(Direction::Left), Intent::write(Direction::Down, 11)];
    programs[2] = vec![Intent::read_any(), Intent::write(Direction::Left, 1)];
    programs[3] = vec![Intent::write(Direction::Down, 42)];
    programs[4] = vec![Intent::write(Direction::Right, 5), Intent::read(Direction::Right)];
    programs[6] = vec![Intent::read_any(), Intent::write_any(-1)];
    programs[7] = vec![Intent::read(Direction::Up), Intent::write(Direction::Down, 9)];
    programs[9] = vec![Intent::read(Direction::Up)];
    programs[10] = vec![Intent::read(Direction::Right), Intent::write_any(127)];

    let ip = vec![0; grid.len()];
    (grid, Looping { programs, ip })
}

fn fingerprint() -> String {
    let (grid, mut nodes) = workload();
    let config = EngineConfig {
        tracing_enabled: true,
        ..EngineConfig::default()
    };
    let mut stepper = CycleStepper::new(grid, config);
    let mut hasher = Hasher(0xcbf2_9ce4_8422_2325);

    stepper
        .run_until(&mut nodes, RunBoundary::Cycles(256), Some(&mut hasher))
        .expect("workload intents fit the grid");

    let stacks: Vec<_> = stepper.grid().stack_ids().collect();
    for stack in stacks {
        if let Some(contents) = stepper.stack(stack) {
            hasher.node(stack);
            for value in contents.top_down() {
                hasher.bytes(&value.to_le_bytes());
            }
        }
    }
    hasher.bytes(&stepper.counters().transfers.to_le_bytes());
    hasher.bytes(&stepper.counters().stalls().to_le_bytes());

    format!("{:016x}", hasher.0)
}

fn main() {
    println!("{}", fingerprint());
}
