//! Saturating per-engine activity counters.

use crate::{Resolution, StallReason};

/// Counters updated once per committed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleCounters {
    /// Committed cycles.
    pub cycles: u64,
    /// Committed transfers, stack pushes and pops included.
    pub transfers: u64,
    /// Stalls with no compatible counterpart.
    pub stalls_no_counterpart: u64,
    /// Stalls on an empty stack.
    pub stalls_empty_stack: u64,
    /// Stalls after losing arbitration.
    pub stalls_contended: u64,
    /// Values pushed onto stacks.
    pub stack_pushes: u64,
    /// Values popped from stacks.
    pub stack_pops: u64,
}

impl CycleCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one committed resolution into the counters.
    pub fn record(&mut self, resolution: &Resolution) {
        self.cycles = self.cycles.saturating_add(1);
        self.transfers = self.transfers.saturating_add(count(resolution.transfers.len()));

        for (_, reason) in &resolution.stalls {
            let counter = match reason {
                StallReason::NoCounterpart => &mut self.stalls_no_counterpart,
                StallReason::EmptyStack => &mut self.stalls_empty_stack,
                StallReason::Contended => &mut self.stalls_contended,
            };
            *counter = counter.saturating_add(1);
        }

        for effect in resolution.stack_effects.values() {
            self.stack_pushes = self.stack_pushes.saturating_add(count(effect.pushes.len()));
            if effect.pop.is_some() {
                self.stack_pops = self.stack_pops.saturating_add(1);
            }
        }
    }

    /// Total stalls across all reasons.
    #[must_use]
    pub const fn stalls(&self) -> u64 {
        self.stalls_no_counterpart
            .saturating_add(self.stalls_empty_stack)
            .saturating_add(self.stalls_contended)
    }
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::CycleCounters;
    use crate::{resolve, Coord, Direction, Grid, GridLayout, Intent, StackBank};

    #[test]
    fn record_splits_stalls_by_reason() {
        let layout = GridLayout::rectangle(3, 1).with_stack(Coord::new(1, 0));
        let grid = Grid::from_layout(&layout).expect("valid layout");
        let stacks = StackBank::for_grid(&grid);
        let intents = [
            Intent::read(Direction::Right),
            Intent::Idle,
            Intent::write(Direction::Left, 6),
        ];
        let resolution = resolve(&grid, &intents, &stacks).expect("valid intents");

        let mut counters = CycleCounters::new();
        counters.record(&resolution);

        assert_eq!(counters.cycles, 1);
        assert_eq!(counters.transfers, 1);
        assert_eq!(counters.stack_pushes, 1);
        assert_eq!(counters.stack_pops, 0);
        assert_eq!(counters.stalls_empty_stack, 1);
        assert_eq!(counters.stalls(), 1);
    }

    #[test]
    fn counters_saturate() {
        let mut counters = CycleCounters {
            cycles: u64::MAX,
            ..CycleCounters::default()
        };
        let grid = Grid::from_layout(&GridLayout::rectangle(1, 1)).expect("valid layout");
        let resolution =
            resolve(&grid, &[Intent::Idle], &StackBank::for_grid(&grid)).expect("valid intents");
        counters.record(&resolution);
        assert_eq!(counters.cycles, u64::MAX);
    }
}
