//! Cycle orchestration: poll intents, resolve, commit, deliver results.
//!
//! A cycle is atomic from the outside: the resolver runs against a frozen
//! intent set and the pre-cycle stack state, and only a successful
//! resolution mutates stacks or reaches collaborators.

use tracing::{debug, error, trace, warn};

use crate::{
    resolve, ArbitrationError, CycleCounters, CycleReport, EngineConfig, Grid, Intent,
    NodeCollaborator, NodeId, Resolution, RunBoundary, RunOutcome, StackBank, StackError,
    StackNode, StopReason, TraceEvent, TraceSink, Value,
};

/// Lock-step driver owning the topology and every stack's contents.
#[derive(Debug, Clone)]
pub struct CycleStepper {
    grid: Grid,
    stacks: StackBank,
    config: EngineConfig,
    counters: CycleCounters,
    cycle: u64,
    stalled_streak: u32,
}

impl CycleStepper {
    /// Creates a stepper with every stack empty.
    #[must_use]
    pub fn new(grid: Grid, config: EngineConfig) -> Self {
        let stacks = StackBank::for_grid(&grid);
        Self {
            grid,
            stacks,
            config,
            counters: CycleCounters::new(),
            cycle: 0,
            stalled_streak: 0,
        }
    }

    /// Topology this stepper runs on.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Index of the next cycle to run.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Activity counters since construction.
    #[must_use]
    pub const fn counters(&self) -> &CycleCounters {
        &self.counters
    }

    /// Contents of the stack at `node`.
    #[must_use]
    pub fn stack(&self, node: NodeId) -> Option<&StackNode> {
        self.stacks.get(node)
    }

    /// Preloads the stack at `node` with `values`, bottom first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotAStack`] when `node` is not a stack node.
    pub fn load_stack(&mut self, node: NodeId, values: Vec<Value>) -> Result<(), StackError> {
        self.stacks.load(node, values)
    }

    /// Polls every compute node and resolves the cycle without committing it.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrationError`] when a collaborator presents an intent
    /// that does not fit the topology.
    pub fn preview<C>(&self, nodes: &mut C) -> Result<Resolution, ArbitrationError>
    where
        C: NodeCollaborator + ?Sized,
    {
        let intents = self.poll(nodes);
        resolve(&self.grid, &intents, &self.stacks)
    }

    /// Runs one cycle: poll, resolve, apply stack effects, deliver results.
    ///
    /// # Errors
    ///
    /// Returns [`ArbitrationError`] when a collaborator presents an intent
    /// that does not fit the topology. Nothing is committed in that case.
    pub fn step<C>(
        &mut self,
        nodes: &mut C,
        mut trace_sink: Option<&mut dyn TraceSink>,
    ) -> Result<CycleReport, ArbitrationError>
    where
        C: NodeCollaborator + ?Sized,
    {
        let intents = self.poll(nodes);
        let resolution = match resolve(&self.grid, &intents, &self.stacks) {
            Ok(resolution) => resolution,
            Err(err) => {
                error!(cycle = self.cycle, %err, "cycle rejected");
                return Err(err);
            }
        };

        let cycle = self.cycle;
        let tracing_enabled = self.config.tracing_enabled;
        let mut emit = |event: TraceEvent| {
            if tracing_enabled {
                if let Some(sink) = trace_sink.as_deref_mut() {
                    sink.on_event(event);
                }
            }
        };

        emit(TraceEvent::CycleStart { cycle });
        for transfer in &resolution.transfers {
            trace!(
                cycle,
                writer = %transfer.writer,
                reader = %transfer.reader,
                value = transfer.value,
                "transfer committed"
            );
            emit(TraceEvent::TransferCommitted(*transfer));
        }
        for (node, reason) in &resolution.stalls {
            trace!(cycle, node = %node, ?reason, "node stalled");
            emit(TraceEvent::NodeStalled {
                node: *node,
                reason: *reason,
            });
        }

        for (stack, effect) in &resolution.stack_effects {
            let popped = match self.stacks.apply(*stack, effect) {
                Ok(popped) => popped,
                Err(err) => {
                    error!(cycle, %err, "stack effect targets a non-stack node");
                    continue;
                }
            };
            let depth = self.stacks.get(*stack).map_or(0, StackNode::len);
            emit(TraceEvent::StackApplied {
                stack: *stack,
                popped,
                pushed: effect.pushes.len(),
                depth,
            });
        }

        self.counters.record(&resolution);
        self.cycle = self.cycle.saturating_add(1);

        let results: Vec<_> = resolution.node_results().collect();
        for (node, result) in &results {
            nodes.commit(*node, *result);
        }

        debug!(
            cycle,
            transfers = resolution.transfers.len(),
            stalls = resolution.stalls.len(),
            "cycle committed"
        );

        Ok(CycleReport {
            cycle,
            transfers: resolution.transfers,
            results,
            stalls: resolution.stalls,
        })
    }

    /// Steps until `boundary` is reached or the per-run cycle cap is hit.
    ///
    /// Deadlock is reported once `deadlock_threshold` consecutive cycles left
    /// every compute node stalled; the streak persists across run calls.
    ///
    /// # Errors
    ///
    /// Propagates the first [`ArbitrationError`] raised by [`Self::step`].
    pub fn run_until<C>(
        &mut self,
        nodes: &mut C,
        boundary: RunBoundary,
        mut trace_sink: Option<&mut dyn TraceSink>,
    ) -> Result<RunOutcome, ArbitrationError>
    where
        C: NodeCollaborator + ?Sized,
    {
        let limit = match boundary {
            RunBoundary::Cycles(cycles) => cycles.min(self.config.max_cycles_per_run),
            RunBoundary::Deadlock => self.config.max_cycles_per_run,
        };

        let mut cycles = 0;
        while cycles < limit {
            let sink: Option<&mut dyn TraceSink> = match trace_sink.as_mut() {
                Some(sink) => Some(&mut **sink),
                None => None,
            };
            let report = self.step(nodes, sink)?;
            cycles += 1;

            if report.is_fully_stalled() {
                self.stalled_streak = self.stalled_streak.saturating_add(1);
            } else {
                self.stalled_streak = 0;
            }

            if boundary == RunBoundary::Deadlock
                && self.stalled_streak >= self.config.deadlock_threshold.max(1)
            {
                warn!(cycle = report.cycle, streak = self.stalled_streak, "deadlock detected");
                return Ok(RunOutcome {
                    cycles,
                    stop: StopReason::Deadlock,
                });
            }
        }

        let stop = match boundary {
            RunBoundary::Cycles(requested) if requested <= cycles => StopReason::CycleLimit,
            RunBoundary::Cycles(_) | RunBoundary::Deadlock => StopReason::RunCapReached,
        };
        Ok(RunOutcome { cycles, stop })
    }

    fn poll<C>(&self, nodes: &mut C) -> Vec<Intent>
    where
        C: NodeCollaborator + ?Sized,
    {
        self.grid
            .node_ids()
            .map(|node| {
                if self.grid.is_stack(node) {
                    Intent::Idle
                } else {
                    nodes.intent_of(node)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::CycleStepper;
    use crate::{
        CommitResult, Coord, Direction, EngineConfig, Grid, GridLayout, Intent, NodeCollaborator,
        NodeId, RunBoundary, StopReason, TraceEvent, TraceSink,
    };

    /// Each node repeats a fixed intent and records what it was told.
    struct Fixed {
        intents: Vec<Intent>,
        received: Vec<(NodeId, CommitResult)>,
    }

    impl NodeCollaborator for Fixed {
        fn intent_of(&mut self, node: NodeId) -> Intent {
            self.intents[node.index()]
        }

        fn commit(&mut self, node: NodeId, result: CommitResult) {
            self.received.push((node, result));
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<TraceEvent>);

    impl TraceSink for Recorder {
        fn on_event(&mut self, event: TraceEvent) {
            self.0.push(event);
        }
    }

    fn stack_between() -> Grid {
        let layout = GridLayout::rectangle(3, 1).with_stack(Coord::new(1, 0));
        Grid::from_layout(&layout).expect("valid layout")
    }

    #[test]
    fn preview_resolves_without_committing() {
        let mut stepper = CycleStepper::new(stack_between(), EngineConfig::default());
        stepper
            .load_stack(NodeId::new(1), vec![2])
            .expect("node 1 is a stack");
        let mut nodes = Fixed {
            intents: vec![Intent::read(Direction::Right), Intent::Idle, Intent::Idle],
            received: Vec::new(),
        };

        let preview = stepper.preview(&mut nodes).expect("valid intents");
        assert_eq!(
            preview.result(NodeId::new(0)),
            Some(CommitResult::Delivered {
                value: 2,
                from: Direction::Right,
            })
        );
        assert!(nodes.received.is_empty());
        assert_eq!(stepper.cycle(), 0);
        assert_eq!(stepper.counters().cycles, 0);
        assert_eq!(
            stepper.stack(NodeId::new(1)).map(|stack| stack.top_down()),
            Some(vec![2])
        );

        let report = stepper.step(&mut nodes, None).expect("valid cycle");
        assert_eq!(report.transfers, preview.transfers);
    }

    #[test]
    fn rejected_cycle_commits_nothing() {
        let grid = Grid::from_layout(&GridLayout::rectangle(2, 1)).expect("valid layout");
        let mut stepper = CycleStepper::new(grid, EngineConfig::default());
        let mut nodes = Fixed {
            intents: vec![Intent::write(Direction::Down, 1), Intent::read_any()],
            received: Vec::new(),
        };

        assert!(stepper.step(&mut nodes, None).is_err());
        assert!(nodes.received.is_empty());
        assert_eq!(stepper.cycle(), 0);
        assert_eq!(stepper.counters().cycles, 0);
    }

    #[test]
    fn stack_nodes_are_never_polled() {
        let mut stepper = CycleStepper::new(stack_between(), EngineConfig::default());
        // A stack intent would be rejected, so polling the stack would fail the cycle.
        let mut nodes = Fixed {
            intents: vec![
                Intent::write(Direction::Right, 4),
                Intent::write_any(99),
                Intent::Idle,
            ],
            received: Vec::new(),
        };

        let report = stepper.step(&mut nodes, None).expect("valid cycle");
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(
            nodes.received,
            vec![
                (
                    NodeId::new(0),
                    CommitResult::Sent {
                        to: Direction::Right
                    }
                ),
                (NodeId::new(2), CommitResult::Idle),
            ]
        );
        assert_eq!(
            stepper.stack(NodeId::new(1)).map(|stack| stack.top_down()),
            Some(vec![4])
        );
    }

    #[test]
    fn trace_events_follow_commit_order_when_enabled() {
        let config = EngineConfig {
            tracing_enabled: true,
            ..EngineConfig::default()
        };
        let mut stepper = CycleStepper::new(stack_between(), config);
        stepper
            .load_stack(NodeId::new(1), vec![5])
            .expect("node 1 is a stack");
        let mut nodes = Fixed {
            intents: vec![
                Intent::read(Direction::Right),
                Intent::Idle,
                Intent::write(Direction::Left, 9),
            ],
            received: Vec::new(),
        };
        let mut recorder = Recorder::default();

        stepper
            .step(&mut nodes, Some(&mut recorder))
            .expect("valid cycle");

        assert_eq!(recorder.0.len(), 4);
        assert_eq!(recorder.0[0], TraceEvent::CycleStart { cycle: 0 });
        assert!(matches!(recorder.0[1], TraceEvent::TransferCommitted(_)));
        assert!(matches!(recorder.0[2], TraceEvent::TransferCommitted(_)));
        assert_eq!(
            recorder.0[3],
            TraceEvent::StackApplied {
                stack: NodeId::new(1),
                popped: Some(5),
                pushed: 1,
                depth: 1,
            }
        );
    }

    #[test]
    fn trace_sink_is_silent_when_disabled() {
        let mut stepper = CycleStepper::new(stack_between(), EngineConfig::default());
        let mut nodes = Fixed {
            intents: vec![Intent::write(Direction::Right, 1), Intent::Idle, Intent::Idle],
            received: Vec::new(),
        };
        let mut recorder = Recorder::default();
        stepper
            .step(&mut nodes, Some(&mut recorder))
            .expect("valid cycle");
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn run_until_reports_deadlock_and_cycle_limit() {
        let grid = Grid::from_layout(&GridLayout::rectangle(2, 1)).expect("valid layout");
        let mut stepper = CycleStepper::new(
            grid,
            EngineConfig {
                deadlock_threshold: 3,
                ..EngineConfig::default()
            },
        );
        let mut deadlocked = Fixed {
            intents: vec![Intent::read(Direction::Right), Intent::read(Direction::Left)],
            received: Vec::new(),
        };
        let outcome = stepper
            .run_until(&mut deadlocked, RunBoundary::Deadlock, None)
            .expect("valid cycles");
        assert_eq!(outcome.stop, StopReason::Deadlock);
        assert_eq!(outcome.cycles, 3);

        let mut idle = Fixed {
            intents: vec![Intent::Idle, Intent::Idle],
            received: Vec::new(),
        };
        let outcome = stepper
            .run_until(&mut idle, RunBoundary::Cycles(5), None)
            .expect("valid cycles");
        assert_eq!(outcome.stop, StopReason::CycleLimit);
        assert_eq!(outcome.cycles, 5);
        assert_eq!(stepper.cycle(), 8);
    }

    #[test]
    fn run_cap_bounds_deadlock_search() {
        let grid = Grid::from_layout(&GridLayout::rectangle(1, 1)).expect("valid layout");
        let mut stepper = CycleStepper::new(
            grid,
            EngineConfig {
                max_cycles_per_run: 4,
                ..EngineConfig::default()
            },
        );
        let mut idle = Fixed {
            intents: vec![Intent::Idle],
            received: Vec::new(),
        };
        let outcome = stepper
            .run_until(&mut idle, RunBoundary::Deadlock, None)
            .expect("valid cycles");
        assert_eq!(outcome.stop, StopReason::RunCapReached);
        assert_eq!(outcome.cycles, 4);
    }
}
