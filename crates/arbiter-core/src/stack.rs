//! Passive LIFO stack nodes and their per-cycle effects.

use std::collections::BTreeMap;

use crate::{rank, Direction, Grid, NodeId, PriorityRole, StackError, Value};

/// Unbounded LIFO memory cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StackNode {
    values: Vec<Value>,
}

impl StackNode {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates a stack holding `values`, bottom first.
    #[must_use]
    pub const fn from_bottom_up(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Value a pop would return now.
    #[must_use]
    pub fn top(&self) -> Option<Value> {
        self.values.last().copied()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when a pop would find nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored values, top first.
    #[must_use]
    pub fn top_down(&self) -> Vec<Value> {
        self.values.iter().rev().copied().collect()
    }

    /// Applies one cycle of committed effects: the pop reads the state from
    /// before this cycle, then pushes land in their committed order.
    ///
    /// Returns the popped value, if the effect included a pop.
    pub fn apply(&mut self, effect: &StackEffect) -> Option<Value> {
        let popped = effect.pop.and_then(|_| self.values.pop());
        self.values.extend(effect.pushes.iter().map(|push| push.value));
        popped
    }
}

/// One value pushed onto a stack this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackPush {
    /// Writer that sent the value.
    pub writer: NodeId,
    /// Direction of the writer as seen from the stack.
    pub from: Direction,
    /// Pushed value.
    pub value: Value,
}

/// Everything committed against one stack in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackEffect {
    /// Reader that won this cycle's single pop.
    pub pop: Option<NodeId>,
    /// Pushes in application order.
    pub pushes: Vec<StackPush>,
}

impl StackEffect {
    /// Returns true when nothing touched the stack.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pop.is_none() && self.pushes.is_empty()
    }

    /// Sorts pushes into source-priority order relative to the stack
    /// (`UP` writer first, so the `DOWN` writer's value ends on top).
    pub fn order_pushes(&mut self) {
        self.pushes
            .sort_by_key(|push| rank(push.from, PriorityRole::Source));
    }
}

/// Contents of every stack node in a grid, keyed by node id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackBank {
    stacks: BTreeMap<NodeId, StackNode>,
}

impl StackBank {
    /// Creates an empty stack for every stack node in `grid`.
    #[must_use]
    pub fn for_grid(grid: &Grid) -> Self {
        Self {
            stacks: grid.stack_ids().map(|id| (id, StackNode::new())).collect(),
        }
    }

    /// Stack stored at `node`.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&StackNode> {
        self.stacks.get(&node)
    }

    /// Top value of the stack at `node`; `None` when empty or not a stack.
    #[must_use]
    pub fn top(&self, node: NodeId) -> Option<Value> {
        self.stacks.get(&node).and_then(StackNode::top)
    }

    /// Replaces the contents of the stack at `node`, bottom first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotAStack`] when `node` is not a stack node.
    pub fn load(&mut self, node: NodeId, values: Vec<Value>) -> Result<(), StackError> {
        let stack = self
            .stacks
            .get_mut(&node)
            .ok_or(StackError::NotAStack(node))?;
        *stack = StackNode::from_bottom_up(values);
        Ok(())
    }

    /// Applies a committed effect to the stack at `node`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::NotAStack`] when `node` is not a stack node.
    pub fn apply(&mut self, node: NodeId, effect: &StackEffect) -> Result<Option<Value>, StackError> {
        self.stacks
            .get_mut(&node)
            .map(|stack| stack.apply(effect))
            .ok_or(StackError::NotAStack(node))
    }

    /// All stacks in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &StackNode)> {
        self.stacks.iter().map(|(id, stack)| (*id, stack))
    }
}
