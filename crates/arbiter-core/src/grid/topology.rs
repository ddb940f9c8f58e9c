use std::collections::HashMap;
use std::fmt;

use super::{Coord, GridLayout, NodeKind};
use crate::{Direction, LayoutError, DIRECTION_COUNT};

/// Arena index of a node. Indices follow row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct NodeId(usize);

impl NodeId {
    /// Wraps a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    coord: Coord,
    kind: NodeKind,
    neighbors: [Option<NodeId>; DIRECTION_COUNT],
}

/// Immutable grid topology.
///
/// Adjacency is derived from coordinates, so it is symmetric: if `b` is the
/// `d` neighbor of `a`, then `a` is the `d.opposite()` neighbor of `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    slots: Vec<Slot>,
    by_coord: HashMap<Coord, NodeId>,
}

impl Grid {
    /// Builds a grid from a layout, numbering nodes row-major.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Empty`] for a layout without nodes and
    /// [`LayoutError::DuplicateCoord`] when two nodes share a cell.
    pub fn from_layout(layout: &GridLayout) -> Result<Self, LayoutError> {
        if layout.nodes.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut placed = layout.nodes.clone();
        placed.sort_by_key(|(coord, _)| coord.row_major_key());

        let mut by_coord = HashMap::with_capacity(placed.len());
        for (index, (coord, _)) in placed.iter().enumerate() {
            if by_coord.insert(*coord, NodeId(index)).is_some() {
                return Err(LayoutError::DuplicateCoord(*coord));
            }
        }

        let slots = placed
            .iter()
            .map(|(coord, kind)| {
                let mut neighbors = [None; DIRECTION_COUNT];
                for direction in Direction::ALL {
                    neighbors[direction.index()] = coord
                        .step(direction)
                        .and_then(|adjacent| by_coord.get(&adjacent).copied());
                }
                Slot {
                    coord: *coord,
                    kind: *kind,
                    neighbors,
                }
            })
            .collect();

        Ok(Self { slots, by_coord })
    }

    /// Number of nodes, stacks included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false for a grid built through [`Grid::from_layout`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All node ids in processing order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.slots.len()).map(NodeId)
    }

    /// Compute node ids in processing order.
    pub fn compute_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_of(NodeKind::Compute)
    }

    /// Stack node ids in processing order.
    pub fn stack_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids_of(NodeKind::Stack)
    }

    fn ids_of(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.kind == kind)
            .map(|(index, _)| NodeId(index))
    }

    /// Kind of `node`, or `None` for an id outside this grid.
    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.slots.get(node.0).map(|slot| slot.kind)
    }

    /// Returns true when `node` is a stack node.
    #[must_use]
    pub fn is_stack(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Stack)
    }

    /// Cell occupied by `node`.
    #[must_use]
    pub fn coord(&self, node: NodeId) -> Option<Coord> {
        self.slots.get(node.0).map(|slot| slot.coord)
    }

    /// Node placed at `coord`.
    #[must_use]
    pub fn node_at(&self, coord: Coord) -> Option<NodeId> {
        self.by_coord.get(&coord).copied()
    }

    /// Neighbor of `node` in `direction`, if one exists.
    #[must_use]
    pub fn neighbor(&self, node: NodeId, direction: Direction) -> Option<NodeId> {
        self.slots
            .get(node.0)
            .and_then(|slot| slot.neighbors[direction.index()])
    }

    /// Direction in which `to` lies as seen from `from`, when they are adjacent.
    #[must_use]
    pub fn direction_to(&self, from: NodeId, to: NodeId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.neighbor(from, *direction) == Some(to))
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, NodeId};
    use crate::{Coord, Direction, GridLayout, LayoutError, NodeKind};

    #[test]
    fn ids_are_assigned_row_major_regardless_of_layout_order() {
        let layout = GridLayout::new()
            .with_node(Coord::new(1, 1), NodeKind::Compute)
            .with_node(Coord::new(0, 1), NodeKind::Compute)
            .with_node(Coord::new(1, 0), NodeKind::Compute)
            .with_node(Coord::new(0, 0), NodeKind::Compute);
        let grid = Grid::from_layout(&layout).expect("valid layout");

        assert_eq!(grid.node_at(Coord::new(0, 0)), Some(NodeId::new(0)));
        assert_eq!(grid.node_at(Coord::new(1, 0)), Some(NodeId::new(1)));
        assert_eq!(grid.node_at(Coord::new(0, 1)), Some(NodeId::new(2)));
        assert_eq!(grid.node_at(Coord::new(1, 1)), Some(NodeId::new(3)));
    }

    #[test]
    fn adjacency_is_symmetric() {
        let grid = Grid::from_layout(&GridLayout::rectangle(3, 3)).expect("valid layout");
        for node in grid.node_ids() {
            for direction in Direction::ALL {
                if let Some(other) = grid.neighbor(node, direction) {
                    assert_eq!(grid.neighbor(other, direction.opposite()), Some(node));
                    assert_eq!(grid.direction_to(node, other), Some(direction));
                }
            }
        }
    }

    #[test]
    fn edge_nodes_lack_outward_neighbors() {
        let grid = Grid::from_layout(&GridLayout::rectangle(2, 1)).expect("valid layout");
        let left = NodeId::new(0);
        assert_eq!(grid.neighbor(left, Direction::Up), None);
        assert_eq!(grid.neighbor(left, Direction::Left), None);
        assert_eq!(grid.neighbor(left, Direction::Right), Some(NodeId::new(1)));
        assert_eq!(grid.direction_to(left, left), None);
    }

    #[test]
    fn coordinate_space_edge_has_no_wraparound_neighbor() {
        let layout = GridLayout::new()
            .with_node(Coord::new(i32::MAX, 0), NodeKind::Compute)
            .with_node(Coord::new(i32::MAX - 1, 0), NodeKind::Compute);
        let grid = Grid::from_layout(&layout).expect("valid layout");
        let edge = grid.node_at(Coord::new(i32::MAX, 0)).expect("edge cell");

        assert_eq!(grid.neighbor(edge, Direction::Right), None);
        assert_eq!(grid.neighbor(edge, Direction::Left), Some(NodeId::new(0)));
        assert_eq!(grid.direction_to(edge, edge), None);
    }

    #[test]
    fn stacks_are_partitioned_from_compute_nodes() {
        let layout = GridLayout::rectangle(3, 1).with_stack(Coord::new(1, 0));
        let grid = Grid::from_layout(&layout).expect("valid layout");
        assert_eq!(grid.stack_ids().collect::<Vec<_>>(), vec![NodeId::new(1)]);
        assert_eq!(
            grid.compute_ids().collect::<Vec<_>>(),
            vec![NodeId::new(0), NodeId::new(2)]
        );
        assert!(grid.is_stack(NodeId::new(1)));
        assert_eq!(grid.kind(NodeId::new(9)), None);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert_eq!(
            Grid::from_layout(&GridLayout::new()),
            Err(LayoutError::Empty)
        );
        let duplicate = GridLayout::rectangle(1, 1).with_node(Coord::new(0, 0), NodeKind::Stack);
        assert_eq!(
            Grid::from_layout(&duplicate),
            Err(LayoutError::DuplicateCoord(Coord::new(0, 0)))
        );
    }
}
