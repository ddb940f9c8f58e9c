use std::fmt;

/// Grid cell position. `y` grows downward, so `UP` is `y - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate of the adjacent cell in `direction`, or `None` past the
    /// edge of the coordinate space.
    #[must_use]
    pub const fn step(self, direction: crate::Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Self { x, y }),
            _ => None,
        }
    }

    /// Row-major ordering key: row first, then column.
    #[must_use]
    pub const fn row_major_key(self) -> (i32, i32) {
        (self.y, self.x)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Node variants known to the arbitration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum NodeKind {
    /// Executes a program and issues one intent per cycle.
    #[default]
    Compute,
    /// Passive LIFO memory; never issues intents.
    Stack,
}

/// Unordered list of nodes placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GridLayout {
    /// Placed nodes. Order is irrelevant; indices are assigned row-major.
    pub nodes: Vec<(Coord, NodeKind)>,
}

impl GridLayout {
    /// Creates an empty layout.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Creates a `width` x `height` block of compute nodes anchored at `(0, 0)`.
    #[must_use]
    pub fn rectangle(width: u16, height: u16) -> Self {
        let nodes = (0..i32::from(height))
            .flat_map(|y| (0..i32::from(width)).map(move |x| (Coord::new(x, y), NodeKind::Compute)))
            .collect();
        Self { nodes }
    }

    /// Places a node, leaving any existing entry at the same coordinate in place.
    #[must_use]
    pub fn with_node(mut self, coord: Coord, kind: NodeKind) -> Self {
        self.nodes.push((coord, kind));
        self
    }

    /// Turns the cell at `coord` into a stack node, adding it if absent.
    #[must_use]
    pub fn with_stack(mut self, coord: Coord) -> Self {
        match self.nodes.iter_mut().find(|(at, _)| *at == coord) {
            Some(entry) => entry.1 = NodeKind::Stack,
            None => self.nodes.push((coord, NodeKind::Stack)),
        }
        self
    }
}
