use std::fmt;

/// Number of cardinal port directions on a grid node.
pub const DIRECTION_COUNT: usize = 4;

/// Cardinal direction of a port, relative to the node that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Direction {
    Up = 0,
    Left = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    /// All directions in declaration order.
    pub const ALL: [Self; DIRECTION_COUNT] = [Self::Up, Self::Left, Self::Right, Self::Down];

    /// Returns the array index for this direction (`0..=3`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the direction pointing back at the owner from its neighbor.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
        }
    }

    /// Grid offset `(dx, dy)` of the neighbor in this direction. `y` grows downward.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "UP",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Down => "DOWN",
        };
        f.write_str(name)
    }
}

/// Port named by an intent: a fixed direction, or `ANY` resolved per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PortRef {
    /// Exactly the neighbor in this direction.
    Dir(Direction),
    /// Whichever contending neighbor wins arbitration this cycle.
    Any,
}

impl PortRef {
    /// Returns the explicit direction, or `None` for `ANY`.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Dir(direction) => Some(direction),
            Self::Any => None,
        }
    }

    /// Returns true when this port accepts a counterpart located in `direction`.
    #[must_use]
    pub fn admits(self, direction: Direction) -> bool {
        match self {
            Self::Dir(named) => named == direction,
            Self::Any => true,
        }
    }
}

impl From<Direction> for PortRef {
    fn from(direction: Direction) -> Self {
        Self::Dir(direction)
    }
}

/// Which side of a transfer is choosing among contenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityRole {
    /// A reader picking which neighbor's write to accept.
    Source,
    /// A writer picking which neighbor's read to satisfy.
    Destination,
}

/// Source priority, highest first: `UP > LEFT > RIGHT > DOWN`.
pub const SOURCE_PRIORITY: [Direction; DIRECTION_COUNT] =
    [Direction::Up, Direction::Left, Direction::Right, Direction::Down];

/// Destination priority, highest first: `LEFT > RIGHT > UP > DOWN`.
pub const DESTINATION_PRIORITY: [Direction; DIRECTION_COUNT] =
    [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

/// Returns the fixed priority table for a role, highest priority first.
#[must_use]
pub const fn priority_order(role: PriorityRole) -> &'static [Direction; DIRECTION_COUNT] {
    match role {
        PriorityRole::Source => &SOURCE_PRIORITY,
        PriorityRole::Destination => &DESTINATION_PRIORITY,
    }
}

/// Looks up the rank of `direction` for `role`; `0` is the highest priority.
#[must_use]
pub fn rank(direction: Direction, role: PriorityRole) -> u8 {
    let position = priority_order(role)
        .iter()
        .position(|entry| *entry == direction)
        .unwrap_or(DIRECTION_COUNT);
    u8::try_from(position).unwrap_or(u8::MAX)
}
