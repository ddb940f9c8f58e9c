//! Immutable grid topology: node arena, kinds, and adjacency.

/// Coordinate-based layout description used to build a grid.
pub mod layout;
/// Row-major node arena with index-based adjacency.
pub mod topology;

pub use layout::{Coord, GridLayout, NodeKind};
pub use topology::{Grid, NodeId};
