//! Grid positions, lateral directions and node classification.
//!
//! Positions are blocks in a 3D grid with `y` pointing up. North is `-z`,
//! east is `+x`, matching the host world's block faces.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A block position in the 3D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The adjacent position in a lateral direction.
    pub fn relative(&self, dir: Direction) -> Self {
        let (dx, dz) = dir.offset();
        Self::new(self.x + dx, self.y, self.z + dz)
    }

    pub fn above(&self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    pub fn below(&self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    /// True if `other` sits at a smaller x or z than `self`.
    ///
    /// Used to order the halves of a twin container.
    pub fn precedes(&self, other: &Position) -> bool {
        self.x < other.x || self.z < other.z
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}/Y{}/Z{}", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Lateral directions, in search priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four lateral directions in priority order: N, E, S, W.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// (dx, dz) offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Container flavour of a destination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SinkKind {
    /// Can pair with an adjacent chest into one logical container.
    Chest,
    Dispenser,
}

/// What occupies a grid position, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Empty,
    /// Wire: plain pass-through.
    Conduit,
    /// Free-standing filter sign.
    FilterPost,
    /// Wall-mounted filter sign.
    FilterWall,
    Sink(SinkKind),
    Other,
}

impl NodeKind {
    pub const CHEST: NodeKind = NodeKind::Sink(SinkKind::Chest);
    pub const DISPENSER: NodeKind = NodeKind::Sink(SinkKind::Dispenser);

    /// Component nodes are the ones a traversal may step onto.
    pub fn is_component(&self) -> bool {
        matches!(
            self,
            NodeKind::Conduit | NodeKind::FilterPost | NodeKind::FilterWall | NodeKind::Sink(_)
        )
    }

    pub fn is_sink(&self) -> bool {
        matches!(self, NodeKind::Sink(_))
    }

    pub fn is_filter(&self) -> bool {
        matches!(self, NodeKind::FilterPost | NodeKind::FilterWall)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeKind::Empty)
    }
}
