//! Collaborator interfaces implemented by the host adapter.
//!
//! The engine owns no world data. A traversal borrows read access through
//! [`GridQuery`], [`InventoryQuery`] and [`FilterText`]; only the deposit
//! step and the tick driver take `&mut`.

use crate::error::WorldError;
use crate::grid::{Direction, NodeKind, Position};
use crate::id::{ItemBatch, Slot};
use serde::{Deserialize, Serialize};

/// Four lines of sign text.
pub type SignText = [String; 4];

/// Join sign lines the way a filter reads them: concatenated, no separator.
pub fn join_lines(text: &SignText) -> String {
    text.concat()
}

pub trait GridQuery {
    fn kind_of(&self, pos: Position) -> NodeKind;

    fn neighbor(&self, pos: Position, dir: Direction) -> Position {
        pos.relative(dir)
    }

    fn above(&self, pos: Position) -> Position {
        pos.above()
    }

    fn below(&self, pos: Position) -> Position {
        pos.below()
    }
}

pub trait InventoryQuery {
    /// Slots of the container at `sink`, in inventory order.
    fn contents_of(&self, sink: Position) -> Result<Vec<Slot>, WorldError>;

    /// Insert `batch` into the container at `sink`.
    fn add_batch(&mut self, sink: Position, batch: ItemBatch) -> Result<(), WorldError>;
}

pub trait FilterText {
    fn text_of(&self, filter: Position) -> Result<SignText, WorldError>;
}

/// Everything a traversal needs from the host.
pub trait World: GridQuery + InventoryQuery + FilterText {}

impl<T: GridQuery + InventoryQuery + FilterText + ?Sized> World for T {}

// ---------------------------------------------------------------------------
// Dropped items
// ---------------------------------------------------------------------------

/// Host handle of a loose item entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemHandle(pub u64);

/// An item resting on an origin node, waiting to be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingItem {
    pub handle: ItemHandle,
    /// The origin block the item rests on.
    pub origin: Position,
    pub batch: ItemBatch,
}

/// Loose items the tick driver routes.
pub trait DroppedItems {
    fn pending_items(&self) -> Result<Vec<PendingItem>, WorldError>;

    fn remove_item(&mut self, item: ItemHandle) -> Result<(), WorldError>;

    /// Move the item so it rests on top of `onto`.
    fn relocate_item(&mut self, item: ItemHandle, onto: Position) -> Result<(), WorldError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat;

    impl GridQuery for Flat {
        fn kind_of(&self, pos: Position) -> NodeKind {
            if pos.y < 0 { NodeKind::Other } else { NodeKind::Empty }
        }
    }

    #[test]
    fn default_neighbors_follow_position_arithmetic() {
        let p = Position::new(0, 0, 0);
        assert_eq!(Flat.neighbor(p, Direction::East), Position::new(1, 0, 0));
        assert_eq!(Flat.above(p), Position::new(0, 1, 0));
        assert_eq!(Flat.below(p), Position::new(0, -1, 0));
        assert_eq!(Flat.kind_of(Flat.below(p)), NodeKind::Other);
    }

    #[test]
    fn sign_lines_concatenate_without_separator() {
        let text: SignText = [
            "oak wood,".into(),
            "birch".into(),
            " wood".into(),
            String::new(),
        ];
        assert_eq!(join_lines(&text), "oak wood,birch wood");
    }
}
