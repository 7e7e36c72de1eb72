//! Twin containers and the deposit step.
//!
//! Two chests side by side form one logical container. For capacity checks
//! their contents are concatenated, lower coordinate first; for placement
//! the lower half is the primary and takes as much as it can hold.

use crate::capacity::room_for;
use crate::error::{RouteError, WorldError};
use crate::grid::{Direction, NodeKind, Position, SinkKind};
use crate::id::{ItemBatch, Slot};
use crate::world::{GridQuery, InventoryQuery};

/// The chest paired with the chest at `pos`, if any.
///
/// Neighbors are checked in N, E, S, W order and the first chest wins.
/// Dispensers never pair.
pub fn find_twin<W: GridQuery + ?Sized>(world: &W, pos: Position) -> Option<Position> {
    if world.kind_of(pos) != NodeKind::CHEST {
        return None;
    }
    Direction::all()
        .into_iter()
        .map(|dir| world.neighbor(pos, dir))
        .find(|n| world.kind_of(*n) == NodeKind::CHEST)
}

/// One logical container: a single sink, or a chest and its twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkPair {
    pub primary: Position,
    pub secondary: Option<Position>,
}

impl SinkPair {
    /// Resolve the pair `pos` belongs to. Errors if `pos` is not a sink.
    pub fn resolve<W: GridQuery + ?Sized>(world: &W, pos: Position) -> Result<Self, RouteError> {
        match world.kind_of(pos) {
            NodeKind::Sink(SinkKind::Chest) => Ok(match find_twin(world, pos) {
                Some(twin) if twin.precedes(&pos) => Self {
                    primary: twin,
                    secondary: Some(pos),
                },
                twin => Self {
                    primary: pos,
                    secondary: twin,
                },
            }),
            NodeKind::Sink(SinkKind::Dispenser) => Ok(Self {
                primary: pos,
                secondary: None,
            }),
            _ => Err(RouteError::NotASink(pos)),
        }
    }

    pub fn halves(&self) -> impl Iterator<Item = Position> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.halves().any(|p| p == pos)
    }
}

/// Slots of the logical container at `pos`, primary half first.
pub fn merged_contents<W>(world: &W, pos: Position) -> Result<Vec<Slot>, RouteError>
where
    W: GridQuery + InventoryQuery + ?Sized,
{
    let pair = SinkPair::resolve(world, pos)?;
    let mut slots = world.contents_of(pair.primary)?;
    if let Some(secondary) = pair.secondary {
        slots.extend(world.contents_of(secondary)?);
    }
    Ok(slots)
}

/// Items put into one container half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub sink: Position,
    pub count: u32,
}

/// Where a deposit landed. Usually a single placement; a batch that only
/// fits across both halves of a twin is split, primary first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deposit {
    pub placements: Vec<Placement>,
}

impl Deposit {
    /// The half that received the first items.
    pub fn first_sink(&self) -> Option<Position> {
        self.placements.first().map(|p| p.sink)
    }

    pub fn total(&self) -> u32 {
        self.placements.iter().map(|p| p.count).sum()
    }
}

/// Commit `batch` into the logical container at `destination`.
///
/// Only called after a search picked `destination`. A half that can take
/// the whole batch gets all of it, primary first. Otherwise the batch is
/// split only when both halves together have room for every item. Anything
/// larger goes whole to the roomier half and is left to the host, so a
/// refused insert never leaves part of the batch behind.
pub fn deposit<W>(world: &mut W, destination: Position, batch: &ItemBatch) -> Result<Deposit, RouteError>
where
    W: GridQuery + InventoryQuery + ?Sized,
{
    let pair = SinkPair::resolve(world, destination)?;
    let Some(secondary) = pair.secondary else {
        world.add_batch(pair.primary, *batch)?;
        return Ok(single(pair.primary, batch.count));
    };

    let primary_room = room_of(world, pair.primary, batch)?;
    let secondary_room = room_of(world, secondary, batch)?;
    if primary_room >= batch.count {
        world.add_batch(pair.primary, *batch)?;
        return Ok(single(pair.primary, batch.count));
    }
    if secondary_room >= batch.count {
        world.add_batch(secondary, *batch)?;
        return Ok(single(secondary, batch.count));
    }
    if primary_room == 0 || primary_room.saturating_add(secondary_room) < batch.count {
        let target = if secondary_room > primary_room {
            secondary
        } else {
            pair.primary
        };
        world.add_batch(target, *batch)?;
        return Ok(single(target, batch.count));
    }

    let rest = batch.count - primary_room;
    world.add_batch(pair.primary, ItemBatch { count: primary_room, ..*batch })?;
    world.add_batch(secondary, ItemBatch { count: rest, ..*batch })?;
    Ok(Deposit {
        placements: vec![
            Placement {
                sink: pair.primary,
                count: primary_room,
            },
            Placement {
                sink: secondary,
                count: rest,
            },
        ],
    })
}

fn room_of<W: InventoryQuery + ?Sized>(world: &W, sink: Position, batch: &ItemBatch) -> Result<u32, WorldError> {
    Ok(room_for(&world.contents_of(sink)?, batch).unwrap_or(u32::MAX))
}

fn single(sink: Position, count: u32) -> Deposit {
    Deposit {
        placements: vec![Placement { sink, count }],
    }
}
