//! Depth-first search for a sink that will take an item batch.
//!
//! From a start node the walk tries the four lateral directions in N, E, S,
//! W order and descends into the first component node each direction
//! offers, backtracking when a branch runs dry. A lateral step may also drop one block (when the lateral block is
//! empty) or climb one block (when the lateral block is solid and the block
//! above the current node is empty). The first sink with room wins.
//!
//! Filter nodes are marked visited only when they let the item through, so a
//! wildcard node that refused on first contact can be reached again later in
//! the same traversal and then admit.

use std::collections::HashSet;

use crate::capacity;
use crate::catalog::Catalog;
use crate::deposit::merged_contents;
use crate::diagnostics::{DiagnosticSink, TraceKind};
use crate::error::{RouteError, WorldError};
use crate::filter::{Verdict, evaluate_node};
use crate::grid::{Direction, NodeKind, Position};
use crate::id::ItemBatch;
use crate::world::World;

/// Per-traversal state. Created for one item, discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub visited: HashSet<Position>,
    /// First sink found without room for the batch.
    pub full_destination: Option<Position>,
    /// Wildcard filter node held back until everything else is exhausted.
    pub pending_wildcard: Option<Position>,
    /// Number of nodes the walk entered, revisits included.
    pub steps: usize,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What arriving at a node decided.
enum Entry {
    Found(Position),
    Blocked,
    Expand,
}

/// A node whose neighbors are being walked; `next_dir` indexes
/// [`Direction::all`].
struct Frame {
    node: Position,
    next_dir: usize,
}

impl Frame {
    fn new(node: Position) -> Self {
        Self { node, next_dir: 0 }
    }
}

/// One traversal over a borrowed world.
pub struct PathSearch<'a, W: World + ?Sized> {
    world: &'a W,
    catalog: &'a Catalog,
    sink: &'a mut dyn DiagnosticSink,
    state: SearchState,
}

impl<'a, W: World + ?Sized> PathSearch<'a, W> {
    pub fn new(world: &'a W, catalog: &'a Catalog, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            world,
            catalog,
            sink,
            state: SearchState::new(),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn into_state(self) -> SearchState {
        self.state
    }

    /// Search from `node`. State carries over between calls on the same
    /// `PathSearch`, which is how a wildcard retry resumes a traversal.
    ///
    /// The walk keeps its own stack of frames, so its depth is bounded by
    /// the heap rather than the thread stack.
    pub fn search(&mut self, node: Position, batch: &ItemBatch) -> Result<Option<Position>, RouteError> {
        let mut frames = Vec::new();
        match self.enter(node, batch)? {
            Entry::Found(sink) => return Ok(Some(sink)),
            Entry::Blocked => return Ok(None),
            Entry::Expand => frames.push(Frame::new(node)),
        }

        while let Some(frame) = frames.last_mut() {
            let Some(dir) = Direction::all().get(frame.next_dir).copied() else {
                frames.pop();
                continue;
            };
            frame.next_dir += 1;
            let from = frame.node;

            let Some(next) = self.step(from, dir) else {
                continue;
            };
            match self.enter(next, batch)? {
                Entry::Found(sink) => return Ok(Some(sink)),
                Entry::Blocked => {}
                Entry::Expand => frames.push(Frame::new(next)),
            }
        }
        Ok(None)
    }

    /// Checks done on arrival at a node, before any of its neighbors.
    fn enter(&mut self, node: Position, batch: &ItemBatch) -> Result<Entry, RouteError> {
        self.state.steps += 1;
        if self.state.visited.contains(&node) {
            return Ok(Entry::Blocked);
        }

        let kind = self.world.kind_of(node);
        if kind.is_sink() {
            match self.sink_has_room(node, batch) {
                Ok(true) => return Ok(Entry::Found(node)),
                Ok(false) => {
                    self.sink.emit(
                        TraceKind::Pathing,
                        format!("Skipping chest/dispenser because it's full: {node}"),
                    );
                    if self.state.full_destination.is_none() {
                        self.state.full_destination = Some(node);
                    }
                }
                Err(RouteError::World(WorldError::UnknownNodeKind(at))) => {
                    self.sink.emit(
                        TraceKind::Pathing,
                        format!("Unknown container at {at}, not a destination"),
                    );
                    return Ok(Entry::Blocked);
                }
                Err(err) => return Err(err),
            }
        }

        if kind.is_filter() && !self.admits(node, batch)? {
            return Ok(Entry::Blocked);
        }

        self.state.visited.insert(node);
        Ok(Entry::Expand)
    }

    /// The node reached from `node` by one hop toward `dir`, if any.
    fn step(&self, node: Position, dir: Direction) -> Option<Position> {
        let lateral = self.world.neighbor(node, dir);
        let lateral_kind = self.world.kind_of(lateral);
        let candidate = if lateral_kind.is_component() {
            lateral
        } else if lateral_kind == NodeKind::Empty {
            self.world.below(lateral)
        } else {
            let up = self.world.above(node);
            if !self.world.kind_of(up).is_empty() {
                return None;
            }
            self.world.neighbor(up, dir)
        };
        self.world.kind_of(candidate).is_component().then_some(candidate)
    }

    fn sink_has_room(&mut self, node: Position, batch: &ItemBatch) -> Result<bool, RouteError> {
        let slots = merged_contents(self.world, node)?;
        let fit = capacity::assess(&slots, batch);
        if self.sink.enabled(TraceKind::General) {
            self.sink.emit(TraceKind::General, format!("{} at {node}", fit.describe()));
        }
        Ok(fit.fits())
    }

    fn admits(&mut self, node: Position, batch: &ItemBatch) -> Result<bool, RouteError> {
        let verdict = evaluate_node(
            self.world,
            self.catalog,
            node,
            batch.identity,
            &mut self.state.pending_wildcard,
            &mut *self.sink,
        )?;
        let message = match verdict {
            Verdict::Allowed(_) | Verdict::WildcardAccepted => {
                format!("Allowed via sign found at: {node}")
            }
            Verdict::WildcardDeferred => {
                format!("YET skipping because wildcard was found at: {node}")
            }
            Verdict::Denied => format!("Skipping because not allowed via sign found at: {node}"),
        };
        self.sink.emit(TraceKind::Pathing, message);
        Ok(verdict.allows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NullSink, TraceLog};
    use crate::id::ItemIdentity;
    use crate::test_utils::{MemoryWorld, sample_catalog};

    const ORIGIN: Position = Position::new(0, 0, 0);

    fn stone(count: u32) -> ItemBatch {
        ItemBatch::stackable(ItemIdentity::new(1, 0), count)
    }

    fn dirt(count: u32) -> ItemBatch {
        ItemBatch::stackable(ItemIdentity::new(3, 0), count)
    }

    fn run(world: &MemoryWorld, batch: ItemBatch) -> (Option<Position>, SearchState) {
        let catalog = sample_catalog();
        let mut sink = NullSink;
        let mut search = PathSearch::new(world, &catalog, &mut sink);
        let found = search.search(ORIGIN, &batch).unwrap();
        (found, search.into_state())
    }

    fn origin_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world.set(ORIGIN, NodeKind::Other);
        world
    }

    #[test]
    fn adjacent_chest_is_found() {
        let mut world = origin_world();
        world.chest(Position::new(0, 0, -1), 27);
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(0, 0, -1)));
    }

    #[test]
    fn nothing_reachable() {
        let world = origin_world();
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, None);
        assert_eq!(state.full_destination, None);
        assert!(state.visited.contains(&ORIGIN));
    }

    #[test]
    fn follows_conduit_run() {
        let mut world = origin_world();
        for x in 1..=5 {
            world.conduit(Position::new(x, 0, 0));
        }
        world.chest(Position::new(6, 0, 0), 27);
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(6, 0, 0)));
    }

    #[test]
    fn steps_down_over_empty_lateral() {
        let mut world = origin_world();
        world.chest(Position::new(1, -1, 0), 27);
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(1, -1, 0)));
    }

    #[test]
    fn steps_up_when_headroom_is_clear() {
        let mut world = origin_world();
        world.set(Position::new(1, 0, 0), NodeKind::Other);
        world.chest(Position::new(1, 1, 0), 27);
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(1, 1, 0)));
    }

    #[test]
    fn no_step_up_under_a_ceiling() {
        let mut world = origin_world();
        world.set(Position::new(1, 0, 0), NodeKind::Other);
        world.set(ORIGIN.above(), NodeKind::Other);
        world.chest(Position::new(1, 1, 0), 27);
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, None);
    }

    #[test]
    fn full_sink_is_recorded_and_passed_through() {
        let mut world = origin_world();
        let full = Position::new(0, 0, -1);
        world.chest(full, 1);
        world.fill_all(full, dirt(64));
        world.conduit(Position::new(0, 0, -2));
        world.dispenser(Position::new(0, 0, -3));
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(0, 0, -3)));
        assert_eq!(state.full_destination, Some(full));
    }

    #[test]
    fn first_full_sink_is_kept() {
        let mut world = origin_world();
        let first = Position::new(0, 0, -1);
        let second = Position::new(1, 0, 0);
        world.dispenser(first);
        world.fill_all(first, dirt(64));
        world.dispenser(second);
        world.fill_all(second, dirt(64));
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, None);
        assert_eq!(state.full_destination, Some(first));
    }

    #[test]
    fn very_long_conduit_run() {
        let mut world = origin_world();
        let length = 12_000;
        for x in 1..=length {
            world.conduit(Position::new(x, 0, 0));
        }
        let end = Position::new(length + 1, 0, 0);
        world.chest(end, 27);
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, Some(end));
        assert_eq!(state.visited.len(), length as usize + 1);
    }

    #[test]
    fn backtracks_in_direction_order() {
        // North is a dead end, East leads to the chest: North is walked
        // first, then the walk backs out and tries East.
        let mut world = origin_world();
        world.conduit(Position::new(0, 0, -1));
        world.conduit(Position::new(0, 0, -2));
        world.conduit(Position::new(1, 0, 0));
        let chest = Position::new(2, 0, 0);
        world.chest(chest, 27);
        world.chest(Position::new(0, 0, 1), 27);
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, Some(chest));
        assert!(state.visited.contains(&Position::new(0, 0, -2)));
    }

    #[test]
    fn cycle_terminates() {
        let mut world = origin_world();
        for p in [(1, 0), (2, 0), (2, 1), (1, 1)] {
            world.conduit(Position::new(p.0, 0, p.1));
        }
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, None);
        assert_eq!(state.visited.len(), 5);
    }

    #[test]
    fn denying_filter_blocks_branch() {
        let mut world = origin_world();
        world.sign(Position::new(0, 0, -1), "apple");
        world.chest(Position::new(0, 0, -2), 27);
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, None);
        assert!(!state.visited.contains(&Position::new(0, 0, -1)));
    }

    #[test]
    fn wildcard_is_deferred_on_first_contact() {
        let mut world = origin_world();
        let sign = Position::new(0, 0, -1);
        world.wall_sign(sign, "*");
        world.chest(Position::new(0, 0, -2), 27);
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, None);
        assert_eq!(state.pending_wildcard, Some(sign));
    }

    #[test]
    fn wildcard_reached_twice_admits() {
        // The sign is reachable from the origin (refused) and again through
        // a conduit loop (admitted).
        let mut world = origin_world();
        let sign = Position::new(0, 0, -1);
        world.sign(sign, "*");
        world.conduit(Position::new(1, 0, 0));
        world.conduit(Position::new(1, 0, -1));
        world.chest(Position::new(0, 0, -2), 27);
        let (found, state) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(0, 0, -2)));
        assert_eq!(state.pending_wildcard, None);
    }

    #[test]
    fn unknown_container_ends_branch_only() {
        let mut world = origin_world();
        let broken = Position::new(0, 0, -1);
        world.chest(broken, 27);
        world.mark_unknown(broken);
        world.dispenser(Position::new(1, 0, 0));
        let (found, _) = run(&world, stone(1));
        assert_eq!(found, Some(Position::new(1, 0, 0)));
    }

    #[test]
    fn host_fault_propagates() {
        let mut world = origin_world();
        let broken = Position::new(0, 0, -1);
        world.chest(broken, 27);
        world.fail_contents(broken, "chunk unloaded");
        let catalog = sample_catalog();
        let mut sink = NullSink;
        let mut search = PathSearch::new(&world, &catalog, &mut sink);
        let err = search.search(ORIGIN, &stone(1)).unwrap_err();
        assert_eq!(err, RouteError::World(WorldError::Host("chunk unloaded".into())));
    }

    #[test]
    fn traces_filter_and_pathing_decisions() {
        let mut world = origin_world();
        world.sign(Position::new(0, 0, -1), "wood");
        world.chest(Position::new(0, 0, -2), 27);
        let catalog = sample_catalog();
        let mut log = TraceLog::default();
        let batch = catalog.batch(ItemIdentity::new(17, 1), 1);
        let found = PathSearch::new(&world, &catalog, &mut log)
            .search(ORIGIN, &batch)
            .unwrap();
        assert_eq!(found, Some(Position::new(0, 0, -2)));
        assert!(log.contains(TraceKind::Filter, "Fit via group name: wood"));
        assert!(log.contains(TraceKind::Pathing, "Allowed via sign found at: X0/Y0/Z-1"));
        assert!(log.contains(TraceKind::General, "Stackable into empty slot"));
    }
}
