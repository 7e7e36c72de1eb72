//! Top-level driver: route one item, and route every pending item per tick.

use std::time::Instant;

use crate::catalog::Catalog;
use crate::deposit::{Deposit, deposit};
use crate::diagnostics::{DiagnosticSink, TraceKind};
use crate::error::RouteError;
use crate::grid::Position;
use crate::id::ItemBatch;
use crate::search::PathSearch;
use crate::world::{DroppedItems, PendingItem, World};

/// What to do with one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Deposit { destination: Position },
    /// Nothing had room; park the item on top of a full sink instead.
    PlaceOnTop { sink: Position },
    NoDestination,
}

/// What happened to one item during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Deposited(Deposit),
    Relocated { onto: Position },
    Stranded,
}

/// Counters for one pass over the pending items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub deposited: usize,
    pub relocated: usize,
    pub stranded: usize,
    pub failed: usize,
    /// The host could not list pending items; nothing was routed.
    pub enumeration_failed: bool,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.deposited + self.relocated + self.stranded + self.failed
    }
}

/// Routes items against an immutable catalog. Holds no per-item state.
#[derive(Debug, Clone, Copy)]
pub struct Router<'c> {
    catalog: &'c Catalog,
}

impl<'c> Router<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Decide where `batch`, resting on `origin`, should go.
    ///
    /// Search from the origin. If that fails while a wildcard is pending,
    /// resume the same traversal from the wildcard node, which now admits.
    /// Only when that also fails is a full sink used as a fallback.
    pub fn route<W: World + ?Sized>(
        &self,
        world: &W,
        origin: Position,
        batch: &ItemBatch,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RouteDecision, RouteError> {
        let mut search = PathSearch::new(world, self.catalog, sink);
        if let Some(destination) = search.search(origin, batch)? {
            return Ok(RouteDecision::Deposit { destination });
        }

        while let Some(wildcard) = search.state().pending_wildcard {
            if let Some(destination) = search.search(wildcard, batch)? {
                return Ok(RouteDecision::Deposit { destination });
            }
            if search.state().pending_wildcard == Some(wildcard) {
                break;
            }
        }

        Ok(match search.state().full_destination {
            Some(full) => RouteDecision::PlaceOnTop { sink: full },
            None => RouteDecision::NoDestination,
        })
    }

    /// Route, then commit the decision for one pending item.
    pub fn process<W>(
        &self,
        world: &mut W,
        item: &PendingItem,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ItemOutcome, RouteError>
    where
        W: World + DroppedItems + ?Sized,
    {
        let batch = &item.batch;
        if sink.enabled(TraceKind::General) {
            let name = self
                .catalog
                .canonical_name(batch.identity)
                .unwrap_or("unknown item");
            sink.emit(
                TraceKind::General,
                format!(
                    "Processing item: {name} / {} / {}",
                    batch.identity.type_id, batch.identity.variant
                ),
            );
            sink.emit(TraceKind::General, format!("Quantity to stack: {}", batch.count));
        }

        match self.route(&*world, item.origin, batch, sink)? {
            RouteDecision::Deposit { destination } => {
                let placed = deposit(world, destination, batch)?;
                world.remove_item(item.handle)?;
                sink.emit(
                    TraceKind::General,
                    format!("Storing in chest/dispenser: {destination}"),
                );
                Ok(ItemOutcome::Deposited(placed))
            }
            RouteDecision::PlaceOnTop { sink: full } => {
                world.relocate_item(item.handle, full)?;
                sink.emit(
                    TraceKind::Pathing,
                    format!("Moving item on top of chest/dispenser because it's full: {full}"),
                );
                Ok(ItemOutcome::Relocated { onto: full })
            }
            RouteDecision::NoDestination => {
                sink.emit(TraceKind::General, "No chest/dispenser to send item!".to_string());
                Ok(ItemOutcome::Stranded)
            }
        }
    }

    /// One pass over every pending item. Never fails: a fault routing one
    /// item is logged and counted, and the loop moves on.
    pub fn tick<W>(&self, world: &mut W, sink: &mut dyn DiagnosticSink) -> TickReport
    where
        W: World + DroppedItems + ?Sized,
    {
        let started = Instant::now();
        let mut report = TickReport::default();

        match world.pending_items() {
            Ok(items) => {
                for item in &items {
                    match self.process(world, item, sink) {
                        Ok(ItemOutcome::Deposited(_)) => report.deposited += 1,
                        Ok(ItemOutcome::Relocated { .. }) => report.relocated += 1,
                        Ok(ItemOutcome::Stranded) => report.stranded += 1,
                        Err(err) => {
                            tracing::error!(
                                handle = item.handle.0,
                                origin = %item.origin,
                                identity = %item.batch.identity,
                                error = %err,
                                "failed to route item"
                            );
                            sink.emit(TraceKind::General, format!("Failed to route item: {err}"));
                            report.failed += 1;
                        }
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to enumerate pending items");
                report.enumeration_failed = true;
            }
        }

        sink.emit(TraceKind::Runtime, format!("{}ms", started.elapsed().as_millis()));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{NullSink, TraceLog};
    use crate::grid::NodeKind;
    use crate::id::ItemIdentity;
    use crate::test_utils::{MemoryWorld, sample_catalog};

    const ORIGIN: Position = Position::new(0, 0, 0);

    fn stone(count: u32) -> ItemBatch {
        ItemBatch::stackable(ItemIdentity::new(1, 0), count)
    }

    fn dirt(count: u32) -> ItemBatch {
        ItemBatch::stackable(ItemIdentity::new(3, 0), count)
    }

    fn origin_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world.set(ORIGIN, NodeKind::Other);
        world
    }

    #[test]
    fn route_to_reachable_sink() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        world.chest(Position::new(0, 0, -1), 27);
        let decision = Router::new(&catalog)
            .route(&world, ORIGIN, &stone(3), &mut NullSink)
            .unwrap();
        assert_eq!(
            decision,
            RouteDecision::Deposit {
                destination: Position::new(0, 0, -1)
            }
        );
    }

    #[test]
    fn full_sink_becomes_place_on_top() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        let full = Position::new(1, 0, 0);
        world.dispenser(full);
        world.fill_all(full, dirt(64));
        let decision = Router::new(&catalog)
            .route(&world, ORIGIN, &stone(1), &mut NullSink)
            .unwrap();
        assert_eq!(decision, RouteDecision::PlaceOnTop { sink: full });
    }

    #[test]
    fn wildcard_retry_beats_full_fallback() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        let full = Position::new(1, 0, 0);
        world.dispenser(full);
        world.fill_all(full, dirt(64));
        world.sign(Position::new(0, 0, -1), "*");
        world.chest(Position::new(0, 0, -2), 27);
        let decision = Router::new(&catalog)
            .route(&world, ORIGIN, &stone(1), &mut NullSink)
            .unwrap();
        assert_eq!(
            decision,
            RouteDecision::Deposit {
                destination: Position::new(0, 0, -2)
            }
        );
    }

    #[test]
    fn nothing_anywhere() {
        let catalog = sample_catalog();
        let world = origin_world();
        let decision = Router::new(&catalog)
            .route(&world, ORIGIN, &stone(1), &mut NullSink)
            .unwrap();
        assert_eq!(decision, RouteDecision::NoDestination);
    }

    #[test]
    fn tick_deposits_and_removes() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        let chest = Position::new(0, 0, -1);
        world.chest(chest, 27);
        let handle = world.drop_item(ORIGIN, stone(10));
        let mut log = TraceLog::default();
        let report = Router::new(&catalog).tick(&mut world, &mut log);
        assert_eq!(report.deposited, 1);
        assert_eq!(report.processed(), 1);
        assert!(world.item(handle).is_none());
        assert_eq!(world.count_of(chest, stone(1).identity), 10);
        assert!(log.contains(TraceKind::General, "Processing item: stone / 1 / 0"));
        assert!(log.contains(TraceKind::General, "Storing in chest/dispenser: X0/Y0/Z-1"));
        assert_eq!(log.of_kind(TraceKind::Runtime).count(), 1);
    }

    #[test]
    fn tick_relocates_onto_full_sink() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        let full = Position::new(0, 0, -1);
        world.dispenser(full);
        world.fill_all(full, dirt(64));
        let handle = world.drop_item(ORIGIN, stone(1));
        let report = Router::new(&catalog).tick(&mut world, &mut NullSink);
        assert_eq!(report.relocated, 1);
        assert_eq!(world.item(handle).map(|i| i.origin), Some(full.above()));
    }

    #[test]
    fn tick_survives_item_faults() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        let broken = Position::new(0, 0, -1);
        world.chest(broken, 27);
        world.fail_contents(broken, "chunk unloaded");
        let other_origin = Position::new(10, 0, 0);
        world.set(other_origin, NodeKind::Other);
        world.dispenser(Position::new(10, 0, -1));
        world.drop_item(ORIGIN, stone(1));
        world.drop_item(other_origin, stone(1));
        let report = Router::new(&catalog).tick(&mut world, &mut NullSink);
        assert_eq!(report.failed, 1);
        assert_eq!(report.deposited, 1);
    }

    #[test]
    fn tick_survives_enumeration_fault() {
        let catalog = sample_catalog();
        let mut world = origin_world();
        world.fail_enumeration("world list unavailable");
        let mut log = TraceLog::default();
        let report = Router::new(&catalog).tick(&mut world, &mut log);
        assert!(report.enumeration_failed);
        assert_eq!(report.processed(), 0);
        assert_eq!(log.of_kind(TraceKind::Runtime).count(), 1);
    }
}
