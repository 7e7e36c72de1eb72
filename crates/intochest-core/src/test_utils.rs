//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::{BTreeMap, HashMap};

use crate::capacity::room_for;
use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::WorldError;
use crate::grid::{NodeKind, Position};
use crate::id::{ItemBatch, ItemIdentity, Slot};
use crate::world::{
    DroppedItems, FilterText, GridQuery, InventoryQuery, ItemHandle, PendingItem, SignText,
};

// ===========================================================================
// Item identities
// ===========================================================================

pub const STONE: ItemIdentity = ItemIdentity::new(1, 0);
pub const DIRT: ItemIdentity = ItemIdentity::new(3, 0);
pub const COBBLESTONE: ItemIdentity = ItemIdentity::new(4, 0);
pub const OAK_WOOD: ItemIdentity = ItemIdentity::new(17, 0);
pub const SPRUCE_WOOD: ItemIdentity = ItemIdentity::new(17, 1);
pub const BIRCH_WOOD: ItemIdentity = ItemIdentity::new(17, 2);
pub const JUNGLE_WOOD: ItemIdentity = ItemIdentity::new(17, 3);
pub const APPLE: ItemIdentity = ItemIdentity::new(260, 0);
pub const SHEARS: ItemIdentity = ItemIdentity::new(359, 0);

// ===========================================================================
// Catalog fixtures
// ===========================================================================

/// Small catalog: a few blocks, the four wood variants in group "wood"
/// with short names, and unstackable shears.
pub fn sample_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    for (name, id) in [
        ("stone", STONE),
        ("dirt", DIRT),
        ("cobblestone", COBBLESTONE),
        ("oak wood", OAK_WOOD),
        ("spruce wood", SPRUCE_WOOD),
        ("birch wood", BIRCH_WOOD),
        ("jungle wood", JUNGLE_WOOD),
        ("apple", APPLE),
        ("shears", SHEARS),
    ] {
        b.register_item(name, id).unwrap();
    }
    for (short, id) in [
        ("owood", OAK_WOOD),
        ("swood", SPRUCE_WOOD),
        ("bwood", BIRCH_WOOD),
        ("jwood", JUNGLE_WOOD),
        ("cobble", COBBLESTONE),
    ] {
        b.register_short_name(short, id).unwrap();
    }
    b.register_group("wood", [OAK_WOOD, SPRUCE_WOOD, BIRCH_WOOD, JUNGLE_WOOD])
        .unwrap();
    b.mark_unstackable(SHEARS.type_id);
    b.build().unwrap()
}

pub fn stack(identity: ItemIdentity, count: u32) -> ItemBatch {
    ItemBatch::stackable(identity, count)
}

// ===========================================================================
// In-memory world
// ===========================================================================

/// A sparse grid with inventories, sign text and loose items.
///
/// Unset positions are `Empty`. Containers stack on insert the way a real
/// chest does: partial stacks of the same identity first, then empty slots.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: HashMap<Position, NodeKind>,
    inventories: HashMap<Position, Vec<Slot>>,
    signs: HashMap<Position, SignText>,
    items: BTreeMap<ItemHandle, PendingItem>,
    next_handle: u64,
    content_faults: HashMap<Position, String>,
    unknown_containers: Vec<Position>,
    enumeration_fault: Option<String>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pos: Position, kind: NodeKind) -> &mut Self {
        self.blocks.insert(pos, kind);
        self
    }

    pub fn conduit(&mut self, pos: Position) -> &mut Self {
        self.set(pos, NodeKind::Conduit)
    }

    pub fn chest(&mut self, pos: Position, slots: usize) -> &mut Self {
        self.inventories.insert(pos, vec![None; slots]);
        self.set(pos, NodeKind::CHEST)
    }

    /// A dispenser has nine slots.
    pub fn dispenser(&mut self, pos: Position) -> &mut Self {
        self.inventories.insert(pos, vec![None; 9]);
        self.set(pos, NodeKind::DISPENSER)
    }

    /// Free-standing sign with `text` on its first line.
    pub fn sign(&mut self, pos: Position, text: &str) -> &mut Self {
        self.sign_lines(pos, [text, "", "", ""])
    }

    pub fn wall_sign(&mut self, pos: Position, text: &str) -> &mut Self {
        self.signs.insert(pos, lines([text, "", "", ""]));
        self.set(pos, NodeKind::FilterWall)
    }

    pub fn sign_lines(&mut self, pos: Position, text: [&str; 4]) -> &mut Self {
        self.signs.insert(pos, lines(text));
        self.set(pos, NodeKind::FilterPost)
    }

    /// Put `batch` into every slot of the container at `pos`.
    pub fn fill_all(&mut self, pos: Position, batch: ItemBatch) -> &mut Self {
        if let Some(slots) = self.inventories.get_mut(&pos) {
            slots.iter_mut().for_each(|s| *s = Some(batch));
        }
        self
    }

    pub fn set_slot(&mut self, pos: Position, index: usize, slot: Slot) -> &mut Self {
        if let Some(s) = self.inventories.get_mut(&pos).and_then(|v| v.get_mut(index)) {
            *s = slot;
        }
        self
    }

    pub fn slots(&self, pos: Position) -> &[Slot] {
        self.inventories.get(&pos).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total count of `identity` held at `pos`.
    pub fn count_of(&self, pos: Position, identity: ItemIdentity) -> u32 {
        self.slots(pos)
            .iter()
            .flatten()
            .filter(|s| s.identity == identity)
            .map(|s| s.count)
            .sum()
    }

    /// Drop a loose item on `origin`.
    pub fn drop_item(&mut self, origin: Position, batch: ItemBatch) -> ItemHandle {
        let handle = ItemHandle(self.next_handle);
        self.next_handle += 1;
        self.items.insert(
            handle,
            PendingItem {
                handle,
                origin,
                batch,
            },
        );
        handle
    }

    pub fn item(&self, handle: ItemHandle) -> Option<&PendingItem> {
        self.items.get(&handle)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // -- fault injection --

    /// `contents_of(pos)` fails with a host fault.
    pub fn fail_contents(&mut self, pos: Position, message: &str) -> &mut Self {
        self.content_faults.insert(pos, message.to_string());
        self
    }

    /// `contents_of(pos)` reports an unclassifiable container.
    pub fn mark_unknown(&mut self, pos: Position) -> &mut Self {
        self.unknown_containers.push(pos);
        self
    }

    pub fn fail_enumeration(&mut self, message: &str) -> &mut Self {
        self.enumeration_fault = Some(message.to_string());
        self
    }
}

fn lines(text: [&str; 4]) -> SignText {
    text.map(str::to_string)
}

impl GridQuery for MemoryWorld {
    fn kind_of(&self, pos: Position) -> NodeKind {
        self.blocks.get(&pos).copied().unwrap_or(NodeKind::Empty)
    }
}

impl InventoryQuery for MemoryWorld {
    fn contents_of(&self, sink: Position) -> Result<Vec<Slot>, WorldError> {
        if let Some(message) = self.content_faults.get(&sink) {
            return Err(WorldError::Host(message.clone()));
        }
        if self.unknown_containers.contains(&sink) {
            return Err(WorldError::UnknownNodeKind(sink));
        }
        self.inventories
            .get(&sink)
            .cloned()
            .ok_or(WorldError::MissingNode(sink))
    }

    fn add_batch(&mut self, sink: Position, batch: ItemBatch) -> Result<(), WorldError> {
        let slots = self
            .inventories
            .get_mut(&sink)
            .ok_or(WorldError::MissingNode(sink))?;
        if room_for(slots, &batch).is_some_and(|room| room < batch.count) {
            return Err(WorldError::Host(format!("container at {sink} is full")));
        }

        let mut remaining = batch.count;
        if batch.max_stack_size > 1 {
            for stack in slots.iter_mut().flatten() {
                if remaining == 0 {
                    break;
                }
                if stack.identity == batch.identity && stack.count > 0 {
                    let moved = remaining.min(batch.max_stack_size.saturating_sub(stack.count));
                    stack.count += moved;
                    remaining -= moved;
                }
            }
        }
        for slot in slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none_or(|s| s.is_empty()) {
                let moved = remaining.min(batch.max_stack_size);
                *slot = Some(ItemBatch { count: moved, ..batch });
                remaining -= moved;
            }
        }
        Ok(())
    }
}

impl FilterText for MemoryWorld {
    fn text_of(&self, filter: Position) -> Result<SignText, WorldError> {
        self.signs
            .get(&filter)
            .cloned()
            .ok_or(WorldError::MissingNode(filter))
    }
}

impl DroppedItems for MemoryWorld {
    fn pending_items(&self) -> Result<Vec<PendingItem>, WorldError> {
        match &self.enumeration_fault {
            Some(message) => Err(WorldError::Host(message.clone())),
            None => Ok(self.items.values().copied().collect()),
        }
    }

    fn remove_item(&mut self, item: ItemHandle) -> Result<(), WorldError> {
        self.items
            .remove(&item)
            .map(|_| ())
            .ok_or(WorldError::UnknownItem(item))
    }

    fn relocate_item(&mut self, item: ItemHandle, onto: Position) -> Result<(), WorldError> {
        let pending = self.items.get_mut(&item).ok_or(WorldError::UnknownItem(item))?;
        pending.origin = onto.above();
        Ok(())
    }
}
