//! Stack capacity model: will a batch fit into a container?
//!
//! A greedy single pass over the slots, not an exact bin-packing. Slot order
//! can in principle make a container look full when another merge order
//! would succeed; the pass is still the authoritative answer for routing.

use crate::id::{ItemBatch, Slot};

/// Outcome of a capacity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// The container reported no slots at all; assume there is room.
    NoSlots,
    /// Some slot is empty, whatever the item types around it.
    EmptySlot,
    /// The batch merges into existing stacks of the same identity.
    MergesIntoStacks,
    Full,
}

impl Fit {
    pub fn fits(self) -> bool {
        !matches!(self, Fit::Full)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Fit::NoSlots => "Container reports no slots, assuming room",
            Fit::EmptySlot => "Stackable into empty slot",
            Fit::MergesIntoStacks => "Stackable onto existing item stack",
            Fit::Full => "Chest/dispenser does not have room to take the item",
        }
    }
}

/// Assess whether `candidate` fits into `slots`. Never mutates anything.
pub fn assess(slots: &[Slot], candidate: &ItemBatch) -> Fit {
    if slots.is_empty() {
        return Fit::NoSlots;
    }

    let mut remaining = i64::from(candidate.count);
    for &slot in slots {
        let Some(stack) = slot.filter(|s| !s.is_empty()) else {
            return Fit::EmptySlot;
        };
        // Unstackable items never merge.
        if candidate.max_stack_size <= 1 {
            continue;
        }
        if stack.identity == candidate.identity {
            remaining -= i64::from(candidate.max_stack_size) - i64::from(stack.count);
            if remaining <= 0 {
                return Fit::MergesIntoStacks;
            }
        }
    }
    Fit::Full
}

pub fn fits(slots: &[Slot], candidate: &ItemBatch) -> bool {
    assess(slots, candidate).fits()
}

/// How many items of `candidate` the slots can actually absorb, counting
/// empty slots at the candidate's stack limit and partial stacks of the
/// same identity at their headroom. `None` when the container reports no
/// slots (room unknown).
pub fn room_for(slots: &[Slot], candidate: &ItemBatch) -> Option<u32> {
    if slots.is_empty() {
        return None;
    }
    let room = slots
        .iter()
        .map(|slot| match slot.filter(|s| !s.is_empty()) {
            None => candidate.max_stack_size,
            Some(stack) if stack.identity == candidate.identity && candidate.max_stack_size > 1 => {
                candidate.max_stack_size.saturating_sub(stack.count)
            }
            Some(_) => 0,
        })
        .fold(0u32, u32::saturating_add);
    Some(room)
}
