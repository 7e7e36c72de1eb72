//! IntoChest Core -- item routing through filtered conduit networks.
//!
//! Loose items dropped on an origin block are sent along a network of
//! conduits and filter signs to the first chest or dispenser that admits
//! them and has room.
//!
//! # Routing one item
//!
//! 1. **Search** -- depth-first walk from the origin, N/E/S/W priority,
//!    stepping up or down one block per hop where the terrain allows.
//! 2. **Filter** -- every sign on the way must admit the item; `*` admits
//!    only once nothing stricter anywhere else did.
//! 3. **Capacity** -- the first sink with room is the destination. Full
//!    sinks are remembered as a last resort.
//! 4. **Deposit** -- the batch goes into the sink, split across twin
//!    chests when one half cannot take it all.
//!
//! The engine owns no world state. Hosts implement the traits in
//! [`world`] and pass a [`diagnostics::DiagnosticSink`] that decides what
//! to do with the classified trace.
//!
//! ```rust,ignore
//! let catalog = intochest_data::default_catalog()?;
//! let router = Router::new(&catalog);
//! let report = router.tick(&mut world, &mut TracingSink);
//! ```
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable item names, groups, short names and
//!   stack limits, with a memoized token index.
//! - [`filter::FilterSpec`] -- Parsed sign text and its verdict for an item.
//! - [`search::PathSearch`] -- One traversal and its [`search::SearchState`].
//! - [`router::Router`] -- Route decisions and the per-tick driver.

pub mod capacity;
pub mod catalog;
pub mod deposit;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod grid;
pub mod id;
pub mod inspect;
pub mod router;
pub mod search;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use router::{RouteDecision, Router, TickReport};
