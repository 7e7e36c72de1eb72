//! Serde data file structs for catalog and router configuration.
//!
//! These structs define the on-disk format. They are deserialized from RON,
//! JSON, or TOML data files and then resolved into engine types by the
//! loader.

use intochest_core::diagnostics::{DebugToggles, Toggled, TraceLog};
use intochest_core::id::DEFAULT_MAX_STACK;
use serde::{Deserialize, Serialize};

// ===========================================================================
// Catalog
// ===========================================================================

/// A complete catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogData {
    /// Stack limit for types without an explicit one. Falls back to the
    /// router configuration.
    #[serde(default)]
    pub default_max_stack: Option<u32>,
    pub items: Vec<ItemEntryData>,
    #[serde(default)]
    pub groups: Vec<GroupData>,
    /// Type ids whose items never stack.
    #[serde(default)]
    pub unstackable: Vec<u32>,
    #[serde(default)]
    pub stack_limits: Vec<StackLimitData>,
}

/// One named item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemEntryData {
    pub name: String,
    /// `"type|variant"`.
    pub id: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// A named group. Members are item names or `"type|variant"` ids.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupData {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StackLimitData {
    pub type_id: u32,
    pub limit: u32,
}

// ===========================================================================
// Router configuration
// ===========================================================================

/// Host-facing settings. Every field has a default, so an empty file (or no
/// file at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Period of the routing tick.
    pub tick_interval_ms: u64,
    pub default_max_stack: u32,
    pub debug: DebugToggles,
    /// Lines kept by the in-memory trace log.
    pub trace_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            default_max_stack: DEFAULT_MAX_STACK,
            debug: DebugToggles::default(),
            trace_capacity: 256,
        }
    }
}

impl RouterConfig {
    /// A trace log sized and filtered according to this configuration.
    pub fn trace_sink(&self) -> Toggled<TraceLog> {
        Toggled::new(self.debug, TraceLog::new(self.trace_capacity))
    }
}
