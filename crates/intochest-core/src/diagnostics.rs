//! Classified diagnostic trace.
//!
//! The engine tags every trace line with a [`TraceKind`] and hands it to a
//! [`DiagnosticSink`]. Routing, display and suppression belong to the sink.
//!
//! # Sinks
//!
//! - [`TracingSink`]: forwards to the `tracing` facade.
//! - [`TraceLog`]: bounded in-memory ring, oldest lines dropped first.
//! - [`Toggled`]: wraps another sink and drops kinds switched off in
//!   [`DebugToggles`].
//! - [`NullSink`]: discards everything.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Trace kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    General,
    Filter,
    Pathing,
    Runtime,
}

impl TraceKind {
    pub fn all() -> [TraceKind; 4] {
        [
            TraceKind::General,
            TraceKind::Filter,
            TraceKind::Pathing,
            TraceKind::Runtime,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            TraceKind::General => "general",
            TraceKind::Filter => "filter",
            TraceKind::Pathing => "pathing",
            TraceKind::Runtime => "runtime",
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trace kind: {0}")]
pub struct UnknownTraceKind(pub String);

impl FromStr for TraceKind {
    type Err = UnknownTraceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TraceKind::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTraceKind(s.to_string()))
    }
}

/// Parse a comma-separated list of kind names.
///
/// Returns the recognized kinds and the names that were not recognized.
/// Blank entries are skipped.
pub fn parse_kinds(list: &str) -> (Vec<TraceKind>, Vec<String>) {
    let mut kinds = Vec::new();
    let mut unknown = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<TraceKind>() {
            Ok(kind) => kinds.push(kind),
            Err(UnknownTraceKind(name)) => unknown.push(name),
        }
    }
    (kinds, unknown)
}

/// One trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub kind: TraceKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Sink trait
// ---------------------------------------------------------------------------

pub trait DiagnosticSink {
    fn emit(&mut self, kind: TraceKind, message: String);

    /// Whether lines of this kind would be kept. Callers use it to skip
    /// building expensive messages; it never changes engine behavior.
    fn enabled(&self, _kind: TraceKind) -> bool {
        true
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, kind: TraceKind, message: String) {
        (**self).emit(kind, message);
    }

    fn enabled(&self, kind: TraceKind) -> bool {
        (**self).enabled(kind)
    }
}

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _kind: TraceKind, _message: String) {}

    fn enabled(&self, _kind: TraceKind) -> bool {
        false
    }
}

/// Forwards lines to `tracing`. Runtime lines log at INFO, the rest at DEBUG.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, kind: TraceKind, message: String) {
        match kind {
            TraceKind::Runtime => tracing::info!(kind = kind.name(), "{message}"),
            _ => tracing::debug!(kind = kind.name(), "{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceLog: bounded ring
// ---------------------------------------------------------------------------

/// Keeps the most recent `capacity` lines.
#[derive(Debug, Clone)]
pub struct TraceLog {
    lines: VecDeque<Trace>,
    capacity: usize,
    total_written: u64,
}

impl TraceLog {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity as u64)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Trace> {
        self.lines.iter()
    }

    pub fn of_kind(&self, kind: TraceKind) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |t| t.kind == kind)
            .map(|t| t.message.as_str())
    }

    /// True if any line of `kind` contains `needle`.
    pub fn contains(&self, kind: TraceKind, needle: &str) -> bool {
        self.of_kind(kind).any(|m| m.contains(needle))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new(256)
    }
}

impl DiagnosticSink for TraceLog {
    fn emit(&mut self, kind: TraceKind, message: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(Trace { kind, message });
        self.total_written += 1;
    }
}

// ---------------------------------------------------------------------------
// Debug toggles
// ---------------------------------------------------------------------------

/// Per-kind on/off switches. Everything is off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugToggles {
    pub general: bool,
    pub filter: bool,
    pub pathing: bool,
    pub runtime: bool,
}

impl DebugToggles {
    pub fn all_on() -> Self {
        Self {
            general: true,
            filter: true,
            pathing: true,
            runtime: true,
        }
    }

    pub fn is_enabled(&self, kind: TraceKind) -> bool {
        match kind {
            TraceKind::General => self.general,
            TraceKind::Filter => self.filter,
            TraceKind::Pathing => self.pathing,
            TraceKind::Runtime => self.runtime,
        }
    }

    pub fn set(&mut self, kind: TraceKind, on: bool) {
        match kind {
            TraceKind::General => self.general = on,
            TraceKind::Filter => self.filter = on,
            TraceKind::Pathing => self.pathing = on,
            TraceKind::Runtime => self.runtime = on,
        }
    }

    pub fn set_all(&mut self, on: bool) {
        for kind in TraceKind::all() {
            self.set(kind, on);
        }
    }
}

/// Drops lines whose kind is switched off.
#[derive(Debug, Clone, Default)]
pub struct Toggled<S> {
    pub toggles: DebugToggles,
    pub inner: S,
}

impl<S> Toggled<S> {
    pub fn new(toggles: DebugToggles, inner: S) -> Self {
        Self { toggles, inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for Toggled<S> {
    fn emit(&mut self, kind: TraceKind, message: String) {
        if self.toggles.is_enabled(kind) {
            self.inner.emit(kind, message);
        }
    }

    fn enabled(&self, kind: TraceKind) -> bool {
        self.toggles.is_enabled(kind) && self.inner.enabled(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_insensitive() {
        assert_eq!("Pathing".parse::<TraceKind>(), Ok(TraceKind::Pathing));
        assert_eq!(" RUNTIME ".parse::<TraceKind>(), Ok(TraceKind::Runtime));
        assert_eq!(
            "verbose".parse::<TraceKind>(),
            Err(UnknownTraceKind("verbose".into()))
        );
    }

    #[test]
    fn parse_kind_list_reports_unknown_names() {
        let (kinds, unknown) = parse_kinds("general, filter,,bogus");
        assert_eq!(kinds, vec![TraceKind::General, TraceKind::Filter]);
        assert_eq!(unknown, vec!["bogus".to_string()]);
    }

    #[test]
    fn trace_log_drops_oldest() {
        let mut log = TraceLog::new(2);
        log.emit(TraceKind::General, "a".into());
        log.emit(TraceKind::Filter, "b".into());
        log.emit(TraceKind::Pathing, "c".into());
        let messages: Vec<_> = log.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(log.total_written(), 3);
        assert_eq!(log.dropped_count(), 1);
    }

    #[test]
    fn trace_log_zero_capacity_clamped() {
        let mut log = TraceLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.emit(TraceKind::General, "x".into());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn trace_log_filters_by_kind() {
        let mut log = TraceLog::default();
        log.emit(TraceKind::Filter, "Fit via group name: wood".into());
        log.emit(TraceKind::Pathing, "Allowed via sign".into());
        assert!(log.contains(TraceKind::Filter, "group name"));
        assert!(!log.contains(TraceKind::Pathing, "group name"));
        assert_eq!(log.of_kind(TraceKind::Pathing).count(), 1);
    }

    #[test]
    fn toggles_default_off() {
        let toggles = DebugToggles::default();
        assert!(TraceKind::all().iter().all(|k| !toggles.is_enabled(*k)));
        assert!(TraceKind::all().iter().all(|k| DebugToggles::all_on().is_enabled(*k)));
    }

    #[test]
    fn toggles_set_individual_kinds() {
        let mut toggles = DebugToggles::default();
        toggles.set(TraceKind::Filter, true);
        assert!(toggles.filter);
        assert!(!toggles.pathing);
        toggles.set_all(true);
        toggles.set(TraceKind::Runtime, false);
        assert_eq!(
            toggles,
            DebugToggles {
                general: true,
                filter: true,
                pathing: true,
                runtime: false
            }
        );
    }

    #[test]
    fn toggled_sink_suppresses_disabled_kinds() {
        let mut toggles = DebugToggles::default();
        toggles.set(TraceKind::Pathing, true);
        let mut sink = Toggled::new(toggles, TraceLog::default());
        sink.emit(TraceKind::Pathing, "kept".into());
        sink.emit(TraceKind::Filter, "dropped".into());
        assert!(sink.enabled(TraceKind::Pathing));
        assert!(!sink.enabled(TraceKind::Filter));
        let log = sink.into_inner();
        assert_eq!(log.len(), 1);
        assert!(log.contains(TraceKind::Pathing, "kept"));
    }

    #[test]
    fn null_sink_reports_disabled() {
        let mut sink = NullSink;
        sink.emit(TraceKind::General, "ignored".into());
        assert!(!sink.enabled(TraceKind::General));
    }
}
