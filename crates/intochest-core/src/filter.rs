//! Filter evaluation for sign nodes.
//!
//! A sign's four lines are concatenated, lowercased and split on commas into
//! terms. A node admits an item if any term matches it. The `*` term is a
//! deferred wildcard: the first time a traversal meets it, the node is
//! remembered and refuses; if the traversal comes back to that same node,
//! it admits. The filter of a node is re-parsed on every evaluation because
//! sign text can change between ticks.

use crate::catalog::{Catalog, TokenClass, WILDCARD};
use crate::diagnostics::{DiagnosticSink, TraceKind};
use crate::error::WorldError;
use crate::grid::Position;
use crate::id::{ID_DELIMITER, ItemIdentity};
use crate::world::{FilterText, SignText, join_lines};
use std::fmt;

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// One comma-separated term of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTerm {
    /// `type|variant`, compared as text against the item's key.
    ExactIdentity(String),
    /// Bare type id, compared as text against the item's type id.
    TypeId(String),
    /// Canonical name, group name or short name.
    Name(String),
    Wildcard,
}

impl FilterTerm {
    /// Classify a trimmed, lowercased term.
    pub fn classify(term: &str) -> Self {
        if term.starts_with(|c: char| c.is_ascii_digit()) {
            if term.contains(ID_DELIMITER) {
                FilterTerm::ExactIdentity(term.to_string())
            } else {
                FilterTerm::TypeId(term.to_string())
            }
        } else if term == WILDCARD {
            FilterTerm::Wildcard
        } else {
            FilterTerm::Name(term.to_string())
        }
    }

    /// Why this term admits `identity`, if it does. The wildcard never
    /// matches here; it is handled by [`FilterSpec::evaluate`].
    pub fn matches(&self, catalog: &Catalog, identity: ItemIdentity) -> Option<MatchReason> {
        match self {
            FilterTerm::ExactIdentity(term) => {
                (*term == identity.key()).then(|| MatchReason::ExactIdentity(term.clone()))
            }
            FilterTerm::TypeId(term) => {
                (*term == identity.type_key()).then(|| MatchReason::TypeId(term.clone()))
            }
            FilterTerm::Name(term) => {
                if catalog.canonical_name(identity) == Some(term.as_str()) {
                    Some(MatchReason::ExactName(term.clone()))
                } else if catalog.in_group(term, identity) {
                    Some(MatchReason::GroupName(term.clone()))
                } else if catalog.short_name(identity) == Some(term.as_str()) {
                    Some(MatchReason::ShortName {
                        short: term.clone(),
                        name: catalog.canonical_name(identity).unwrap_or_default().to_string(),
                    })
                } else {
                    None
                }
            }
            FilterTerm::Wildcard => None,
        }
    }
}

/// Which rule let an item through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReason {
    ExactIdentity(String),
    TypeId(String),
    ExactName(String),
    GroupName(String),
    ShortName { short: String, name: String },
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchReason::ExactIdentity(t) => write!(f, "Fit via id: {t}"),
            MatchReason::TypeId(t) => write!(f, "Fit via id of a group: {t}"),
            MatchReason::ExactName(t) => write!(f, "Fit via exact name: {t}"),
            MatchReason::GroupName(t) => write!(f, "Fit via group name: {t}"),
            MatchReason::ShortName { short, name } => {
                write!(f, "Fit via short name: {short} -> {name}")
            }
        }
    }
}

/// Result of evaluating one filter node for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed(MatchReason),
    /// Wildcard met for the first time: remembered, refused for now.
    WildcardDeferred,
    /// Wildcard met again at the remembered node: admitted.
    WildcardAccepted,
    Denied,
}

impl Verdict {
    pub fn allows(&self) -> bool {
        matches!(self, Verdict::Allowed(_) | Verdict::WildcardAccepted)
    }
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// Parsed content of one filter node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub terms: Vec<FilterTerm>,
}

impl FilterSpec {
    /// Parse raw filter text. Blank terms are skipped.
    pub fn parse(text: &str) -> Self {
        let terms = text
            .to_lowercase()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(FilterTerm::classify)
            .collect();
        Self { terms }
    }

    pub fn from_lines(lines: &SignText) -> Self {
        Self::parse(&join_lines(lines))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.terms.contains(&FilterTerm::Wildcard)
    }

    /// First non-wildcard term admitting `identity`.
    pub fn first_match(&self, catalog: &Catalog, identity: ItemIdentity) -> Option<MatchReason> {
        self.terms.iter().find_map(|t| t.matches(catalog, identity))
    }

    /// Decide whether the node at `node` admits `identity`.
    ///
    /// Any matching term admits. Otherwise a wildcard term consults
    /// `pending_wildcard`: if it already holds `node`, the wildcard admits
    /// and the marker is cleared; if not, `node` becomes the marker and the
    /// node refuses. A node with no terms refuses everything.
    pub fn evaluate(
        &self,
        catalog: &Catalog,
        identity: ItemIdentity,
        node: Position,
        pending_wildcard: &mut Option<Position>,
    ) -> Verdict {
        if let Some(reason) = self.first_match(catalog, identity) {
            return Verdict::Allowed(reason);
        }
        if !self.has_wildcard() {
            return Verdict::Denied;
        }
        if *pending_wildcard == Some(node) {
            *pending_wildcard = None;
            Verdict::WildcardAccepted
        } else {
            *pending_wildcard = Some(node);
            Verdict::WildcardDeferred
        }
    }

    /// Resolve every term against the catalog for display.
    pub fn audit(&self, catalog: &Catalog) -> FilterAudit {
        let mut audit = FilterAudit::default();
        for term in &self.terms {
            match term {
                FilterTerm::Wildcard => audit.wildcard = true,
                // Numeric terms match as text, so only their canonical
                // spelling counts as allowed.
                FilterTerm::ExactIdentity(raw) => match catalog.resolve_token(raw) {
                    TokenClass::Exact(id) if id.key() == *raw => audit.push_name(catalog, id),
                    _ => audit.invalid.push(raw.clone()),
                },
                FilterTerm::TypeId(raw) => match catalog.resolve_token(raw) {
                    TokenClass::TypeId(type_id) if type_id.to_string() == *raw => audit
                        .allowed
                        .extend(catalog.identities_of_type(type_id).map(|(_, n)| n.to_string())),
                    _ => audit.invalid.push(raw.clone()),
                },
                FilterTerm::Name(raw) => match catalog.resolve_token(raw) {
                    TokenClass::Name(id) | TokenClass::ShortName(id) => {
                        audit.push_name(catalog, id)
                    }
                    TokenClass::Group(group) => {
                        for id in catalog.identities_in_group(&group) {
                            audit.push_name(catalog, id);
                        }
                    }
                    _ => audit.invalid.push(raw.clone()),
                },
            }
        }
        audit
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// What a filter admits, and which of its terms mean nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterAudit {
    /// Canonical names admitted, in term order.
    pub allowed: Vec<String>,
    /// Terms that resolve to no catalog entry. They never match.
    pub invalid: Vec<String>,
    pub wildcard: bool,
}

impl FilterAudit {
    fn push_name(&mut self, catalog: &Catalog, id: ItemIdentity) {
        if let Some(name) = catalog.canonical_name(id) {
            self.allowed.push(name.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.invalid.is_empty() && !self.wildcard
    }
}

impl fmt::Display for FilterAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("This sign has no filters specified. No items allowed.");
        }
        let mut lines = Vec::new();
        if !self.allowed.is_empty() {
            lines.push(format!("Allowed: {}", self.allowed.join(", ")));
        }
        if !self.invalid.is_empty() {
            lines.push(format!("Invalid: {}", self.invalid.join(", ")));
        }
        if self.wildcard {
            lines.push("Wildcard: anything no other sign accepts".to_string());
        }
        f.write_str(&lines.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Node evaluation
// ---------------------------------------------------------------------------

/// Read the sign at `node` and evaluate it, tracing the decision.
pub fn evaluate_node<W: FilterText + ?Sized>(
    world: &W,
    catalog: &Catalog,
    node: Position,
    identity: ItemIdentity,
    pending_wildcard: &mut Option<Position>,
    sink: &mut dyn DiagnosticSink,
) -> Result<Verdict, WorldError> {
    let spec = FilterSpec::from_lines(&world.text_of(node)?);
    if sink.enabled(TraceKind::Filter) {
        sink.emit(TraceKind::Filter, spec.audit(catalog).to_string());
    }

    let verdict = spec.evaluate(catalog, identity, node, pending_wildcard);
    match &verdict {
        Verdict::Allowed(reason) => sink.emit(TraceKind::Filter, reason.to_string()),
        Verdict::WildcardDeferred => sink.emit(
            TraceKind::Filter,
            format!("We have a wildcard! {node}, deferring until other paths are exhausted"),
        ),
        Verdict::WildcardAccepted => sink.emit(
            TraceKind::Filter,
            format!("We have a wildcard! {node}, nothing else matched"),
        ),
        Verdict::Denied => {}
    }
    Ok(verdict)
}
