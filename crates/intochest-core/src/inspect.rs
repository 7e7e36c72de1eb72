//! Which filter terms would admit a given item.

use std::fmt;

use crate::catalog::Catalog;
use crate::id::ItemIdentity;

/// Every filter term that matches one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInspection {
    pub identity: ItemIdentity,
    pub exact_name: Option<String>,
    pub short_name: Option<String>,
    /// Sorted.
    pub groups: Vec<String>,
}

impl ItemInspection {
    /// `type|variant`.
    pub fn exact_id(&self) -> String {
        self.identity.key()
    }

    /// Bare type id.
    pub fn group_id(&self) -> String {
        self.identity.type_key()
    }

    /// All the terms, names first, ready to write on a sign.
    pub fn terms(&self) -> Vec<String> {
        self.exact_name
            .iter()
            .chain(&self.short_name)
            .chain(&self.groups)
            .cloned()
            .chain([self.exact_id(), self.group_id()])
            .collect()
    }
}

pub fn inspect_item(catalog: &Catalog, identity: ItemIdentity) -> ItemInspection {
    ItemInspection {
        identity,
        exact_name: catalog.canonical_name(identity).map(str::to_string),
        short_name: catalog.short_name(identity).map(str::to_string),
        groups: catalog
            .groups_containing(identity)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

impl fmt::Display for ItemInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The following values are valid filter terms for your item in hand:")?;
        if let Some(name) = &self.exact_name {
            writeln!(f, "Exact name: {name}")?;
        }
        if let Some(short) = &self.short_name {
            writeln!(f, "Short name: {short}")?;
        }
        if !self.groups.is_empty() {
            writeln!(f, "Group name(s): {}", self.groups.join(", "))?;
        }
        writeln!(f, "Item exact identifier: {}", self.exact_id())?;
        write!(f, "Item group identifier: {}", self.group_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use crate::grid::Position;
    use crate::test_utils::sample_catalog;

    #[test]
    fn inspects_named_item() {
        let cat = sample_catalog();
        let report = inspect_item(&cat, ItemIdentity::new(17, 2));
        assert_eq!(report.exact_name.as_deref(), Some("birch wood"));
        assert_eq!(report.short_name.as_deref(), Some("bwood"));
        assert_eq!(report.groups, vec!["wood".to_string()]);
        let text = report.to_string();
        assert!(text.contains("Group name(s): wood"), "got: {text}");
        assert!(text.ends_with("Item group identifier: 17"), "got: {text}");
    }

    #[test]
    fn unknown_item_still_has_identifiers() {
        let cat = sample_catalog();
        let report = inspect_item(&cat, ItemIdentity::new(9999, 3));
        assert_eq!(report.terms(), vec!["9999|3".to_string(), "9999".to_string()]);
        assert!(!report.to_string().contains("Exact name"));
    }

    #[test]
    fn every_listed_term_admits_the_item() {
        let cat = sample_catalog();
        let id = ItemIdentity::new(17, 2);
        for term in inspect_item(&cat, id).terms() {
            let mut pending = None;
            let verdict = FilterSpec::parse(&term).evaluate(&cat, id, Position::new(0, 0, 0), &mut pending);
            assert!(verdict.allows(), "term {term} should admit {id}");
        }
    }
}
