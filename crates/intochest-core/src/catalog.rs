//! Item catalog: canonical names, short names, groups and stack limits.
//!
//! Built once at startup through [`CatalogBuilder`] and immutable afterwards,
//! except for the token cache: the first time a filter token is looked up its
//! group/short-name matches are computed and memoized for the life of the
//! catalog. The cache is a pure function of the frozen tables and is never
//! invalidated.

use crate::id::{DEFAULT_MAX_STACK, ID_DELIMITER, ItemBatch, ItemIdentity};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

/// Wildcard filter token.
pub const WILDCARD: &str = "*";

/// How a filter token resolves against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass {
    Wildcard,
    /// `type|variant` of a registered identity.
    Exact(ItemIdentity),
    /// Bare type id with at least one registered variant.
    TypeId(u32),
    /// Exact canonical name.
    Name(ItemIdentity),
    /// Group name.
    Group(String),
    ShortName(ItemIdentity),
    Unresolved,
}

/// Matches of one non-numeric token, computed once and cached.
#[derive(Debug, Default)]
pub struct TokenIndex {
    pub name: Option<ItemIdentity>,
    pub is_group: bool,
    pub group: BTreeSet<ItemIdentity>,
    pub short_name: Option<ItemIdentity>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`Catalog`].
/// Lifecycle: register entries -> build (validates cross references).
#[derive(Debug)]
pub struct CatalogBuilder {
    names: BTreeMap<ItemIdentity, String>,
    name_to_id: HashMap<String, ItemIdentity>,
    short_names: Vec<(String, ItemIdentity)>,
    groups: BTreeMap<String, BTreeSet<ItemIdentity>>,
    stack_limits: BTreeMap<u32, u32>,
    default_max_stack: u32,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
            name_to_id: HashMap::new(),
            short_names: Vec::new(),
            groups: BTreeMap::new(),
            stack_limits: BTreeMap::new(),
            default_max_stack: DEFAULT_MAX_STACK,
        }
    }

    /// Register a canonical name for an identity. Names are case-insensitive.
    pub fn register_item(&mut self, name: &str, identity: ItemIdentity) -> Result<(), CatalogError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(CatalogError::EmptyName(identity));
        }
        if self.name_to_id.contains_key(&name) {
            return Err(CatalogError::DuplicateName(name));
        }
        if self.names.contains_key(&identity) {
            return Err(CatalogError::DuplicateIdentity(identity));
        }
        self.name_to_id.insert(name.clone(), identity);
        self.names.insert(identity, name);
        Ok(())
    }

    /// Register the short name of an already-named identity.
    pub fn register_short_name(&mut self, short: &str, identity: ItemIdentity) -> Result<(), CatalogError> {
        let short = normalize(short);
        if short.is_empty() {
            return Err(CatalogError::EmptyName(identity));
        }
        if self
            .short_names
            .iter()
            .any(|(s, id)| *s == short || *id == identity)
        {
            return Err(CatalogError::DuplicateShortName(short));
        }
        self.short_names.push((short, identity));
        Ok(())
    }

    /// Add members to a group, creating it if needed.
    pub fn register_group<I>(&mut self, name: &str, members: I) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = ItemIdentity>,
    {
        let name = normalize(name);
        if name.is_empty() {
            return Err(CatalogError::EmptyGroupName);
        }
        self.groups.entry(name).or_default().extend(members);
        Ok(())
    }

    /// Override the stack limit for every variant of a type.
    pub fn set_stack_limit(&mut self, type_id: u32, limit: u32) -> Result<(), CatalogError> {
        if limit == 0 {
            return Err(CatalogError::ZeroStackLimit(type_id));
        }
        self.stack_limits.insert(type_id, limit);
        Ok(())
    }

    /// Items of this type never merge into an existing stack.
    pub fn mark_unstackable(&mut self, type_id: u32) {
        self.stack_limits.insert(type_id, 1);
    }

    pub fn set_default_max_stack(&mut self, limit: u32) -> Result<(), CatalogError> {
        if limit == 0 {
            return Err(CatalogError::ZeroStackLimit(0));
        }
        self.default_max_stack = limit;
        Ok(())
    }

    /// Finalize. Short names and group members must name registered items.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        for (short, id) in &self.short_names {
            if !self.names.contains_key(id) {
                return Err(CatalogError::UnknownIdentity {
                    identity: *id,
                    context: format!("short name '{short}'"),
                });
            }
        }
        for (group, members) in &self.groups {
            if let Some(id) = members.iter().find(|id| !self.names.contains_key(id)) {
                return Err(CatalogError::UnknownIdentity {
                    identity: *id,
                    context: format!("group '{group}'"),
                });
            }
        }

        Ok(Catalog {
            names: self.names,
            name_to_id: self.name_to_id,
            short_names: self.short_names,
            groups: self.groups,
            stack_limits: self.stack_limits,
            default_max_stack: self.default_max_stack,
            token_cache: RwLock::new(HashMap::new()),
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable item catalog. Safe to share; the token cache is behind a
/// read-write lock.
#[derive(Debug)]
pub struct Catalog {
    names: BTreeMap<ItemIdentity, String>,
    name_to_id: HashMap<String, ItemIdentity>,
    short_names: Vec<(String, ItemIdentity)>,
    groups: BTreeMap<String, BTreeSet<ItemIdentity>>,
    stack_limits: BTreeMap<u32, u32>,
    default_max_stack: u32,
    token_cache: RwLock<HashMap<String, Arc<TokenIndex>>>,
}

impl Catalog {
    pub fn canonical_name(&self, identity: ItemIdentity) -> Option<&str> {
        self.names.get(&identity).map(String::as_str)
    }

    /// Short name of an identity. Linear scan; the table is small.
    pub fn short_name(&self, identity: ItemIdentity) -> Option<&str> {
        self.short_names
            .iter()
            .find(|(_, id)| *id == identity)
            .map(|(short, _)| short.as_str())
    }

    pub fn identity_of(&self, name: &str) -> Option<ItemIdentity> {
        self.name_to_id.get(&normalize(name)).copied()
    }

    pub fn identity_of_short_name(&self, short: &str) -> Option<ItemIdentity> {
        let short = normalize(short);
        self.short_names
            .iter()
            .find(|(s, _)| *s == short)
            .map(|(_, id)| *id)
    }

    /// Names of every group the identity belongs to, sorted.
    pub fn groups_containing(&self, identity: ItemIdentity) -> BTreeSet<&str> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(&identity))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Members of a group. Empty if the name is not a group.
    pub fn identities_in_group(&self, name: &str) -> BTreeSet<ItemIdentity> {
        self.groups.get(&normalize(name)).cloned().unwrap_or_default()
    }

    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(&normalize(name))
    }

    /// Registered variants of a type, ascending.
    pub fn identities_of_type(&self, type_id: u32) -> impl Iterator<Item = (ItemIdentity, &str)> + '_ {
        self.names
            .range(ItemIdentity::new(type_id, 0)..=ItemIdentity::new(type_id, u16::MAX))
            .map(|(id, name)| (*id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn max_stack_size(&self, identity: ItemIdentity) -> u32 {
        self.stack_limits
            .get(&identity.type_id)
            .copied()
            .unwrap_or(self.default_max_stack)
    }

    /// A batch of `count` items carrying this identity's stack limit.
    pub fn batch(&self, identity: ItemIdentity, count: u32) -> ItemBatch {
        ItemBatch::new(identity, count, self.max_stack_size(identity))
    }

    /// Group and short-name matches of a non-numeric token.
    ///
    /// Computed on first use of the token and reused afterwards.
    pub fn token_index(&self, token: &str) -> Arc<TokenIndex> {
        let token = normalize(token);
        {
            let cache = self.token_cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(index) = cache.get(&token) {
                return Arc::clone(index);
            }
        }

        let index = Arc::new(TokenIndex {
            name: self.name_to_id.get(&token).copied(),
            is_group: self.groups.contains_key(&token),
            group: self.groups.get(&token).cloned().unwrap_or_default(),
            short_name: self
                .short_names
                .iter()
                .find(|(s, _)| *s == token)
                .map(|(_, id)| *id),
        });
        let mut cache = self.token_cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(token).or_insert(index))
    }

    /// Number of distinct tokens memoized so far.
    pub fn cached_tokens(&self) -> usize {
        self.token_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Does `identity` belong to the group named `token`?
    pub fn in_group(&self, token: &str, identity: ItemIdentity) -> bool {
        self.token_index(token).group.contains(&identity)
    }

    /// Classify a filter token.
    ///
    /// Digit-leading tokens are numeric ids (`type` or `type|variant`);
    /// anything else is tried as exact name, group name, then short name.
    pub fn resolve_token(&self, token: &str) -> TokenClass {
        let token = normalize(token);
        if token == WILDCARD {
            return TokenClass::Wildcard;
        }
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            if token.contains(ID_DELIMITER) {
                return match token.parse::<ItemIdentity>() {
                    Ok(id) if self.names.contains_key(&id) => TokenClass::Exact(id),
                    _ => TokenClass::Unresolved,
                };
            }
            return match token.parse::<u32>() {
                Ok(type_id) if self.identities_of_type(type_id).next().is_some() => {
                    TokenClass::TypeId(type_id)
                }
                _ => TokenClass::Unresolved,
            };
        }

        let index = self.token_index(&token);
        if let Some(id) = index.name {
            TokenClass::Name(id)
        } else if index.is_group {
            TokenClass::Group(token)
        } else if let Some(id) = index.short_name {
            TokenClass::ShortName(id)
        } else {
            TokenClass::Unresolved
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate item name: {0}")]
    DuplicateName(String),
    #[error("identity {0} is already named")]
    DuplicateIdentity(ItemIdentity),
    #[error("duplicate short name: {0}")]
    DuplicateShortName(String),
    #[error("empty name for {0}")]
    EmptyName(ItemIdentity),
    #[error("empty group name")]
    EmptyGroupName,
    #[error("unregistered identity {identity} referenced by {context}")]
    UnknownIdentity {
        identity: ItemIdentity,
        context: String,
    },
    #[error("stack limit of type {0} must be at least 1")]
    ZeroStackLimit(u32),
}
