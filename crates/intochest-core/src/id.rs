use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the type id and the variant in an identity key.
pub const ID_DELIMITER: char = '|';

/// Stack limit used when nothing more specific is known about an item type.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// Identifies an item by numeric type and variant. Cheap to copy and compare.
///
/// The canonical key is `"type|variant"`, e.g. `17|2` for birch wood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemIdentity {
    pub type_id: u32,
    pub variant: u16,
}

impl ItemIdentity {
    pub const fn new(type_id: u32, variant: u16) -> Self {
        Self { type_id, variant }
    }

    /// Canonical `"type|variant"` key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Group-level key: the type id alone.
    pub fn type_key(&self) -> String {
        self.type_id.to_string()
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_id, ID_DELIMITER, self.variant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityParseError {
    #[error("missing '|' in item identifier '{0}'")]
    MissingDelimiter(String),
    #[error("invalid type id in item identifier '{0}'")]
    InvalidType(String),
    #[error("invalid variant in item identifier '{0}'")]
    InvalidVariant(String),
}

impl FromStr for ItemIdentity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (type_part, variant_part) = s
            .split_once(ID_DELIMITER)
            .ok_or_else(|| IdentityParseError::MissingDelimiter(s.to_string()))?;
        let type_id = type_part
            .trim()
            .parse()
            .map_err(|_| IdentityParseError::InvalidType(s.to_string()))?;
        let variant = variant_part
            .trim()
            .parse()
            .map_err(|_| IdentityParseError::InvalidVariant(s.to_string()))?;
        Ok(Self { type_id, variant })
    }
}

/// A quantity of one item identity, together with the stack limit that
/// applies to it (not every identity stacks to the same size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBatch {
    pub identity: ItemIdentity,
    pub count: u32,
    pub max_stack_size: u32,
}

impl ItemBatch {
    pub fn new(identity: ItemIdentity, count: u32, max_stack_size: u32) -> Self {
        Self {
            identity,
            count,
            max_stack_size,
        }
    }

    /// A batch of a type that stacks to [`DEFAULT_MAX_STACK`].
    pub fn stackable(identity: ItemIdentity, count: u32) -> Self {
        Self::new(identity, count, DEFAULT_MAX_STACK)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Room left before this stack reaches its limit.
    pub fn headroom(&self) -> u32 {
        self.max_stack_size.saturating_sub(self.count)
    }
}

/// One inventory slot. `None` is an empty slot.
pub type Slot = Option<ItemBatch>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_pipe_delimiter() {
        assert_eq!(ItemIdentity::new(17, 2).key(), "17|2");
        assert_eq!(ItemIdentity::new(17, 2).type_key(), "17");
    }

    #[test]
    fn parse_identity() {
        assert_eq!("17|2".parse::<ItemIdentity>(), Ok(ItemIdentity::new(17, 2)));
        assert_eq!(" 359 | 0 ".parse::<ItemIdentity>(), Ok(ItemIdentity::new(359, 0)));
    }

    #[test]
    fn parse_identity_errors() {
        assert!(matches!(
            "17".parse::<ItemIdentity>(),
            Err(IdentityParseError::MissingDelimiter(_))
        ));
        assert!(matches!(
            "wood|2".parse::<ItemIdentity>(),
            Err(IdentityParseError::InvalidType(_))
        ));
        assert!(matches!(
            "17|x".parse::<ItemIdentity>(),
            Err(IdentityParseError::InvalidVariant(_))
        ));
    }

    #[test]
    fn identities_order_by_type_then_variant() {
        let mut ids = vec![
            ItemIdentity::new(17, 1),
            ItemIdentity::new(5, 3),
            ItemIdentity::new(17, 0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ItemIdentity::new(5, 3),
                ItemIdentity::new(17, 0),
                ItemIdentity::new(17, 1)
            ]
        );
    }

    #[test]
    fn batch_headroom() {
        let batch = ItemBatch::stackable(ItemIdentity::new(1, 0), 60);
        assert_eq!(batch.headroom(), 4);
        let tool = ItemBatch::new(ItemIdentity::new(359, 0), 1, 1);
        assert_eq!(tool.headroom(), 0);
        assert!(!tool.is_empty());
    }
}
