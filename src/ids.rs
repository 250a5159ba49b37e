//! Typed Wikibase entity ids.
//!
//! Every remote entity is addressed by a two-part code: a kind letter (`Q`
//! for items, `P` for properties) followed by digits. [`EntityId`] validates
//! that shape once, before any network call is attempted; everything past the
//! parse works with the typed value.

use serde::{Deserialize, Serialize};

use crate::error::IdError;

/// What kind of Wikibase entity an id addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// A `Q…` item.
    Item,
    /// A `P…` property.
    Property,
}

impl EntityKind {
    /// The kind letter prefixing ids of this kind.
    pub fn letter(self) -> char {
        match self {
            EntityKind::Item => 'Q',
            EntityKind::Property => 'P',
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Item => write!(f, "item"),
            EntityKind::Property => write!(f, "property"),
        }
    }
}

/// A validated Wikibase entity id (`Q42`, `P31`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    kind: EntityKind,
    number: u64,
}

impl EntityId {
    /// Parse an id, requiring the full `Q…`/`P…` shape.
    ///
    /// The shape check runs before any network call; a malformed id is a
    /// caller error, not a data error.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let malformed = || IdError::Malformed { id: raw.to_string() };
        let mut chars = raw.chars();
        let kind = match chars.next() {
            Some('Q') => EntityKind::Item,
            Some('P') => EntityKind::Property,
            _ => return Err(malformed()),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let number = digits.parse().map_err(|_| malformed())?;
        Ok(Self { kind, number })
    }

    /// Whether a string has the entity id shape, without building the id.
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    /// The entity kind encoded in the id letter.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The numeric part of the id.
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.number)
    }
}

impl std::str::FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}
