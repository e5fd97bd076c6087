//! Identifiers for rumors, variants and the entities that hear them

use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a rumor or a variant, based on UUIDv7
///
/// Rumors and variants share one id space so that a spread request can name
/// either without saying which it is. UUIDv7 provides:
/// - Chronological sortability (newest-first listings sort by id)
/// - 128-bit uniqueness without coordination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SubjectId(u128);

/// Id of a root rumor
pub type RumorId = SubjectId;

/// Id of a variant
pub type VariantId = SubjectId;

impl SubjectId {
    /// Generate a new UUIDv7-based id
    ///
    /// # Examples
    ///
    /// ```
    /// use rumor_domain::SubjectId;
    ///
    /// let id = SubjectId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an id from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an id from its UUID string form
    ///
    /// # Examples
    ///
    /// ```
    /// use rumor_domain::SubjectId;
    ///
    /// let id = SubjectId::new();
    /// let parsed = SubjectId::parse(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| DomainError::InvalidParameter(format!("Invalid id '{}': {}", s, e)))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Big-endian byte form used by the SQLite adapter
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Rebuild an id from its big-endian byte form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            DomainError::InvalidParameter(format!("Expected 16 bytes for id, got {}", bytes.len()))
        })?;
        Ok(Self(u128::from_be_bytes(arr)))
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl FromStr for SubjectId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SubjectId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Reference to an entity (NPC, player, faction) that can hold beliefs
///
/// Entity ids are opaque to the engine; the only rule is that they are not empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity id
    ///
    /// # Errors
    /// Returns `InvalidParameter` if the id is empty or only whitespace
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::InvalidParameter(
                "Entity id cannot be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
