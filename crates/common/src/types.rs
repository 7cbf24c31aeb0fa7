use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored entity or an order line item.
///
/// Identifiers are random UUID v4 values kept in their textual form, since
/// the document store keys every document by a string. An empty identifier
/// means "not yet assigned" and is what a decoded payload without an `id`
/// field carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the empty, not-yet-assigned ID.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Returns true if no ID has been assigned.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the textual form of the ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
