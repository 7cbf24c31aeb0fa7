use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EntityStoreError, Result};

/// A stored record: a JSON object keyed by its string `id` field.
pub type Document = Map<String, Value>;

/// Name of the primary key field present on every document.
pub const ID_FIELD: &str = "id";

/// The collections held by the store, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Customers,
    Products,
    Orders,
}

impl Collection {
    /// Returns the stable collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Orders => "orders",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the document's primary id, failing if it is missing or not a non-empty string.
pub fn document_id(doc: &Document) -> Result<&str> {
    match doc.get(ID_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        Some(_) => Err(EntityStoreError::InvalidDocument(
            "`id` must be a non-empty string".to_string(),
        )),
        None => Err(EntityStoreError::InvalidDocument(
            "document has no `id`".to_string(),
        )),
    }
}

/// Serializes a value into a document, rejecting anything that is not a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(EntityStoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Decodes a document into a typed value.
pub fn from_document<T: for<'de> Deserialize<'de>>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
