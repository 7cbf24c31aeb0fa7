//! Customer entity.

use common::EntityId;
use document_store::Collection;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// A customer that orders reference by id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "EntityId::is_unassigned")]
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Customer {
    /// Creates an unsaved customer with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::unassigned(),
            name: name.into(),
        }
    }
}

impl Entity for Customer {
    const COLLECTION: Collection = Collection::Customers;
    const NAME: &'static str = "customer";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_value(Customer::named("Ana")).unwrap();
        assert_eq!(json, json!({"name": "Ana"}));
        assert_eq!(serde_json::to_value(Customer::default()).unwrap(), json!({}));
    }

    #[test]
    fn decodes_partial_payload() {
        let customer: Customer = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(customer.id.as_str(), "c1");
        assert!(customer.name.is_empty());
    }
}
