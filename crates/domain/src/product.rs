//! Product entity.

use common::EntityId;
use document_store::Collection;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::omit::is_zero_f64;

/// A product with its current list price.
///
/// Orders snapshot the price into their items, so changing it here never
/// alters existing orders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "EntityId::is_unassigned")]
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub price: f64,
}

impl Product {
    /// Creates an unsaved product.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: EntityId::unassigned(),
            name: name.into(),
            price,
        }
    }
}

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;
    const NAME: &'static str = "product";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
