use chrono::{DateTime, Utc};
use common::EntityId;
use document_store::{Document, ID_FIELD, to_document};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::error::DomainError;
use crate::omit::{is_zero_f64, is_zero_i64};

/// Name of the field the resolved customer is attached under.
pub const CUSTOMER_FIELD: &str = "customer";

/// Field of an order holding the referenced customer's id.
pub const CUSTOMER_ID_FIELD: &str = "customerID";

/// Field of an order holding its creation time.
pub const CREATED_FIELD: &str = "created";

/// One line of an order, embedded in and owned by the order.
///
/// `price` is the unit price captured when the order was placed and is
/// never refreshed from the product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "EntityId::is_unassigned")]
    pub id: EntityId,

    #[serde(
        rename = "productID",
        default,
        skip_serializing_if = "EntityId::is_unassigned"
    )]
    pub product_id: EntityId,

    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub quantity: i64,

    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub price: f64,
}

impl Item {
    /// Creates an unsaved item.
    pub fn new(product_id: impl Into<EntityId>, quantity: i64, price: f64) -> Self {
        Self {
            id: EntityId::unassigned(),
            product_id: product_id.into(),
            quantity,
            price,
        }
    }
}

/// An order as stored in the `orders` collection.
///
/// `total` and `status` are taken from the caller as-is; the total is not
/// recomputed from the items and status changes are not validated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "EntityId::is_unassigned")]
    pub id: EntityId,

    #[serde(
        rename = "customerID",
        default,
        skip_serializing_if = "EntityId::is_unassigned"
    )]
    pub customer_id: EntityId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub total: f64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an unsaved order for a customer.
    pub fn for_customer(customer_id: impl Into<EntityId>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Default::default()
        }
    }

    /// Adds an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Sets the caller-supplied total.
    pub fn with_total(mut self, total: f64) -> Self {
        self.total = total;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Prepares a decoded payload for insertion.
    ///
    /// Assigns a fresh order id, an id to every item that lacks one, and
    /// sets `created` and `updated` to the same instant.
    pub fn prepare_for_insert(&mut self, now: DateTime<Utc>) {
        self.id = EntityId::new();
        for item in &mut self.items {
            if item.id.is_unassigned() {
                item.id = EntityId::new();
            }
        }
        self.created = Some(now);
        self.updated = Some(now);
    }

    /// Builds the merge-set patch for an update received at `now`.
    ///
    /// Refreshes `updated` and leaves out `id` and `created`, which never
    /// change after insertion. Empty fields are absent from the patch and so
    /// keep their stored values.
    pub fn update_patch(&mut self, now: DateTime<Utc>) -> Result<Document, DomainError> {
        self.updated = Some(now);
        let mut patch = to_document(self)?;
        patch.remove(ID_FIELD);
        patch.remove(CREATED_FIELD);
        Ok(patch)
    }
}

/// An order enriched with its customer for a read response.
///
/// The customer is a read-time projection and is never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOrder {
    #[serde(flatten)]
    pub order: Order,

    pub customer: Customer,
}
