//! Order service providing the order write path and joined reads.

use chrono::Utc;
use common::EntityId;
use document_store::{
    Collection, Context, DeleteResult, DocumentStore, DocumentStoreExt, UpdateResult,
};

use super::model::{Order, ResolvedOrder};
use super::resolver::{JoinStrategy, OrderResolver};
use crate::error::DomainError;

/// Service for managing orders.
///
/// Writes stamp identifiers and timestamps and persist the order verbatim;
/// reads go through the [`OrderResolver`] so every returned order carries
/// its customer.
pub struct OrderService<S: DocumentStore> {
    store: S,
    resolver: OrderResolver<S>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    /// Creates a new order service with the given store and join strategy.
    pub fn new(store: S, strategy: JoinStrategy) -> Self {
        Self {
            resolver: OrderResolver::new(store.clone(), strategy),
            store,
        }
    }
}

impl<S: DocumentStore> OrderService<S> {
    /// Lists every order that has a customer, each with the customer attached.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list(&self, ctx: &Context) -> Result<Vec<ResolvedOrder>, DomainError> {
        self.resolver.resolve_all(ctx).await
    }

    /// Returns one order with its customer attached.
    ///
    /// Fails with `NotFound` when the order, or the customer it references,
    /// does not exist.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<ResolvedOrder, DomainError> {
        self.resolver
            .resolve_one(ctx, id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "order",
                id: id.to_string(),
            })
    }

    /// Stores a new order and returns it as stored.
    ///
    /// The caller-supplied `total` is kept as-is.
    #[tracing::instrument(skip(self, ctx, order), fields(customer = %order.customer_id))]
    pub async fn create(&self, ctx: &Context, mut order: Order) -> Result<Order, DomainError> {
        order.prepare_for_insert(Utc::now());
        self.store
            .insert_as(ctx, Collection::Orders, &order)
            .await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(id = %order.id, items = order.items.len(), "created order");
        Ok(order)
    }

    /// Merge-sets a replacement order onto the stored one and refreshes `updated`.
    ///
    /// `id` and `created` are never overwritten. An unknown id is a no-op
    /// reported through `UpdateResult::matched`; no order is created.
    #[tracing::instrument(skip(self, ctx, order))]
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        mut order: Order,
    ) -> Result<(Order, UpdateResult), DomainError> {
        let patch = order.update_patch(Utc::now())?;
        let result = self
            .store
            .update_by_id(ctx, Collection::Orders, id, patch)
            .await?;
        if result.matched == 0 {
            tracing::debug!(%id, "update matched no order");
        }

        order.id = EntityId::from(id);
        order.created = None;
        Ok((order, result))
    }

    /// Deletes an order; unknown ids are a no-op.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<DeleteResult, DomainError> {
        Ok(self
            .store
            .delete_by_id(ctx, Collection::Orders, id)
            .await?)
    }

    /// Returns the stored order without joining its customer.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_stored(&self, ctx: &Context, id: &str) -> Result<Order, DomainError> {
        self.store
            .find_by_id_as(ctx, Collection::Orders, id)
            .await
            .map_err(crate::entity::not_found_as("order"))
    }
}
