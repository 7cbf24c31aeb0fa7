//! Read-time join of orders to their customers.

use std::str::FromStr;

use document_store::{
    Collection, Context, DocumentStore, DocumentStoreExt, EntityStoreError, Filter, ID_FIELD,
    Pipeline,
};

use super::model::{CUSTOMER_FIELD, CUSTOMER_ID_FIELD, Order, ResolvedOrder};
use crate::customer::Customer;
use crate::error::DomainError;

/// How orders are joined to customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStrategy {
    /// A lookup/unwind pipeline evaluated by the store in one operation.
    #[default]
    Pipeline,
    /// A point lookup of each order's customer issued from here.
    Application,
}

impl FromStr for JoinStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pipeline" => Ok(Self::Pipeline),
            "application" | "app" => Ok(Self::Application),
            other => Err(format!("unknown join strategy: {other}")),
        }
    }
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeline => f.write_str("pipeline"),
            Self::Application => f.write_str("application"),
        }
    }
}

/// Attaches each order's customer for read responses.
///
/// Orders whose `customerID` matches no stored customer are left out of
/// the output rather than returned without a customer. The resolver keeps
/// no state between calls.
#[derive(Clone)]
pub struct OrderResolver<S: DocumentStore> {
    store: S,
    strategy: JoinStrategy,
}

impl<S: DocumentStore> OrderResolver<S> {
    /// Creates a resolver over `store` using `strategy`.
    pub fn new(store: S, strategy: JoinStrategy) -> Self {
        Self { store, strategy }
    }

    /// The lookup/unwind pipeline joining orders to customers on `customerID = id`.
    pub fn customer_join() -> Pipeline {
        Self::join_customer(Pipeline::new())
    }

    fn join_customer(pipeline: Pipeline) -> Pipeline {
        pipeline
            .lookup(Collection::Customers, CUSTOMER_ID_FIELD, ID_FIELD, CUSTOMER_FIELD)
            .unwind(CUSTOMER_FIELD)
    }

    /// Resolves every order that has a customer, in store order.
    #[tracing::instrument(skip(self, ctx), fields(strategy = %self.strategy))]
    pub async fn resolve_all(&self, ctx: &Context) -> Result<Vec<ResolvedOrder>, DomainError> {
        let resolved: Vec<ResolvedOrder> = match self.strategy {
            JoinStrategy::Pipeline => {
                self.store
                    .aggregate_as(ctx, Collection::Orders, Self::customer_join())
                    .await?
            }
            JoinStrategy::Application => {
                let orders: Vec<Order> = self.store.find_all_as(ctx, Collection::Orders).await?;
                let mut resolved = Vec::with_capacity(orders.len());
                for order in orders {
                    if let Some(order) = self.attach_customer(ctx, order).await? {
                        resolved.push(order);
                    }
                }
                resolved
            }
        };
        tracing::debug!(count = resolved.len(), "resolved orders");
        Ok(resolved)
    }

    /// Resolves a single order.
    ///
    /// Returns `None` when the order does not exist or its customer does not.
    #[tracing::instrument(skip(self, ctx), fields(strategy = %self.strategy))]
    pub async fn resolve_one(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<Option<ResolvedOrder>, DomainError> {
        match self.strategy {
            JoinStrategy::Pipeline => {
                // Select the order first so only it is joined.
                let pipeline = Self::join_customer(Pipeline::new().filter(Filter::by_id(id)));
                let resolved: Vec<ResolvedOrder> = self
                    .store
                    .aggregate_as(ctx, Collection::Orders, pipeline)
                    .await?;
                Ok(resolved.into_iter().next())
            }
            JoinStrategy::Application => {
                match self
                    .store
                    .find_by_id_as::<Order>(ctx, Collection::Orders, id)
                    .await
                {
                    Ok(order) => self.attach_customer(ctx, order).await,
                    Err(EntityStoreError::NotFound { .. }) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn attach_customer(
        &self,
        ctx: &Context,
        order: Order,
    ) -> Result<Option<ResolvedOrder>, DomainError> {
        match self
            .store
            .find_by_id_as::<Customer>(ctx, Collection::Customers, order.customer_id.as_str())
            .await
        {
            Ok(customer) => Ok(Some(ResolvedOrder { order, customer })),
            Err(EntityStoreError::NotFound { .. }) => {
                tracing::debug!(order = %order.id, customer = %order.customer_id, "dropping order without customer");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
