//! Shared application state.

use std::time::Duration;

use document_store::{Context, DocumentStore};
use domain::{CustomerService, JoinStrategy, OrderService, ProductService};
use tokio_util::sync::CancellationToken;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub customers: CustomerService<S>,
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
    /// Deadline applied to every store call made while handling a request.
    pub store_timeout: Option<Duration>,
    /// Cancelled on server shutdown; request contexts derive from it.
    pub shutdown: CancellationToken,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Builds the services over one shared store.
    pub fn new(
        store: S,
        join_strategy: JoinStrategy,
        store_timeout: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            customers: CustomerService::new(store.clone()),
            products: ProductService::new(store.clone()),
            orders: OrderService::new(store, join_strategy),
            store_timeout,
            shutdown,
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    /// Creates the context for one request's store calls.
    pub fn request_context(&self) -> Context {
        Context::child_of(&self.shutdown).with_optional_timeout(self.store_timeout)
    }
}
