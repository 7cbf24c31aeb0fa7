//! Orders: stored shape, write path and read-time customer join.

mod model;
mod resolver;
mod service;

pub use model::{CUSTOMER_FIELD, CUSTOMER_ID_FIELD, Item, Order, ResolvedOrder};
pub use resolver::{JoinStrategy, OrderResolver};
pub use service::OrderService;
