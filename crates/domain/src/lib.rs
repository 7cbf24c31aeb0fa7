//! Domain layer for the order management service.
//!
//! This crate provides:
//! - Customer, Product and Order data model with their wire names
//! - `EntityService` for generic CRUD on customers and products
//! - `OrderService` for the order write path (ids, timestamps)
//! - `OrderResolver` joining orders to customers at read time

pub mod customer;
pub mod entity;
pub mod error;
mod omit;
pub mod order;
pub mod product;

pub use customer::Customer;
pub use entity::{Entity, EntityService, decode};
pub use error::DomainError;
pub use order::{Item, JoinStrategy, Order, OrderResolver, OrderService, ResolvedOrder};
pub use product::Product;

/// CRUD service for customers.
pub type CustomerService<S> = EntityService<S, Customer>;

/// CRUD service for products.
pub type ProductService<S> = EntityService<S, Product>;
