//! Shared types for the order management service.

mod types;

pub use types::EntityId;
