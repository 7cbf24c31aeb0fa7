//! Document collections for the order management service.
//!
//! Provides the `DocumentStore` capability (point lookup, scan, insert,
//! merge-set update, delete and aggregation pipelines), a typed query
//! builder for filters and pipeline joins, per-request cancellation, and
//! in-memory and PostgreSQL implementations.

pub mod context;
pub mod document;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod postgres;
pub mod query;
pub mod store;

pub use context::Context;
pub use document::{Collection, Document, ID_FIELD, document_id, from_document, to_document};
pub use error::{EntityStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{Filter, Lookup, Pipeline, Stage, Unwind};
pub use store::{DeleteResult, DocumentStore, DocumentStoreExt, UpdateResult};
pub use tokio_util::sync::CancellationToken;
