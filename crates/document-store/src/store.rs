use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{from_document, to_document};
use crate::{Collection, Context, Document, Pipeline, Result};

/// Outcome of a merge-set update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Number of documents the id matched (0 or 1).
    pub matched: u64,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    /// Number of documents removed (0 or 1).
    pub deleted: u64,
}

/// Core trait for document store implementations.
///
/// A store holds one collection per entity type, each keyed by the string
/// `id` field of its documents. All implementations must be thread-safe
/// (Send + Sync) and every call is bounded by the caller's [`Context`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self, ctx: &Context) -> Result<()>;

    /// Returns every document of a collection in implementation-defined order.
    ///
    /// Either the whole collection is returned or the call fails.
    async fn find_all(&self, ctx: &Context, collection: Collection) -> Result<Vec<Document>>;

    /// Returns the document with the given id.
    ///
    /// Fails with `NotFound` if no document matches.
    async fn find_by_id(&self, ctx: &Context, collection: Collection, id: &str)
    -> Result<Document>;

    /// Stores a document verbatim.
    ///
    /// The document must already carry its `id`; the store never assigns one.
    async fn insert(&self, ctx: &Context, collection: Collection, doc: Document) -> Result<()>;

    /// Merges the fields of `patch` into the document with the given id.
    ///
    /// Fields absent from `patch` are left untouched. An id that matches
    /// nothing is a successful no-op reported as `matched == 0`; nothing is
    /// inserted.
    async fn update_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> Result<UpdateResult>;

    /// Removes the document with the given id. Missing ids are a no-op.
    async fn delete_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
    ) -> Result<DeleteResult>;

    /// Runs an aggregation pipeline over a collection.
    async fn aggregate(
        &self,
        ctx: &Context,
        collection: Collection,
        pipeline: Pipeline,
    ) -> Result<Vec<Document>>;
}

/// Extension trait providing typed convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Returns every document of a collection decoded as `T`.
    ///
    /// A single undecodable document fails the whole call.
    async fn find_all_as<T>(&self, ctx: &Context, collection: Collection) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.find_all(ctx, collection)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Returns the document with the given id decoded as `T`.
    async fn find_by_id_as<T>(&self, ctx: &Context, collection: Collection, id: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        from_document(self.find_by_id(ctx, collection, id).await?)
    }

    /// Serializes `value` and inserts it.
    async fn insert_as<T>(&self, ctx: &Context, collection: Collection, value: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let doc = to_document(value)?;
        self.insert(ctx, collection, doc).await
    }

    /// Runs a pipeline and decodes each output document as `T`.
    async fn aggregate_as<T>(
        &self,
        ctx: &Context,
        collection: Collection,
        pipeline: Pipeline,
    ) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.aggregate(ctx, collection, pipeline)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Records a store call in the `store_operations_total` counter.
pub(crate) fn record_operation(collection: Collection, operation: &'static str) {
    metrics::counter!(
        "store_operations_total",
        "collection" => collection.as_str(),
        "operation" => operation
    )
    .increment(1);
}
