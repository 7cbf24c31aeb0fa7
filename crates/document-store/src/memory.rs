use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::document_id;
use crate::pipeline;
use crate::store::{DeleteResult, DocumentStore, UpdateResult, record_operation};
use crate::{Collection, Context, Document, EntityStoreError, ID_FIELD, Pipeline, Result};

/// In-memory document store implementation for testing and local runs.
///
/// Documents are kept per collection in insertion order and provide the
/// same interface as the PostgreSQL implementation. Each operation takes
/// the lock once, so single-document writes are atomic.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents stored in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn position(docs: &[Document], id: &str) -> Option<usize> {
    docs.iter()
        .position(|doc| doc.get(ID_FIELD).and_then(|v| v.as_str()) == Some(id))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ping(&self, ctx: &Context) -> Result<()> {
        ctx.run(async { Ok(()) }).await
    }

    async fn find_all(&self, ctx: &Context, collection: Collection) -> Result<Vec<Document>> {
        record_operation(collection, "find_all");
        ctx.run(async {
            let store = self.collections.read().await;
            Ok(store.get(&collection).cloned().unwrap_or_default())
        })
        .await
    }

    async fn find_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
    ) -> Result<Document> {
        record_operation(collection, "find_by_id");
        ctx.run(async {
            let store = self.collections.read().await;
            let docs = store.get(&collection).map_or(&[][..], Vec::as_slice);
            position(docs, id)
                .map(|i| docs[i].clone())
                .ok_or_else(|| EntityStoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })
        })
        .await
    }

    async fn insert(&self, ctx: &Context, collection: Collection, doc: Document) -> Result<()> {
        record_operation(collection, "insert");
        let id = document_id(&doc)?.to_string();
        ctx.run(async move {
            let mut store = self.collections.write().await;
            let docs = store.entry(collection).or_default();
            if position(docs, &id).is_some() {
                return Err(EntityStoreError::DuplicateId { collection, id });
            }
            docs.push(doc);
            Ok(())
        })
        .await
    }

    async fn update_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
        patch: Document,
    ) -> Result<UpdateResult> {
        record_operation(collection, "update_by_id");
        ctx.run(async move {
            let mut store = self.collections.write().await;
            let Some(docs) = store.get_mut(&collection) else {
                return Ok(UpdateResult { matched: 0 });
            };
            let Some(i) = position(docs, id) else {
                return Ok(UpdateResult { matched: 0 });
            };
            let doc = &mut docs[i];
            for (field, value) in patch {
                // The primary id never changes.
                if field != ID_FIELD {
                    doc.insert(field, value);
                }
            }
            Ok(UpdateResult { matched: 1 })
        })
        .await
    }

    async fn delete_by_id(
        &self,
        ctx: &Context,
        collection: Collection,
        id: &str,
    ) -> Result<DeleteResult> {
        record_operation(collection, "delete_by_id");
        ctx.run(async {
            let mut store = self.collections.write().await;
            let Some(docs) = store.get_mut(&collection) else {
                return Ok(DeleteResult { deleted: 0 });
            };
            match position(docs, id) {
                Some(i) => {
                    docs.remove(i);
                    Ok(DeleteResult { deleted: 1 })
                }
                None => Ok(DeleteResult { deleted: 0 }),
            }
        })
        .await
    }

    async fn aggregate(
        &self,
        ctx: &Context,
        collection: Collection,
        pipeline: Pipeline,
    ) -> Result<Vec<Document>> {
        record_operation(collection, "aggregate");
        ctx.run(async {
            let store = self.collections.read().await;
            let input = store.get(&collection).map_or(&[][..], Vec::as_slice);
            let output = pipeline::evaluate(input, &pipeline, |from| {
                store.get(&from).map_or(&[][..], Vec::as_slice)
            });
            tracing::debug!(
                %collection,
                stages = ?pipeline.stage_names(),
                results = output.len(),
                "evaluated pipeline"
            );
            Ok(output)
        })
        .await
    }
}
