//! Generic CRUD over independently owned entities.

use std::marker::PhantomData;

use common::EntityId;
use document_store::{
    Collection, Context, DeleteResult, DocumentStore, DocumentStoreExt, EntityStoreError,
    ID_FIELD, UpdateResult, to_document,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::DomainError;

/// A top-level record stored in its own collection and addressed by id.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection holding this entity type.
    const COLLECTION: Collection;

    /// Human-readable entity name used in errors and logs.
    const NAME: &'static str;

    /// Returns the entity's identifier.
    fn id(&self) -> &EntityId;

    /// Replaces the entity's identifier.
    fn set_id(&mut self, id: EntityId);
}

/// Decodes an inbound JSON payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, DomainError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Maps a store-level not-found into the domain's not-found for `entity`.
pub(crate) fn not_found_as(entity: &'static str) -> impl Fn(EntityStoreError) -> DomainError {
    move |err| match err {
        EntityStoreError::NotFound { id, .. } => DomainError::NotFound { entity, id },
        other => DomainError::Store(other),
    }
}

/// Service providing list/get/create/update/delete for one entity type.
pub struct EntityService<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    store: S,
    _phantom: PhantomData<E>,
}

impl<S, E> EntityService<S, E>
where
    S: DocumentStore,
    E: Entity,
{
    /// Creates a new entity service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns every stored entity.
    #[tracing::instrument(skip(self, ctx), fields(entity = E::NAME))]
    pub async fn list(&self, ctx: &Context) -> Result<Vec<E>, DomainError> {
        Ok(self.store.find_all_as(ctx, E::COLLECTION).await?)
    }

    /// Returns the entity with the given id.
    #[tracing::instrument(skip(self, ctx), fields(entity = E::NAME))]
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<E, DomainError> {
        self.store
            .find_by_id_as(ctx, E::COLLECTION, id)
            .await
            .map_err(not_found_as(E::NAME))
    }

    /// Stores a new entity under a freshly generated id and returns it.
    ///
    /// Any id carried by the payload is replaced.
    #[tracing::instrument(skip(self, ctx, entity), fields(entity = E::NAME))]
    pub async fn create(&self, ctx: &Context, mut entity: E) -> Result<E, DomainError> {
        entity.set_id(EntityId::new());
        self.store.insert_as(ctx, E::COLLECTION, &entity).await?;
        tracing::info!(id = %entity.id(), "created {}", E::NAME);
        Ok(entity)
    }

    /// Merge-sets the entity's non-empty fields onto the stored document.
    ///
    /// The stored id is never changed. An unknown id matches nothing and is
    /// reported through `UpdateResult::matched` rather than as an error.
    #[tracing::instrument(skip(self, ctx, entity), fields(entity = E::NAME))]
    pub async fn update(
        &self,
        ctx: &Context,
        id: &str,
        mut entity: E,
    ) -> Result<(E, UpdateResult), DomainError> {
        let mut patch = to_document(&entity)?;
        patch.remove(ID_FIELD);
        let result = self
            .store
            .update_by_id(ctx, E::COLLECTION, id, patch)
            .await?;
        if result.matched == 0 {
            tracing::debug!(%id, "update matched no document");
        }
        entity.set_id(EntityId::from(id));
        Ok((entity, result))
    }

    /// Deletes the entity with the given id; unknown ids are a no-op.
    #[tracing::instrument(skip(self, ctx), fields(entity = E::NAME))]
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<DeleteResult, DomainError> {
        Ok(self.store.delete_by_id(ctx, E::COLLECTION, id).await?)
    }
}
