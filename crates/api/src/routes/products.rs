//! Product CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::Product;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /products — list all products.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.list(&state.request_context()).await?;
    Ok(Json(products))
}

/// GET /products/{id} — load a product by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.get(&state.request_context(), &id).await?;
    Ok(Json(product))
}

/// POST /products — create a product under a generated id.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product: Product = domain::decode(&body)?;
    let created = state
        .products
        .create(&state.request_context(), product)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /products/{id} — merge the supplied fields into a product.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Product>, ApiError> {
    let product: Product = domain::decode(&body)?;
    let (product, _) = state
        .products
        .update(&state.request_context(), &id, product)
        .await?;
    Ok(Json(product))
}

/// DELETE /products/{id} — delete a product; unknown ids succeed.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .products
        .delete(&state.request_context(), &id)
        .await?;
    Ok(StatusCode::OK)
}
