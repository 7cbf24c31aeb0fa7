//! Order CRUD endpoints with customer-joined reads.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::{Order, ResolvedOrder};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /orders — list orders joined to their customers.
///
/// Orders whose customer no longer exists are left out.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ResolvedOrder>>, ApiError> {
    let orders = state.orders.list(&state.request_context()).await?;
    Ok(Json(orders))
}

/// GET /orders/{id} — load one order joined to its customer.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedOrder>, ApiError> {
    let order = state.orders.get(&state.request_context(), &id).await?;
    Ok(Json(order))
}

/// POST /orders — create an order, stamping ids and timestamps.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order: Order = domain::decode(&body)?;
    let created = state.orders.create(&state.request_context(), order).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /orders/{id} — merge a replacement order and refresh `updated`.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Order>, ApiError> {
    let order: Order = domain::decode(&body)?;
    let (order, _) = state
        .orders
        .update(&state.request_context(), &id, order)
        .await?;
    Ok(Json(order))
}

/// DELETE /orders/{id} — delete an order; unknown ids succeed.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orders.delete(&state.request_context(), &id).await?;
    Ok(StatusCode::OK)
}
