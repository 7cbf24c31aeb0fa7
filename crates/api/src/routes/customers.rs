//! Customer CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::Customer;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /customers — list all customers.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.customers.list(&state.request_context()).await?;
    Ok(Json(customers))
}

/// GET /customers/{id} — load a customer by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state.customers.get(&state.request_context(), &id).await?;
    Ok(Json(customer))
}

/// POST /customers — create a customer under a generated id.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer: Customer = domain::decode(&body)?;
    let created = state
        .customers
        .create(&state.request_context(), customer)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /customers/{id} — merge the supplied fields into a customer.
#[tracing::instrument(skip(state, body))]
pub async fn update<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Customer>, ApiError> {
    let customer: Customer = domain::decode(&body)?;
    let (customer, _) = state
        .customers
        .update(&state.request_context(), &id, customer)
        .await?;
    Ok(Json(customer))
}

/// DELETE /customers/{id} — delete a customer; unknown ids succeed.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .customers
        .delete(&state.request_context(), &id)
        .await?;
    Ok(StatusCode::OK)
}
