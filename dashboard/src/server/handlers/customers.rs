//! Sales-agent customer pages.

use crate::server::state::AppState;
use crate::types::{Customer, Id, Principal, Ticket};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use busdesk_web::AppError;
use serde::{Deserialize, Serialize};

/// Body of `PUT /dashboard/customers/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    /// New status id
    pub status_id: Id,
}

/// A customer with their tickets.
#[derive(Debug, Serialize)]
pub struct CustomerTickets {
    /// The customer
    pub customer: Customer,
    /// Their tickets
    pub tickets: Vec<Ticket>,
}

/// `GET /dashboard/customers`
///
/// # Errors
///
/// Backend failures.
pub async fn list_customers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Customer>>, AppError> {
    Ok(Json(state.client_for(&principal).customers().await?))
}

/// `GET /dashboard/customers/{id}/tickets`
///
/// # Errors
///
/// 404 for an unknown customer; other backend failures.
pub async fn customer_tickets(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
) -> Result<Json<CustomerTickets>, AppError> {
    let client = state.client_for(&principal);
    let (customer, tickets) = tokio::try_join!(client.customer(id), client.customer_tickets(id))?;
    Ok(Json(CustomerTickets { customer, tickets }))
}

/// `PUT /dashboard/customers/{id}/status`
///
/// # Errors
///
/// Backend failures.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
    Json(change): Json<StatusChange>,
) -> Result<StatusCode, AppError> {
    state
        .client_for(&principal)
        .update_customer_status(id, change.status_id)
        .await?;
    tracing::info!(customer_id = id, status_id = change.status_id, "Customer status changed");
    Ok(StatusCode::NO_CONTENT)
}
