//! QR scanner page.

use crate::api::driver::{DateFilter, filter_by_date, scan_history};
use crate::server::state::AppState;
use crate::types::{Principal, Ticket, ValidationResponse};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use busdesk_web::AppError;
use serde::{Deserialize, Serialize};

/// Query of `GET /dashboard/qr-scanner`.
#[derive(Debug, Default, Deserialize)]
pub struct ScannerQuery {
    /// Travel-date filter; defaults to today
    #[serde(default)]
    pub filter: DateFilter,
}

/// Data behind the scanner page.
#[derive(Debug, Serialize)]
pub struct ScannerPage {
    /// Applied filter
    pub filter: DateFilter,
    /// Matching tickets
    pub tickets: Vec<Ticket>,
    /// How many of them were already validated
    pub validated: usize,
    /// Every scanned ticket, whatever its travel day, most recent scan first
    pub history: Vec<Ticket>,
}

/// Body of `POST /dashboard/qr-scanner/validate`.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Hash decoded from the QR code
    pub hash: String,
}

/// `GET /dashboard/qr-scanner`
///
/// # Errors
///
/// Backend failures.
pub async fn scanner_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ScannerQuery>,
) -> Result<Json<ScannerPage>, AppError> {
    let tickets = state.client_for(&principal).driver_tickets().await?;
    let history = scan_history(&tickets);
    let tickets = filter_by_date(tickets, query.filter, state.today());
    Ok(Json(ScannerPage {
        filter: query.filter,
        validated: tickets.iter().filter(|t| t.is_validated()).count(),
        tickets,
        history,
    }))
}

/// `POST /dashboard/qr-scanner/validate`
///
/// # Errors
///
/// 422 for an empty hash; a backend rejection keeps the backend's message.
pub async fn validate_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(scan): Json<ScanRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    let hash = scan.hash.trim();
    if hash.is_empty() {
        return Err(AppError::validation("Scan a ticket code first"));
    }
    let result = state.client_for(&principal).validate_ticket(hash).await?;
    tracing::info!(driver_id = principal.id, success = result.success, "Ticket scanned");
    Ok(Json(result))
}
