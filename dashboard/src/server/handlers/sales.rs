//! Sell-ticket page and the sale dialog.

use crate::api::admin::Schedules;
use crate::sale::{SaleAction, SaleState};
use crate::server::dialog::{DialogCommand, DialogSnapshot, SaleDialog};
use crate::server::error::store_error;
use crate::server::state::AppState;
use crate::types::{Id, Principal, Schedule, SeatNumber, Ticket};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use busdesk_web::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Page
// ============================================================================

/// Data behind the sell-ticket page.
#[derive(Debug, Serialize)]
pub struct SellTicketPage {
    /// Tickets the agent sold
    pub tickets: Vec<Ticket>,
    /// Schedules offered in the dialog
    pub schedules: Vec<Schedule>,
}

/// `GET /dashboard/sell-ticket`
///
/// # Errors
///
/// Backend failures.
pub async fn sell_ticket_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SellTicketPage>, AppError> {
    let client = state.client_for(&principal);
    let (tickets, schedules) =
        tokio::try_join!(client.agent_tickets(), client.list::<Schedules>())?;
    Ok(Json(SellTicketPage { tickets, schedules }))
}

/// Query of `GET /dashboard/sell-ticket/seats`.
#[derive(Debug, Deserialize)]
pub struct SeatQuery {
    /// Schedule
    pub schedule_id: Id,
    /// Travel date
    pub schedule_date: NaiveDate,
    /// Seat of the ticket being edited, always offered
    pub held_seat: Option<SeatNumber>,
}

/// `GET /dashboard/sell-ticket/seats`
///
/// # Errors
///
/// Backend failures.
pub async fn available_seats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SeatQuery>,
) -> Result<Json<Vec<SeatNumber>>, AppError> {
    let client = state.client_for(&principal);
    let seats = match query.held_seat {
        Some(held) => {
            client
                .available_seats_for_edit(query.schedule_id, query.schedule_date, held)
                .await?
        },
        None => client.available_seats(query.schedule_id, query.schedule_date).await?,
    };
    Ok(Json(seats))
}

/// `POST /dashboard/sell-ticket/{id}/cancel`
///
/// # Errors
///
/// Backend failures.
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
) -> Result<StatusCode, AppError> {
    state.client_for(&principal).cancel_ticket(id).await?;
    tracing::info!(ticket_id = id, user_id = principal.id, "Ticket cancelled");
    Ok(StatusCode::NO_CONTENT)
}

/// Query of `GET /dashboard/sell-ticket/report`.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// First day, inclusive
    pub start_date: NaiveDate,
    /// Last day, inclusive
    pub end_date: NaiveDate,
}

/// `GET /dashboard/sell-ticket/report`
///
/// # Errors
///
/// 422 when the range is reversed; backend failures.
pub async fn sales_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.end_date < query.start_date {
        return Err(AppError::validation("The report must end on or after its start date"));
    }
    let report = state
        .client_for(&principal)
        .sales_report(query.start_date, query.end_date)
        .await?;
    Ok(Json(report))
}

// ============================================================================
// Dialog
// ============================================================================

/// Send `action` to the dialog and answer with the settled state.
async fn dispatch(
    state: &AppState,
    principal: &Principal,
    dialog: &SaleDialog,
    action: SaleAction,
) -> Result<Json<DialogSnapshot>, AppError> {
    let mut handle = dialog.store.send(action).await.map_err(store_error)?;
    if handle
        .wait_with_timeout(state.dialog_settle_timeout())
        .await
        .is_err()
    {
        tracing::warn!(pending = handle.pending(), "Answering before dialog effects settled");
    }

    if dialog.session.is_signed_out() {
        state.dialogs.remove(&principal.token).await;
        return Err(AppError::session_expired());
    }
    Ok(Json(dialog.store.state(DialogSnapshot::of).await))
}

/// `POST /dashboard/sell-ticket/dialog`
///
/// # Errors
///
/// 401 when the backend ends the session while loading.
pub async fn open_dialog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<DialogSnapshot>, AppError> {
    let dialog = state.dialog_for(&principal);
    dispatch(&state, &principal, &dialog, SaleAction::Open).await
}

/// `GET /dashboard/sell-ticket/dialog`
pub async fn dialog_snapshot(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<DialogSnapshot> {
    match state.dialogs.get(&principal.token) {
        Some(dialog) => Json(dialog.store.state(DialogSnapshot::of).await),
        None => Json(DialogSnapshot::of(&SaleState::idle(state.today()))),
    }
}

/// `POST /dashboard/sell-ticket/dialog/actions`
///
/// Rejections (seat limit, invalid passengers, ...) are not HTTP errors; they
/// come back as the snapshot's notice.
///
/// # Errors
///
/// - 409 when the dialog is not open
/// - 401 when the backend ends the session
pub async fn dialog_command(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(command): Json<DialogCommand>,
) -> Result<Json<DialogSnapshot>, AppError> {
    let Some(dialog) = state.dialogs.get(&principal.token) else {
        return Err(dialog_closed());
    };
    if !dialog.store.state(|s| s.open).await {
        return Err(dialog_closed());
    }
    dispatch(&state, &principal, &dialog, command.into()).await
}

/// `DELETE /dashboard/sell-ticket/dialog`
///
/// # Errors
///
/// Only if the dialog store is shutting down.
pub async fn close_dialog(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<DialogSnapshot>, AppError> {
    match state.dialogs.get(&principal.token) {
        Some(dialog) => dispatch(&state, &principal, &dialog, SaleAction::Close).await,
        None => Ok(Json(DialogSnapshot::of(&SaleState::idle(state.today())))),
    }
}

fn dialog_closed() -> AppError {
    AppError::new(
        StatusCode::CONFLICT,
        "Open the sale dialog first",
        "DIALOG_CLOSED",
    )
}
