//! Admin tables, exports and ticket downloads.
//!
//! The CRUD handlers are generic over [`Resource`]; the router instantiates
//! them once per table.

use crate::api::admin::{ExcelExport, Resource, Users};
use crate::server::state::AppState;
use crate::types::{Id, Principal, Role, User};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use busdesk_web::AppError;
use serde::{Deserialize, Serialize};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ============================================================================
// CRUD
// ============================================================================

/// `GET /dashboard/{table}`
///
/// # Errors
///
/// Backend failures.
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<R::Item>>, AppError>
where
    R::Item: Serialize,
{
    Ok(Json(state.client_for(&principal).list::<R>().await?))
}

/// `POST /dashboard/{table}`
///
/// # Errors
///
/// Backend validation messages come back as 422.
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<R::Input>,
) -> Result<(StatusCode, Json<R::Item>), AppError>
where
    R::Item: Serialize,
{
    let form: R::Form = input.into();
    let item = state.client_for(&principal).create::<R>(&form).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /dashboard/{table}/{id}`
///
/// # Errors
///
/// Backend validation messages come back as 422.
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
    Json(input): Json<R::Input>,
) -> Result<Json<R::Item>, AppError>
where
    R::Item: Serialize,
{
    let form: R::Form = input.into();
    Ok(Json(state.client_for(&principal).update::<R>(id, &form).await?))
}

/// `DELETE /dashboard/{table}/{id}`
///
/// # Errors
///
/// Backend failures.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
) -> Result<StatusCode, AppError> {
    state.client_for(&principal).delete::<R>(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

/// Query of `GET /dashboard/users`.
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// Only users with this role
    pub role: Option<Role>,
}

/// `GET /dashboard/users`, optionally filtered by role.
///
/// # Errors
///
/// Backend failures.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let client = state.client_for(&principal);
    let users = match query.role {
        Some(role) => client.users_by_role(role).await?,
        None => client.list::<Users>().await?,
    };
    Ok(Json(users))
}

/// `PUT /dashboard/users/{id}/toggle-status`
///
/// # Errors
///
/// Backend failures.
pub async fn toggle_user_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Id>,
) -> Result<StatusCode, AppError> {
    state.client_for(&principal).toggle_user_status(id).await?;
    tracing::info!(user_id = id, admin_id = principal.id, "User status toggled");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Downloads
// ============================================================================

/// `GET /dashboard/excel/{kind}`
///
/// # Errors
///
/// 404 for an unknown export; backend failures.
pub async fn excel_export(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind: ExcelExport = kind
        .parse()
        .map_err(|_| AppError::not_found("Export", &kind))?;
    let bytes = state.client_for(&principal).excel_export(kind).await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{kind}.xlsx\""),
            ),
        ],
        bytes,
    ))
}

/// `GET /dashboard/tickets/download/{hash}`
///
/// # Errors
///
/// Backend failures.
pub async fn download_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.client_for(&principal).download_ticket(&hash).await?;
    let stem: String = hash
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"ticket-{stem}.pdf\""),
            ),
        ],
        bytes,
    ))
}
