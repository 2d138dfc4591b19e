//! `GET /dashboard`

use crate::access::{MenuItem, menu_for};
use crate::api::admin::{Tickets, revenue};
use crate::server::state::AppState;
use crate::types::{Principal, Role};
use axum::{Extension, Json, extract::State};
use busdesk_web::AppError;
use serde::Serialize;

/// Admin figures shown on the overview.
#[derive(Debug, Serialize)]
pub struct Summary {
    /// Tickets in the system
    pub ticket_count: usize,
    /// Sum of destination prices over all tickets
    pub total_revenue: f64,
}

/// The dashboard shell: who is signed in and what they may open.
#[derive(Debug, Serialize)]
pub struct Overview {
    /// Signed-in user
    pub principal: Principal,
    /// Sidebar entries
    pub menu: &'static [MenuItem],
    /// Admin figures; absent for other roles
    pub summary: Option<Summary>,
}

/// `GET /dashboard`
///
/// # Errors
///
/// Backend failures while loading the admin figures.
pub async fn overview(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Overview>, AppError> {
    let Some(role) = principal.role else {
        return Err(AppError::forbidden("No role assigned"));
    };

    let summary = if role == Role::Admin {
        let tickets = state.client_for(&principal).list::<Tickets>().await?;
        Some(Summary {
            ticket_count: tickets.len(),
            total_revenue: revenue(&tickets),
        })
    } else {
        None
    };

    Ok(Json(Overview {
        menu: menu_for(role),
        principal,
        summary,
    }))
}
