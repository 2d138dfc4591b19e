//! Router configuration for the dashboard.

use super::handlers::{admin, customers, driver, overview, sales, session};
use super::state::AppState;
use crate::access::access_gate;
use crate::api::admin::{Destinations, Schedules, Statuses, Tickets, Users};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use busdesk_web::{correlation_id_layer, handlers::health_check};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Everything under `/dashboard` passes the access gate; the routes are
/// registered with their full paths because the gate decides on the request
/// path, which `Router::nest` would strip.
pub fn build_router(state: AppState) -> Router {
    let dashboard = Router::new()
        .route("/dashboard", get(overview::overview))
        // Sales agent
        .route("/dashboard/customers", get(customers::list_customers))
        .route(
            "/dashboard/customers/:id/tickets",
            get(customers::customer_tickets),
        )
        .route(
            "/dashboard/customers/:id/status",
            put(customers::update_status),
        )
        .route("/dashboard/sell-ticket", get(sales::sell_ticket_page))
        .route("/dashboard/sell-ticket/seats", get(sales::available_seats))
        .route("/dashboard/sell-ticket/report", get(sales::sales_report))
        .route("/dashboard/sell-ticket/:id/cancel", post(sales::cancel_ticket))
        .route(
            "/dashboard/sell-ticket/dialog",
            post(sales::open_dialog)
                .get(sales::dialog_snapshot)
                .delete(sales::close_dialog),
        )
        .route(
            "/dashboard/sell-ticket/dialog/actions",
            post(sales::dialog_command),
        )
        // Driver
        .route("/dashboard/qr-scanner", get(driver::scanner_page))
        .route(
            "/dashboard/qr-scanner/validate",
            post(driver::validate_ticket),
        )
        // Admin
        .route(
            "/dashboard/directions",
            get(admin::list::<Destinations>).post(admin::create::<Destinations>),
        )
        .route(
            "/dashboard/directions/:id",
            put(admin::update::<Destinations>).delete(admin::delete::<Destinations>),
        )
        .route(
            "/dashboard/schedule",
            get(admin::list::<Schedules>).post(admin::create::<Schedules>),
        )
        .route(
            "/dashboard/schedule/:id",
            put(admin::update::<Schedules>).delete(admin::delete::<Schedules>),
        )
        .route(
            "/dashboard/statuses",
            get(admin::list::<Statuses>).post(admin::create::<Statuses>),
        )
        .route(
            "/dashboard/statuses/:id",
            put(admin::update::<Statuses>).delete(admin::delete::<Statuses>),
        )
        .route(
            "/dashboard/users",
            get(admin::list_users).post(admin::create::<Users>),
        )
        .route(
            "/dashboard/users/:id",
            put(admin::update::<Users>).delete(admin::delete::<Users>),
        )
        .route(
            "/dashboard/users/:id/toggle-status",
            put(admin::toggle_user_status),
        )
        .route(
            "/dashboard/tickets",
            get(admin::list::<Tickets>).post(admin::create::<Tickets>),
        )
        .route(
            "/dashboard/tickets/:id",
            put(admin::update::<Tickets>).delete(admin::delete::<Tickets>),
        )
        .route(
            "/dashboard/tickets/download/:hash",
            get(admin::download_ticket),
        )
        .route("/dashboard/excel/:kind", get(admin::excel_export))
        .route_layer(middleware::from_fn_with_state(
            state.gatekeeper.clone(),
            access_gate,
        ));

    Router::new()
        // Public
        .route("/", get(session::sign_in_page))
        .route("/sign-in", post(session::sign_in))
        .route("/sign-out", post(session::sign_out))
        .route("/health", get(health_check))
        .merge(dashboard)
        .layer(correlation_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
