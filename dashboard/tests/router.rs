//! Router-level tests: gate redirects, sessions and public routes.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use busdesk::config::Config;
use busdesk::server::{AppState, build_router};
use busdesk::types::{Principal, Role};
use busdesk_core::environment::SystemClock;
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state_with(config: Config) -> AppState {
    AppState::new(config, Arc::new(SystemClock)).unwrap()
}

fn principal(role: Role) -> Principal {
    Principal {
        id: 3,
        email: "someone@busdesk.ge".into(),
        first_name: "Eka".into(),
        last_name: "Kapanadze".into(),
        role: Some(role),
        token: format!("backend-{role}"),
    }
}

fn session_cookie(state: &AppState, role: Role) -> String {
    let token = state
        .gatekeeper
        .keys()
        .issue(&principal(role), Utc::now())
        .unwrap();
    format!("{}={token}", state.gatekeeper.cookie_name())
}

async fn call(state: &AppState, request: Request<Body>) -> Response {
    build_router(state.clone()).oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn backend_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    config
}

fn command(cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::post("/dashboard/sell-ticket/dialog/actions")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn open_dialog(cookie: &str) -> Request<Body> {
    Request::post("/dashboard/sell-ticket/dialog")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn mount_payment_methods(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/payment-methods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["cash", "card"])))
        .mount(server)
        .await;
}

async fn mount_seats(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/schedules/available-seats"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn anonymous_dashboard_goes_to_sign_in() {
    let state = state_with(Config::default());

    let response = call(&state, get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn sales_agent_is_sent_to_their_landing_page() {
    let state = state_with(Config::default());
    let cookie = session_cookie(&state, Role::SalesAgent);

    let response = call(&state, get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/customers");

    let response = call(&state, get("/dashboard/qr-scanner", Some(&cookie))).await;
    assert_eq!(location(&response), "/dashboard/customers");
}

#[tokio::test]
async fn tampered_cookie_is_anonymous() {
    let state = state_with(Config::default());
    let cookie = format!("{}x", session_cookie(&state, Role::Admin));

    let response = call(&state, get("/dashboard", Some(&cookie))).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn allowed_request_reaches_the_handler() {
    let state = state_with(Config::default());
    let cookie = session_cookie(&state, Role::SalesAgent);

    let response = call(&state, get("/dashboard/sell-ticket/dialog", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["open"], false);
    assert_eq!(body["phase"], "closed");
}

#[tokio::test]
async fn dialog_commands_need_an_open_dialog() {
    let state = state_with(Config::default());
    let cookie = session_cookie(&state, Role::SalesAgent);

    let request = Request::post("/dashboard/sell-ticket/dialog/actions")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"toggle_seat","seat":4}"#))
        .unwrap();
    let response = call(&state, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signed_in_visitor_skips_the_sign_in_page() {
    let state = state_with(Config::default());

    let response = call(&state, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = session_cookie(&state, Role::Driver);
    let response = call(&state, get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/qr-scanner");
}

#[tokio::test]
async fn sign_out_revokes_the_session() {
    let state = state_with(Config::default());
    let cookie = session_cookie(&state, Role::Admin);

    let request = Request::post("/sign-out")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = call(&state, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let response = call(&state, get("/dashboard", Some(&cookie))).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn sign_in_sets_the_cookie_and_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": {"id": 8, "email": "driver@busdesk.ge", "role": "driver"}
        })))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    let state = state_with(config);

    let request = Request::post("/sign-in")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"email":"driver@busdesk.ge","password":"secret"}"#,
        ))
        .unwrap();
    let response = call(&state, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/qr-scanner");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with(state.gatekeeper.cookie_name()));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.api.base_url = format!("{}/api", server.uri());
    let state = state_with(config);

    let request = Request::post("/sign-in")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"x@busdesk.ge","password":"nope"}"#))
        .unwrap();
    let response = call(&state, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let state = state_with(Config::default());

    let response = call(&state, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "ok");
}

#[tokio::test]
async fn rejected_credential_on_a_page_ends_the_session_and_its_dialog() {
    let server = MockServer::start().await;
    mount_payment_methods(&server).await;
    for rejected in ["/api/salesagent/tickets", "/api/schedules"] {
        Mock::given(method("GET"))
            .and(path(rejected))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
    }
    let state = state_with(backend_config(&server));
    let cookie = session_cookie(&state, Role::SalesAgent);

    let response = call(&state, open_dialog(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.dialogs.count(), 1);

    let response = call(&state, get("/dashboard/sell-ticket", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["code"], "SESSION_EXPIRED");
    assert_eq!(state.dialogs.count(), 0);
    assert!(state.gatekeeper.revoked().is_revoked("backend-salesagent"));

    let response = call(&state, get("/dashboard/sell-ticket", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn rejected_credential_inside_the_dialog_signs_out() {
    let server = MockServer::start().await;
    mount_payment_methods(&server).await;
    mount_seats(&server, ResponseTemplate::new(401)).await;
    let state = state_with(backend_config(&server));
    let cookie = session_cookie(&state, Role::SalesAgent);

    let response = call(&state, open_dialog(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = call(
        &state,
        command(&cookie, serde_json::json!({"type": "select_schedule", "schedule_id": 7})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["code"], "SESSION_EXPIRED");
    assert_eq!(state.dialogs.count(), 0);

    let response = call(&state, get("/dashboard/sell-ticket/dialog", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn dialog_sells_tickets_end_to_end() {
    let server = MockServer::start().await;
    mount_payment_methods(&server).await;
    mount_seats(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"available_seats": "1, 2, 3"})),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/tickets/sell"))
        .and(body_partial_json(serde_json::json!({
            "ticket_count": 1,
            "schedule_id": 7,
            "seat_numbers": [2],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"tickets": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = backend_config(&server);
    config.dialog.reset_delay_ms = 0;
    let state = state_with(config);
    let cookie = session_cookie(&state, Role::SalesAgent);

    let body = json(call(&state, open_dialog(&cookie)).await).await;
    assert_eq!(body["open"], true);
    assert_eq!(body["payment_methods"], serde_json::json!(["cash", "card"]));

    let body = json(
        call(
            &state,
            command(&cookie, serde_json::json!({"type": "select_schedule", "schedule_id": 7})),
        )
        .await,
    )
    .await;
    assert_eq!(body["available_seats"], serde_json::json!([1, 2, 3]));
    assert_eq!(body["seat_picker_enabled"], true);
    assert_eq!(body["phase"], "criteria_selected");

    let body = json(
        call(&state, command(&cookie, serde_json::json!({"type": "toggle_seat", "seat": 2}))).await,
    )
    .await;
    assert_eq!(body["form"]["selected_seats"], serde_json::json!([2]));
    assert_eq!(body["phase"], "seats_selected");

    for (field, value) in [
        ("passenger_name", "Nino"),
        ("passenger_surname", "Beridze"),
        ("passenger_email", "nino@example.ge"),
    ] {
        let response = call(
            &state,
            command(
                &cookie,
                serde_json::json!({
                    "type": "update_passenger",
                    "index": 0,
                    "field": field,
                    "value": value,
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = call(&state, command(&cookie, serde_json::json!({"type": "submit"}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["open"], false);
    assert_eq!(body["phase"], "closed");
    assert_eq!(body["notice"]["level"], "success");
    assert_eq!(body["notice"]["message"], "Successfully sold 1 tickets!");
    assert_eq!(body["form"]["selected_seats"], serde_json::json!([]));
}

#[tokio::test]
async fn closing_the_dialog_clears_the_form_after_the_delay() {
    let server = MockServer::start().await;
    mount_payment_methods(&server).await;
    mount_seats(
        &server,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"available_seats": "4, 5"})),
    )
    .await;
    let state = state_with(backend_config(&server));
    let cookie = session_cookie(&state, Role::SalesAgent);

    call(&state, open_dialog(&cookie)).await;
    call(
        &state,
        command(&cookie, serde_json::json!({"type": "select_schedule", "schedule_id": 3})),
    )
    .await;
    let body = json(
        call(&state, command(&cookie, serde_json::json!({"type": "toggle_seat", "seat": 5}))).await,
    )
    .await;
    assert_eq!(body["form"]["selected_seats"], serde_json::json!([5]));

    let request = Request::delete("/dashboard/sell-ticket/dialog")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = call(&state, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["open"], false);
    assert_eq!(body["form"]["selected_seats"], serde_json::json!([]));
    assert_eq!(body["available_seats"], serde_json::json!([]));

    let toggle = command(&cookie, serde_json::json!({"type": "toggle_seat", "seat": 4}));
    let response = call(&state, toggle).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn scanner_page_lists_past_scans_beyond_the_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/driver/tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "seat_number": 3, "schedule_id": 2, "schedule_date": "2020-01-05",
             "validated_at": "2020-01-05T08:00:00Z"},
            {"id": 2, "seat_number": 4, "schedule_id": 2, "schedule_date": "2020-01-06"},
            {"id": 3, "seat_number": 5, "schedule_id": 2, "schedule_date": "2020-01-06",
             "validated_at": "2020-01-06T09:30:00Z"},
        ])))
        .mount(&server)
        .await;
    let state = state_with(backend_config(&server));
    let cookie = session_cookie(&state, Role::Driver);

    let response = call(&state, get("/dashboard/qr-scanner", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["tickets"], serde_json::json!([]));
    let history: Vec<_> = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ticket| ticket["id"].clone())
        .collect();
    assert_eq!(history, [serde_json::json!(3), serde_json::json!(1)]);
}
