//! End-to-end checks over a real listener.

use super::*;

async fn spawn_app() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(AppState::new())).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn info_reports_service_name() {
    let base = spawn_app().await;
    let body: serde_json::Value = reqwest::get(format!("{base}/api/")).await.unwrap().json().await.unwrap();
    assert_eq!(body["name"], "Decoration Mind Map");
}

#[tokio::test]
async fn nodes_endpoint_serves_five_records() {
    let base = spawn_app().await;
    let body: Vec<serde_json::Value> = reqwest::get(format!("{base}/api/nodes")).await.unwrap().json().await.unwrap();
    assert_eq!(body.len(), 5);
    assert!(body[0]["parent_id"].is_null());
    assert_eq!(body[1]["parent_id"], 1);
}

#[tokio::test]
async fn unknown_route_is_404_json() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/api/nope")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, ROUTE_NOT_FOUND);
}

#[tokio::test]
async fn paths_outside_the_api_are_404_json() {
    let base = spawn_app().await;
    for path in ["/healthz", "/", "/api/nodes/1"] {
        let response = reqwest::get(format!("{base}{path}")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.error, ROUTE_NOT_FOUND);
    }
}

#[tokio::test]
async fn wrong_method_on_known_route_is_404() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/api/auth/login")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let base = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/auth/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let base = spawn_app().await;
    let http = reqwest::Client::new();
    let creds = serde_json::json!({"username": "alice", "password": "pw"});

    let response = http.post(format!("{base}/api/auth/register")).json(&creds).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let again = http.post(format!("{base}/api/auth/register")).json(&creds).send().await.unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::CONFLICT);

    let login: serde_json::Value = http
        .post(format!("{base}/api/auth/login"))
        .json(&creds)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(login["token"], "mock_jwt_token_2");
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let base = spawn_app().await;
    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/auth/login"))
        .header("origin", "https://elsewhere.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
