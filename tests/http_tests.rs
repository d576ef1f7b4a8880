//! HTTP API endpoint tests (tower test utilities, no server needed).

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use vapor::backend::memory::{MemoryDatabase, Response};
use vapor::config::HttpConfig;
use vapor::server::{create_router, AppState};
use vapor::{Catalog, ResultTable, SqlValue};

fn create_test_app() -> (axum::Router, MemoryDatabase) {
    let db = MemoryDatabase::new();
    let state = AppState::new(Catalog::game_store(), Arc::new(db.clone()));
    (create_router(state, &HttpConfig::default()), db)
}

async fn send_json_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = match method {
        "GET" => Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        "POST" => Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_string(&body.unwrap_or(json!({}))).unwrap(),
            ))
            .unwrap(),
        _ => panic!("Unsupported method"),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));
    (status, json)
}

// Catalog Endpoints
#[tokio::test]
async fn test_health_reports_action_count() {
    let (app, _db) = create_test_app();
    let (status, json) = send_json_request(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["actions"], 23);
}

#[tokio::test]
async fn test_list_actions_in_catalog_order() {
    let (app, _db) = create_test_app();
    let (status, json) = send_json_request(&app, "GET", "/api/v1/actions", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["success"].as_bool().unwrap_or(false));
    let actions = json["data"]["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 23);
    assert_eq!(actions[0]["token"], "ca");
    assert_eq!(actions[0]["classification"], "mutate_return_id");
    assert_eq!(actions[0]["kind"], "insert");
}

#[tokio::test]
async fn test_list_actions_filtered_by_classification() {
    let (app, _db) = create_test_app();
    let (_, json) =
        send_json_request(&app, "GET", "/api/v1/actions?classification=mutate_return_id", None)
            .await;

    let tokens: Vec<&str> = json["data"]["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["token"].as_str().unwrap())
        .collect();
    assert_eq!(tokens, vec!["ca", "ag"]);
}

#[tokio::test]
async fn test_get_action_describes_parameters() {
    let (app, _db) = create_test_app();
    let (status, json) = send_json_request(&app, "GET", "/api/v1/actions/FU", None).await;

    assert_eq!(status, StatusCode::OK);
    let params = json["data"]["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 3);
    assert_eq!(params[0]["binding_name"], "follower_id");
    assert_eq!(params[0]["type"], "integer");
    assert_eq!(params[2]["type"], "date");
    assert_eq!(params[0]["requirements"][0], "NONEMPTY");
}

#[tokio::test]
async fn test_get_unknown_action() {
    let (app, _db) = create_test_app();
    let (status, json) = send_json_request(&app, "GET", "/api/v1/actions/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

// Invocation Endpoints
#[tokio::test]
async fn test_invoke_mutation() {
    let (app, db) = create_test_app();
    db.respond("vapor.insert_follow", Response::Updated);

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/fu/invoke",
        Some(json!({
            "arguments": {
                "follower_id": "5",
                "followed_id": "9",
                "follow_date": "2024-01-01"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "success");
    assert!(json["data"]["generated_id"].is_null());
    assert_eq!(db.calls()[0].call.input(1), Some(&SqlValue::Integer(5)));
    assert_eq!(db.connections_closed(), 1);
}

#[tokio::test]
async fn test_invoke_returns_generated_id() {
    let (app, db) = create_test_app();
    db.respond("vapor.insert_user", Response::GeneratedId(17));

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/ca/invoke",
        Some(json!({"arguments": {"username": "alice", "join_date": "2024-01-01"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "success");
    assert_eq!(json["data"]["generated_id"], 17);
}

#[tokio::test]
async fn test_invoke_query_rows() {
    let (app, db) = create_test_app();
    db.respond(
        "vapor.get_game_genres",
        Response::Rows(
            ResultTable::new(vec!["genre".into()])
                .with_row(["Puzzle"])
                .with_row(["Platformer"]),
        ),
    );

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/lgg/invoke",
        Some(json!({"arguments": {"game_id": "2"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "rows");
    assert_eq!(json["data"]["table"]["columns"], json!(["genre"]));
    assert_eq!(json["data"]["table"]["rows"], json!([["Puzzle"], ["Platformer"]]));
}

#[tokio::test]
async fn test_invoke_execution_failure_is_reported_in_body() {
    let (app, db) = create_test_app();
    db.respond("vapor.delete_game", Response::Fail("game is owned".into()));

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/dg/invoke",
        Some(json!({"arguments": {"game_id": "3"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "failure");
    assert_eq!(json["data"]["message"], "game is owned");
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_connecting() {
    let (app, db) = create_test_app();

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/fu/invoke",
        Some(json!({"arguments": {"follower_id": "-5", "follow_date": "01/01/2024"}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    let fields = json["error"]["fields"].as_array().unwrap();
    let names: Vec<&str> = fields
        .iter()
        .map(|f| f["binding_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["follower_id", "followed_id", "follow_date"]);
    assert_eq!(fields[0]["requirement"], "POSITIVE_INTEGER");
    assert_eq!(fields[1]["requirement"], "NONEMPTY");
    assert_eq!(fields[2]["requirement"], "ISO_DATE");
    assert_eq!(db.connections_opened(), 0);
}

#[tokio::test]
async fn test_database_unavailable() {
    let (app, db) = create_test_app();
    db.fail_connect("connection refused");

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/gu/invoke",
        Some(json!({"arguments": {"user_id": "1"}})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "DATABASE_UNAVAILABLE");
}

#[tokio::test]
async fn test_undeclared_argument_rejected_before_connecting() {
    let (app, db) = create_test_app();
    db.respond("vapor.get_user_info", Response::Rows(ResultTable::default()));

    let (status, json) = send_json_request(
        &app,
        "POST",
        "/api/v1/actions/gu/invoke",
        Some(json!({"arguments": {"user_id": "1", "verbose": "yes"}})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    let fields = json["error"]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["binding_name"], "verbose");
    assert_eq!(fields[0]["requirement"], "DECLARED_PARAMETER");
    assert!(db.calls().is_empty());
    assert_eq!(db.connections_opened(), 0);
}

#[tokio::test]
async fn test_invoke_unknown_action() {
    let (app, _db) = create_test_app();
    let (status, _) = send_json_request(&app, "POST", "/api/v1/actions/zz/invoke", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, db) = create_test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/actions/gu/invoke")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"arguments": ["1"]}"#))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(db.connections_opened(), 0);
}
