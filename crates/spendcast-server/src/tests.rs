//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use spendcast_core::db::Database;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    setup_app_with(Database::in_memory().unwrap(), false)
}

fn setup_app_with(db: Database, require_auth: bool) -> Router {
    let config = ServerConfig {
        require_auth,
        api_keys: vec!["secret-key".to_string()],
        ..Default::default()
    };
    create_router(db, config, Some(ExtractorClient::mock()))
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn as_user(mut request: Request<Body>, email: &str) -> Request<Body> {
    request.headers_mut().insert(
        "cf-access-authenticated-user-email",
        email.parse().unwrap(),
    );
    request
}

async fn create(app: &Router, amount: f64, category: &str, date: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/expenses",
            serde_json::json!({ "amount": amount, "category": category, "date": date }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    get_body_json(response).await
}

// ========== Expense API Tests ==========

#[tokio::test]
async fn test_create_and_get_expense() {
    let app = setup_test_app();

    let created = create(&app, 12.5, "food", "2024-03-02").await;
    assert_eq!(created["amount"], 12.5);
    assert_eq!(created["category"], "food");
    let id = created["id"].as_i64().unwrap();

    let response = app
        .oneshot(get(&format!("/api/expenses/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["id"], id);
}

#[tokio::test]
async fn test_create_expense_rejects_bad_input() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/expenses",
            serde_json::json!({ "amount": 5.0, "category": "groceries" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Unknown category"));

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/expenses",
            serde_json::json!({ "amount": -1.0, "category": "food" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_expense_not_found() {
    let app = setup_test_app();
    let response = app.oneshot(get("/api/expenses/9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_expense_allowlist() {
    let app = setup_test_app();
    let id = create(&app, 10.0, "food", "2024-03-02").await["id"]
        .as_i64()
        .unwrap();

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/api/expenses/{}", id),
            serde_json::json!({ "owner_id": 42 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            &format!("/api/expenses/{}", id),
            serde_json::json!({ "amount": 15.0, "category": "travel", "notes": "cab" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 15.0);
    assert_eq!(json["category"], "travel");
    assert_eq!(json["notes"], "cab");

    let response = app
        .oneshot(send_json(
            "PATCH",
            "/api/expenses/9999",
            serde_json::json!({ "amount": 1.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_expense() {
    let app = setup_test_app();
    let id = create(&app, 10.0, "food", "2024-03-02").await["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/expenses/{}", id);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["success"], true);

    let response = app.oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_expenses_filters_and_pages() {
    let app = setup_test_app();
    create(&app, 1.0, "food", "2024-01-10").await;
    create(&app, 2.0, "food", "2024-02-10").await;
    create(&app, 3.0, "travel", "2024-02-11").await;
    create(&app, 4.0, "food", "2024-03-10").await;

    let response = app
        .clone()
        .oneshot(get("/api/expenses?category=food&limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 3);
    let expenses = json["expenses"].as_array().unwrap();
    assert_eq!(expenses.len(), 2);
    // Newest first by default
    assert_eq!(expenses[0]["amount"], 4.0);

    let response = app
        .clone()
        .oneshot(get("/api/expenses?from=2024-02-01&to=2024-02-29&order=asc"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["expenses"][0]["amount"], 2.0);

    let response = app
        .oneshot(get("/api/expenses?from=2024-13-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Summary API Tests ==========

#[tokio::test]
async fn test_monthly_summary() {
    let app = setup_test_app();
    create(&app, 20.0, "food", "2024-03-01").await;
    create(&app, 30.0, "utilities", "2024-03-31").await;
    create(&app, 99.0, "travel", "2024-04-01").await;

    let response = app
        .clone()
        .oneshot(get("/api/summary/2024/3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["grand_total"], 50.0);
    assert_eq!(json["categories"][0]["category"], "utilities");

    let response = app.oneshot(get("/api/summary/2024/13")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_current_month_summary_empty() {
    let app = setup_test_app();
    let response = app.oneshot(get("/api/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["grand_total"].to_string(), "0.0");
    assert!(json["categories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_year_out_of_range() {
    let app = setup_test_app();
    let response = app.clone().oneshot(get("/api/summary/9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/api/summary/9999/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_yearly_and_range_summary() {
    let app = setup_test_app();
    create(&app, 42.0, "shopping", "2024-03-10").await;

    let response = app.clone().oneshot(get("/api/summary/2024")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["grand_total"], 42.0);
    assert_eq!(json["months"][0]["month"], 3);
    assert_eq!(json["months"][0]["count"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/summary/range?from=2024-03-01&to=2024-03-10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await["grand_total"], 42.0);

    let response = app
        .oneshot(get("/api/summary/range?from=2024-03-11&to=2024-03-01"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_and_top() {
    let app = setup_test_app();

    let response = app.clone().oneshot(get("/api/stats")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["max"], 0.0);

    for amount in [5.0, 50.0, 20.0] {
        create(&app, amount, "food", "2024-05-01").await;
    }

    let response = app.clone().oneshot(get("/api/top?limit=2")).await.unwrap();
    let json = get_body_json(response).await;
    let top = json.as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["amount"], 50.0);
    assert_eq!(top[1]["amount"], 20.0);

    let response = app.oneshot(get("/api/stats")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["total"], 75.0);
}

// ========== Analytics API Tests ==========

#[tokio::test]
async fn test_trend_endpoints() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(get("/api/trends/groceries"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/trends/food?months=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/trends/food?months=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["trend"], "no_data");

    let response = app.oneshot(get("/api/trends")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_predict_with_little_history() {
    let app = setup_test_app();
    create(&app, 10.0, "education", "2024-01-01").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict/education")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["confidence"], 0.0);
    assert_eq!(json["predicted_overspend"], 0.0);
    assert_eq!(json["data_points"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/predict")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_json(response).await.as_array().unwrap().len(), 8);
}

// ========== Extraction API Tests ==========

#[tokio::test]
async fn test_extract_with_mock_backend() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract")
                .body(Body::from("Corner Coffee TOTAL $4.50"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 4.5);
    assert_eq!(json["category"], "food");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_not_configured() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let app = create_router(db, config, None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract")
                .body(Body::from("receipt"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ========== Export and Audit API Tests ==========

#[tokio::test]
async fn test_export_csv() {
    let app = setup_test_app();
    create(&app, 12.0, "food", "2024-03-02").await;

    let response = app.clone().oneshot(get("/api/export")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let csv = get_body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "date,category,amount,notes,receipt_reference");
    assert_eq!(lines[1], "2024-03-02,food,12.00,,");

    let response = app.oneshot(get("/api/export?format=xml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_log_records_access() {
    let app = setup_test_app();
    create(&app, 12.0, "food", "2024-03-02").await;
    app.clone().oneshot(get("/api/stats")).await.unwrap();

    let response = app.oneshot(get("/api/audit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let entries = json.as_array().unwrap();
    assert!(entries.len() >= 2);
    assert!(entries.iter().all(|e| e["user_email"] == LOCAL_DEV_OWNER));
    assert!(entries.iter().any(|e| e["action"] == "create"));
}

// ========== Auth Tests ==========

#[tokio::test]
async fn test_auth_required() {
    let app = setup_app_with(Database::in_memory().unwrap(), true);

    let response = app.clone().oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", "Bearer wrong-key-")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_with_api_key() {
    let app = setup_app_with(Database::in_memory().unwrap(), true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", "Bearer secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let db = Database::in_memory().unwrap();
    let app = setup_app_with(db.clone(), true);

    let request = as_user(
        send_json(
            "POST",
            "/api/expenses",
            serde_json::json!({ "amount": 75.0, "category": "travel", "date": "2024-04-01" }),
        ),
        "alice@example.com",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(as_user(get("/api/stats"), "bob@example.com"))
        .await
        .unwrap();
    assert_eq!(get_body_json(response).await["count"], 0);

    let response = app
        .clone()
        .oneshot(as_user(
            get(&format!("/api/expenses/{}", id)),
            "bob@example.com",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(as_user(get("/api/stats"), "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(get_body_json(response).await["count"], 1);

    assert!(db.get_owner("bob@example.com").unwrap().is_some());
}

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();
    let response = app.oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[test]
fn test_parse_comma_separated() {
    assert_eq!(
        parse_comma_separated(" a, ,b ,"),
        vec!["a".to_string(), "b".to_string()]
    );
    assert!(parse_comma_separated("").is_empty());
}

#[test]
fn test_get_user_email_precedence() {
    let mut headers = HeaderMap::new();
    assert_eq!(get_user_email(&headers), LOCAL_DEV_OWNER);

    headers.insert("authorization", "Bearer k".parse().unwrap());
    assert_eq!(get_user_email(&headers), API_KEY_OWNER);

    headers.insert(
        "cf-access-authenticated-user-email",
        "carol@example.com".parse().unwrap(),
    );
    assert_eq!(get_user_email(&headers), "carol@example.com");
}
