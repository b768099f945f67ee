mod helpers;

use helpers::{API_KEY, TestOptions, setup_test_app, setup_test_app_with};
use serde_json::{Value, json};

#[tokio::test]
async fn test_insert_binds_scalars_and_json_text() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "t", "a": 1, "b": { "x": 1 } }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    let id = body["id"].as_i64().unwrap();

    let (a, b): (i64, String) = sqlx::query_as("SELECT a, b FROM t WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(a, 1);
    assert_eq!(b, r#"{"x":1}"#);
}

#[tokio::test]
async fn test_ids_increase_per_insert() {
    let app = setup_test_app().await;

    let mut ids = Vec::new();
    for name in ["first", "second"] {
        let response = app
            .client()
            .post("/data")
            .add_header("x-api-key", API_KEY)
            .json(&json!({ "table": "samples", "name": name, "payload": [1, 2] }))
            .await;
        assert_eq!(response.status_code(), 200);
        ids.push(response.json::<Value>()["id"].as_i64().unwrap());
    }
    assert!(ids[1] > ids[0]);

    let payload: String = sqlx::query_scalar("SELECT payload FROM samples WHERE id = ?")
        .bind(ids[1])
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(payload, "[1,2]");
}

#[tokio::test]
async fn test_empty_body_requires_table() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>(), json!({ "error": "table required" }));
}

#[tokio::test]
async fn test_body_without_content_type_requires_table() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>(), json!({ "error": "table required" }));
}

#[tokio::test]
async fn test_table_without_fields_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "t" }))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "no fields to insert" })
    );
}

#[tokio::test]
async fn test_unknown_table_is_internal_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "t; DROP TABLE samples; --", "a": 1 }))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["error"], "internal_error");
    assert!(body["details"].as_str().unwrap().contains("not available"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM samples")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_bad_column_surfaces_database_message() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "t", "missing_column": 1 }))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["error"], "internal_error");
    assert!(body["details"].as_str().unwrap().contains("missing_column"));
}

#[tokio::test]
async fn test_constraint_violation_is_internal_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "samples", "name": null }))
        .await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(response.json::<Value>()["error"], "internal_error");
}

#[tokio::test]
async fn test_allow_list_hides_other_tables() {
    let app = setup_test_app_with(TestOptions {
        allowed_tables: vec!["samples".into()],
        ..TestOptions::default()
    })
    .await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "t", "a": 1 }))
        .await;
    assert_eq!(response.status_code(), 500);

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .json(&json!({ "table": "samples", "name": "ok" }))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/data")
        .add_header("x-api-key", API_KEY)
        .add_header("content-type", "application/json")
        .bytes("{not json".into())
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(response.json::<Value>()["error"].is_string());
}
