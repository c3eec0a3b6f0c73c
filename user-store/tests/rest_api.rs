//! REST API integration tests for user-store.
//!
//! These tests verify that all REST endpoints work correctly against a fresh
//! in-memory store.

mod common;

use serde_json::{Value, json};

// =============================================================================
// Version Endpoint
// =============================================================================

#[tokio::test]
async fn test_get_version() {
    let server = common::TestServer::spawn().await;

    let response = server.get("/version").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["version"].is_string());
    assert!(!body["version"].as_str().unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_openapi_document() {
    let server = common::TestServer::spawn().await;

    let response = server
        .client
        .get(format!("http://{}/api-docs/openapi.json", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert!(body["paths"]["/api/v1/users/{id}"].is_object());

    server.shutdown().await;
}

// =============================================================================
// User CRUD
// =============================================================================

#[tokio::test]
async fn test_create_user() {
    let server = common::TestServer::spawn().await;

    let response = server
        .post_json(
            "/users",
            &json!({
                "id": "u1",
                "name": "Ann",
                "email": "ann@example.com"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), "u1");
    assert_eq!(body["name"].as_str().unwrap(), "Ann");
    assert_eq!(body["email"].as_str().unwrap(), "ann@example.com");

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_user_duplicate_id() {
    let server = common::TestServer::spawn().await;

    let response1 = server
        .post_json("/users", &json!({ "id": "dup", "name": "First" }))
        .await;
    assert_eq!(response1.status(), 201);

    let response2 = server
        .post_json("/users", &json!({ "id": "dup", "name": "Second" }))
        .await;
    assert_eq!(response2.status(), 409);

    let body: Value = response2.json().await.unwrap();
    assert_eq!(body["code"].as_u64().unwrap(), 409);
    assert!(body["error"].as_str().unwrap().contains("dup"));

    // The original record is untouched
    let body: Value = server.get("/users/dup").await.json().await.unwrap();
    assert_eq!(body["name"].as_str().unwrap(), "First");

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_user_empty_id() {
    let server = common::TestServer::spawn().await;

    let response = server.post_json("/users", &json!({ "id": "" })).await;
    assert_eq!(response.status(), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_user_dot_id() {
    let server = common::TestServer::spawn().await;

    for id in [".", ".."] {
        let response = server.post_json("/users", &json!({ "id": id })).await;
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], 400);
    }

    let users: Vec<Value> = server.get("/users").await.json().await.unwrap();
    assert!(users.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_get_user_not_found() {
    let server = common::TestServer::spawn().await;

    let response = server.get("/users/missing").await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"].as_u64().unwrap(), 404);
    assert!(body["error"].as_str().unwrap().contains("missing"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_replaces_record() {
    let server = common::TestServer::spawn().await;

    server
        .post_json(
            "/users",
            &json!({
                "id": "u1",
                "name": "Ann",
                "email": "ann@example.com",
                "attributes": { "team": "infra" }
            }),
        )
        .await;

    let response = server
        .put_json("/users/u1", &json!({ "id": "u1", "name": "Ann B" }))
        .await;
    assert_eq!(response.status(), 200);

    // No merge: email and attributes are gone
    let body: Value = server.get("/users/u1").await.json().await.unwrap();
    assert_eq!(body["name"].as_str().unwrap(), "Ann B");
    assert_eq!(body["email"].as_str().unwrap(), "");
    assert!(body.get("attributes").is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_user_not_found() {
    let server = common::TestServer::spawn().await;

    let response = server
        .put_json("/users/ghost", &json!({ "id": "ghost", "name": "Nobody" }))
        .await;
    assert_eq!(response.status(), 404);

    // Update must not create
    let response = server.get("/users/ghost").await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_id_mismatch() {
    let server = common::TestServer::spawn().await;

    server.post_json("/users", &json!({ "id": "u1" })).await;

    let response = server
        .put_json("/users/u1", &json!({ "id": "u2", "name": "Wrong" }))
        .await;
    assert_eq!(response.status(), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn test_delete_user_twice() {
    let server = common::TestServer::spawn().await;

    server.post_json("/users", &json!({ "id": "u1" })).await;

    let response = server.delete("/users/u1").await;
    assert_eq!(response.status(), 204);

    let response = server.delete("/users/u1").await;
    assert_eq!(response.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_users() {
    let server = common::TestServer::spawn().await;

    server.post_json("/users", &json!({ "id": "b" })).await;
    server.post_json("/users", &json!({ "id": "a" })).await;

    let response = server.get("/users").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_over_http() {
    let server = common::TestServer::spawn().await;
    let url = format!("{}/users", server.base_url());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = server.client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                client
                    .post(url)
                    .json(&json!({ "id": "contended", "name": format!("w{}", i) }))
                    .send()
                    .await
                    .expect("Request failed")
                    .status()
                    .as_u16()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 409).count(), 7);

    server.shutdown().await;
}
