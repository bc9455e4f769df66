//! Common test utilities for Bazaar integration tests
//!
//! This file contains shared functions and utilities for all integration tests,
//! including test application setup and helpers for building requests and
//! reading responses.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bazaar::{
    create_app,
    db::{init_pool, DbPool},
    media::MediaStore,
    AppOptions, AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::Service;

/// Header the test app trusts for the authenticated user
pub const IDENTITY_HEADER: &str = "X-Authenticated-User";

/// Boundary used by `multipart_body`
pub const BOUNDARY: &str = "bazaar-test-boundary";

/// A router plus the resources it depends on
pub struct TestApp {
    pub router: Router,
    pub pool: Arc<DbPool>,
    /// Media root; removed when the TestApp is dropped
    pub media_dir: TempDir,
}

/// Creates a test application with an in-memory SQLite database
///
/// This helper function:
/// 1. Creates a uniquely named shared in-memory SQLite database
/// 2. Runs migrations to set up the schema
/// 3. Creates an Axum application with the database and a temporary media root
///
/// ### Returns
///
/// A TestApp whose router is connected to the fresh database
pub fn create_test_app() -> TestApp {
    create_test_app_with(AppOptions::default())
}

/// Creates a test application with custom router options
pub fn create_test_app_with(options: AppOptions) -> TestApp {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());

    let conn = &mut pool.get().unwrap();
    bazaar::run_migrations(conn).unwrap();

    let media_dir = tempfile::tempdir().unwrap();
    let media = MediaStore::new(media_dir.path(), "/media/");
    let state = AppState::new(pool.clone(), media, IDENTITY_HEADER).unwrap();

    TestApp {
        router: create_app(state, options),
        pool,
        media_dir,
    }
}

/// Sends a request and returns the status and the body parsed as JSON
///
/// An empty body is returned as `Value::Null`.
pub async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).to_string()))
    };
    (status, value)
}

/// Builds a GET request
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).method("GET").body(Body::empty()).unwrap()
}

/// Builds a PATCH request with no body
pub fn patch(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).method("PATCH").body(Body::empty()).unwrap()
}

/// Builds a JSON POST to the create endpoint
pub fn create_json(body: &Value) -> Request<Body> {
    Request::builder()
        .uri("/listings/create/")
        .method("POST")
        .header("Content-Type", "application/json")
        .header("Host", "testserver")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// One part of a multipart body
pub enum PartSpec<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encodes parts as a multipart/form-data body using `BOUNDARY`
pub fn multipart_body(parts: &[PartSpec]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            PartSpec::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            PartSpec::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Builds a multipart POST to the create endpoint
pub fn create_multipart(parts: &[PartSpec]) -> Request<Body> {
    Request::builder()
        .uri("/listings/create/")
        .method("POST")
        .header("Content-Type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .header("Host", "testserver")
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Creates a listing through the API and returns its JSON
pub async fn create_listing(app: &mut Router, body: Value) -> Value {
    let (status, listing) = send(app, create_json(&body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", listing);
    listing
}

/// Creates a listing and moves it to `action` ("approve" or "reject")
pub async fn create_moderated_listing(app: &mut Router, title: &str, action: &str) -> i64 {
    let listing = create_listing(app, serde_json::json!({
        "title": title,
        "listing_type": "share",
    })).await;
    let id = listing["id"].as_i64().unwrap();
    let (status, _) = send(app, patch(&format!("/listings/{}/{}/", id, action))).await;
    assert_eq!(status, StatusCode::OK);
    id
}

/// The `id` of every listing in a list response, in order
pub fn ids(listings: &Value) -> Vec<i64> {
    listings
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect()
}
