//! Test Helper Utilities
//!
//! Shared utilities for driving the mentiscope-api router in tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use mentiscope_api::services::{AnalysisProvider, LlmError};
use mentiscope_api::{build_router, AppState, Settings};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

/// In-memory database with the full schema (single connection so every
/// query sees the same database)
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Should open in-memory database");
    mentiscope_common::db::create_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

/// App with default settings (no LLM key, no support URL, no webhook secret)
pub async fn setup_app() -> (Router, AppState) {
    setup_app_with(Settings::default()).await
}

pub async fn setup_app_with(settings: Settings) -> (Router, AppState) {
    let db = setup_test_db().await;
    let state = AppState::new(db, settings).expect("Should build state");
    (build_router(state.clone()), state)
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request through a clone of the router
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Create a student through the API and return its JSON
pub async fn create_student(app: &Router, parent_id: &str, name: &str) -> Value {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/v1/students",
            &serde_json::json!({"name": name, "grade_level": "6", "parent_id": parent_id}),
        ),
    )
    .await;
    assert_eq!(response.status(), 200);
    extract_json(response.into_body()).await
}

/// Provider returning the same reply every call, counting calls
pub struct FakeProvider {
    reply: Value,
    /// Calls that fail before replies start
    failures: usize,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn replying(reply: Value) -> Arc<Self> {
        Self::failing_first(0, reply)
    }

    pub fn failing() -> Arc<Self> {
        Self::failing_first(usize::MAX, Value::Null)
    }

    /// Fail `failures` times, then reply
    pub fn failing_first(failures: usize, reply: Value) -> Arc<Self> {
        Arc::new(Self { reply, failures, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for FakeProvider {
    fn model(&self) -> &str {
        "fake/model"
    }

    async fn complete_json(&self, _system: &str, _prompt: &str) -> Result<Value, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(LlmError::ApiError(503, "provider overloaded".to_string()));
        }
        Ok(self.reply.clone())
    }
}
