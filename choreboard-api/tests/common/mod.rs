//! Common test utilities for API integration tests
//!
//! Each [`TestContext`] owns a fresh in-memory database and a router built
//! over it. Requests go through `tower::ServiceExt::oneshot`, so no socket is
//! opened.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use choreboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use choreboard_shared::db::{migrations::run_migrations, pool::create_memory_pool};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret123";

pub struct TestContext {
    pub db: SqlitePool,
    pub app: Router,
}

/// Status, `Set-Cookie` (if any) and parsed JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` part of the session cookie, ready for a `Cookie` header
    pub fn cookie(&self) -> String {
        self.set_cookie
            .as_deref()
            .and_then(|c| c.split(';').next())
            .expect("response should set a cookie")
            .to_string()
    }
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let db = create_memory_pool().await?;
        run_migrations(&db).await?;

        let app = build_router(AppState::new(db.clone(), Config::default()));

        Ok(TestContext { db, app })
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(cookie), None).await
    }

    /// Registers a founder; returns their cookie and the register response
    pub async fn founder(&self, username: &str, team_name: &str) -> (String, Value) {
        let response = self
            .send(
                Method::POST,
                "/auth?action=register",
                None,
                Some(json!({
                    "username": username,
                    "password": PASSWORD,
                    "mode": "create",
                    "team_name": team_name,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        (response.cookie(), response.body)
    }

    /// Registers a user into an existing team; returns their cookie and the body
    pub async fn joiner(&self, username: &str, invite_code: &str) -> (String, Value) {
        let response = self
            .send(
                Method::POST,
                "/auth?action=register",
                None,
                Some(json!({
                    "username": username,
                    "password": PASSWORD,
                    "mode": "join",
                    "invite_code": invite_code,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        (response.cookie(), response.body)
    }
}
