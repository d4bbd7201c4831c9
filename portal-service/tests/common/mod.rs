//! Shared harness for portal-service integration tests: an in-memory store
//! seeded with two tenants, and helpers to drive the full router.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use portal_service::{
    build_router,
    models::{Company, NewUser, User},
    policy::Role,
    services::{MemoryStore, SessionTokens, Store, TokenSessionProvider},
    utils::PasswordHashString,
    AppState,
};
use secrecy::Secret;
use serde_json::Value;
use service_core::middleware::rate_limit::{create_ip_rate_limiter, IpRateLimit};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-session-secret-0123456789";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub tokens: SessionTokens,
    pub company_a: Company,
    pub company_b: Company,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_signin_limit(100).await
    }

    pub async fn with_signin_limit(attempts: u32) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let tokens = SessionTokens::new(&Secret::new(TEST_SECRET.to_string()), 1);

        let company_a = store.create_company("Acme").await.unwrap();
        let company_b = store.create_company("Globex").await.unwrap();

        let state = AppState {
            store: store.clone(),
            sessions: Arc::new(TokenSessionProvider::new(tokens.clone(), store.clone())),
            tokens: tokens.clone(),
            signin_rate_limit: IpRateLimit {
                limiter: create_ip_rate_limiter(attempts, 60),
                trust_forwarded_for: true,
            },
            secure_cookies: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        };

        Self {
            router: build_router(state),
            store,
            tokens,
            company_a,
            company_b,
        }
    }

    /// Seed a user directly in the store. The password hash is a
    /// placeholder; these users authenticate with issued tokens.
    pub async fn user(&self, role: Role, company_id: Option<Uuid>, is_active: bool) -> User {
        let id = Uuid::new_v4();
        self.store
            .create_user(NewUser {
                email: format!("{}@portal.test", id),
                name: format!("{} {}", role, id),
                password_hash: PasswordHashString::new("not-a-real-hash".to_string()),
                role,
                company_id,
                is_active,
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens.issue(user.id).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Issue a request with an optional bearer token and JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.call(Method::GET, uri, token, None).await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn assert_redirect(response: &Response<Body>, target: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), Some(target));
}
