use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use taskboard_server::{app, config::Config, db::repository::Repositories, AppState};

#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

pub struct Registered {
    pub id: u64,
    pub token: String,
    pub refresh_token: String,
}

impl TestApp {
    /// Fresh application over empty in-memory storage.
    pub fn new() -> Self {
        let state = AppState::new(&Config::default(), Repositories::in_memory());
        Self { router: app(state) }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Registered {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        Registered {
            id: body["user"]["id"].as_u64().unwrap(),
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// POST and return the new entity's id, asserting 201.
    pub async fn create(&self, uri: &str, token: &str, body: Value) -> u64 {
        let (status, body) = self.post(uri, token, body).await;
        assert_eq!(status, StatusCode::CREATED, "create at {uri} failed: {body}");
        body["id"].as_u64().unwrap()
    }
}

/// Error code carried in an error response body.
pub fn code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or_default()
}
