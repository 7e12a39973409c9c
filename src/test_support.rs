//! Shared fixtures for router tests.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::db::models::{Admin, AdminForm};
use crate::db::MemoryStore;
use crate::notify::{LeadEvent, Notifier};
use crate::routes::{admins::create_account, auth::issue_token};
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "correct-horse";

/// Notifier that keeps every event in memory instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LeadEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<LeadEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: LeadEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: "test-secret".to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    }
}

pub fn test_state() -> (AppState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryStore::new()),
        notifier.clone(),
    );
    (state, notifier)
}

pub async fn seed_admin(state: &AppState, email: &str) -> Admin {
    create_account(
        state.store(),
        AdminForm {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            name: "Root".to_string(),
        },
        state.config().bcrypt_cost,
    )
    .await
    .unwrap()
}

/// Create an admin and return a bearer token for it.
pub async fn admin_token(state: &AppState) -> String {
    let admin = seed_admin(state, "root@example.com").await;
    issue_token(state.config(), &admin).unwrap().0
}

/// Send one request through the router and decode the JSON body
/// (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
