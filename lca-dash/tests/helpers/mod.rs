//! Scripted mock of the LCA backend for integration tests
//!
//! Routes are keyed by `"METHOD /path"` (without the `/api` prefix). Each
//! route holds a queue of responses; the last one repeats once the queue is
//! down to a single entry. Every request is recorded for assertions.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use lca_common::config::DashConfig;
use lca_common::Store;
use lca_dash::models::{Role, Session, User};
use lca_dash::DashState;
use serde_json::{json, Value};

/// Request as seen by the mock backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct MockState {
    routes: HashMap<String, VecDeque<(StatusCode, Value)>>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    pub base_url: String,
}

impl MockBackend {
    /// Bind on an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}/api", addr),
        }
    }

    /// Queue a response for `"METHOD /path"`
    pub fn respond(&self, route: &str, status: u16, body: Value) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.state
            .lock()
            .unwrap()
            .routes
            .entry(route.to_string())
            .or_default()
            .push_back((status, body));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests whose `"METHOD /path"` equals `route`
    pub fn requests_to(&self, route: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| format!("{} {}", r.method, r.path) == route)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or(uri.path())
        .to_string();
    let key = format!("{} {}", method, path);

    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.to_string(),
        path,
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let scripted = match state.routes.get_mut(&key) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
    };

    match scripted {
        Some((status, Value::String(text))) => (status, text).into_response(),
        Some((status, body)) => (status, axum::Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": format!("no route for {}", key) })),
        )
            .into_response(),
    }
}

pub fn test_config(base_url: &str, data_folder: &Path) -> DashConfig {
    DashConfig {
        api_base_url: base_url.to_string(),
        data_folder: data_folder.to_path_buf(),
        poll_interval: Duration::from_millis(5),
        max_poll_attempts: 20,
        request_timeout: Duration::from_secs(5),
        log_level: "debug".to_string(),
    }
}

pub fn user(id: &str, email: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        name: None,
        role,
    }
}

pub fn logged_in(token: &str, role: Role) -> Session {
    Session {
        token: token.to_string(),
        user: user("1", "ops@example.com", role),
        impersonator: None,
    }
}

/// In-memory dashboard state pointed at the mock, logged in as a regular user
pub fn dash_state(backend: &MockBackend, data_folder: &Path) -> DashState {
    let state = DashState::in_memory(test_config(&backend.base_url, data_folder)).unwrap();
    state
        .session
        .set(Some(logged_in("user-token", Role::User)))
        .unwrap();
    state
}

/// Materials requiring review as the backend reports them
pub fn review_materials() -> Value {
    json!([
        {
            "id": "m1",
            "name": "Recycled steel",
            "occurrences": 3,
            "suggestions": [
                { "activityUuid": "a-1", "activityName": "steel production", "confidence": 0.92 },
                { "activityUuid": "a-2", "activityName": "steel, low-alloyed", "confidence": 0.5 }
            ]
        },
        {
            "id": "m2",
            "name": "Organic cotton",
            "occurrences": 1,
            "suggestions": [
                { "activityUuid": "c-1", "activityName": "cotton fibre", "confidence": 0.45 }
            ]
        },
        { "id": 3, "name": "Mystery polymer", "suggestions": [] }
    ])
}

pub fn completed_status() -> Value {
    json!({
        "status": "completed",
        "progress": 100,
        "message": "Processing complete",
        "result": {
            "totalProducts": 2,
            "totalMaterials": 7,
            "materialsMatched": 4,
            "materialsUnmatched": 3,
            "materialsRequiringReview": review_materials()
        }
    })
}
