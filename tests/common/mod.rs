// Test helpers are intentionally partially used
#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use guard_attendance::{
    create_noop_metrics,
    domain::{Coordinates, KeyValueStorePtr, MetricsPtr},
    ApiConfig, AppState, FileCamera, FixedLocation, HttpAttendanceApi, PostSubmitAction,
    SessionManager,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

// ============================================================================
// Mock attendance server
// ============================================================================

/// One `/submit` request as the server saw it.
#[derive(Debug, Clone, Default)]
pub struct ReceivedSubmission {
    pub fields: HashMap<String, String>,
    pub photo: Vec<u8>,
    pub photo_file_name: Option<String>,
    pub photo_content_type: Option<String>,
}

/// How the mock server answers. Mutable while the server runs.
#[derive(Debug, Default)]
pub struct Behavior {
    /// id -> display name
    pub users: HashMap<String, String>,
    pub checkpoints: HashSet<String>,
    /// user ids that `/submit` reports as `invalid user`
    pub invalid_users: HashSet<String>,

    pub verify_user_delay: Duration,
    pub verify_user_status: Option<u16>,
    pub verify_checkpoint_status: Option<u16>,
    pub submit_status: Option<u16>,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub verified_users: Vec<String>,
    pub verified_checkpoints: Vec<String>,
    pub submissions: Vec<ReceivedSubmission>,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub behavior: Arc<Mutex<Behavior>>,
    pub recorded: Arc<Mutex<Recorded>>,
}

fn forced(status: Option<u16>) -> Option<(StatusCode, Json<Value>)> {
    // ---
    status.map(|code| {
        (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "status": "error", "message": "forced failure" })),
        )
    })
}

async fn verify_user(
    State(state): State<MockState>,
    Json(id): Json<String>,
) -> (StatusCode, Json<Value>) {
    // ---
    state.recorded.lock().unwrap().verified_users.push(id.clone());

    let (delay, status, name) = {
        let behavior = state.behavior.lock().unwrap();
        (
            behavior.verify_user_delay,
            behavior.verify_user_status,
            behavior.users.get(&id).cloned(),
        )
    };

    if !delay.is_zero() {
        sleep(delay).await;
    }
    if let Some(reply) = forced(status) {
        return reply;
    }

    match name {
        Some(name) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "message": format!("Welcome {name}") })),
        ),
        None => (
            StatusCode::OK,
            Json(json!({ "status": "error", "message": "Invalid Guard ID" })),
        ),
    }
}

async fn verify_checkpoint(
    State(state): State<MockState>,
    Json(code): Json<String>,
) -> (StatusCode, Json<Value>) {
    // ---
    state
        .recorded
        .lock()
        .unwrap()
        .verified_checkpoints
        .push(code.clone());

    let behavior = state.behavior.lock().unwrap();
    if let Some(reply) = forced(behavior.verify_checkpoint_status) {
        return reply;
    }

    if behavior.checkpoints.contains(&code) {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::OK,
            Json(json!({ "status": "error", "message": "Invalid checkpoint" })),
        )
    }
}

async fn submit(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    // ---
    let mut received = ReceivedSubmission::default();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            received.photo_file_name = field.file_name().map(str::to_string);
            received.photo_content_type = field.content_type().map(str::to_string);
            received.photo = field.bytes().await.unwrap().to_vec();
        } else {
            let value = field.text().await.unwrap();
            received.fields.insert(name, value);
        }
    }

    let user_id = received.fields.get("user_id").cloned().unwrap_or_default();
    state.recorded.lock().unwrap().submissions.push(received);

    let behavior = state.behavior.lock().unwrap();
    if let Some(reply) = forced(behavior.submit_status) {
        return reply;
    }

    if behavior.invalid_users.contains(&user_id) {
        (StatusCode::OK, Json(json!({ "errorcode": "invalid user" })))
    } else {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "message": "Attendance recorded" })),
        )
    }
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub state: MockState,
}

impl TestServer {
    // ---
    pub async fn new(behavior: Behavior) -> Self {
        // ---
        let state = MockState {
            behavior: Arc::new(Mutex::new(behavior)),
            recorded: Arc::new(Mutex::new(Recorded::default())),
        };

        let app = Router::new()
            .route("/verify_user", post(verify_user))
            .route("/verify_checkpoint", post(verify_checkpoint))
            .route("/submit", post(submit))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(50)).await;

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn behavior(&self) -> std::sync::MutexGuard<'_, Behavior> {
        self.state.behavior.lock().unwrap()
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.state.recorded.lock().unwrap()
    }
}

/// Guard `guard1` ("Guard One") and checkpoint `CP-42` are known.
pub fn default_behavior() -> Behavior {
    // ---
    Behavior {
        users: HashMap::from([("guard1".to_string(), "Guard One".to_string())]),
        checkpoints: HashSet::from(["CP-42".to_string()]),
        ..Behavior::default()
    }
}

// ============================================================================
// Client wiring
// ============================================================================

pub fn api_config(base_url: &str, verify_user_timeout: Duration) -> ApiConfig {
    // ---
    ApiConfig {
        base_url: reqwest::Url::parse(base_url).unwrap(),
        verify_user_timeout,
    }
}

pub fn http_api(server: &TestServer, verify_user_timeout: Duration) -> HttpAttendanceApi {
    // ---
    HttpAttendanceApi::new(
        &api_config(&server.url(), verify_user_timeout),
        create_noop_metrics().unwrap(),
    )
    .unwrap()
}

/// Full client against `server`, with a photo file written under `dir`.
pub fn build_app(
    server: &TestServer,
    store: KeyValueStorePtr,
    dir: &Path,
    position: Option<Coordinates>,
    metrics: MetricsPtr,
    post_submit: PostSubmitAction,
) -> AppState {
    // ---
    let photo_path = dir.join("selfie.jpg");
    std::fs::write(&photo_path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();

    let api = Arc::new(
        HttpAttendanceApi::new(
            &api_config(&server.url(), Duration::from_secs(8)),
            metrics.clone(),
        )
        .unwrap(),
    );
    let session = Arc::new(SessionManager::new(store, api.clone(), metrics.clone()));

    AppState::new(
        session,
        api,
        Arc::new(FileCamera::new(photo_path)),
        Arc::new(FixedLocation::new(position)),
        metrics,
        post_submit,
    )
}
