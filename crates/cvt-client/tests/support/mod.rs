//! In-process mock of the CVT backend.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::Json;
use cvt_client::{ApiClient, ClientConfig};
use futures::Stream;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Session cookie handed out on login.
pub const SESSION_COOKIE: &str = "session=token-123";

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Mutable backend state shared with the test body.
pub struct Mock {
    pub requests: Mutex<Vec<Recorded>>,
    pub members: Mutex<Vec<Value>>,
    pub containers: Mutex<Vec<Value>>,
    pub list_status: Mutex<StatusCode>,
    pub flaky_failures: AtomicUsize,
    pub signed_in: AtomicBool,
    pub container_state: Mutex<String>,
    pub state_polls: AtomicUsize,
    pub action_status: Mutex<StatusCode>,
    pub log_lines: Mutex<Vec<String>>,
    /// Named events sent ahead of the log lines.
    pub named_events: Mutex<Vec<(String, String)>>,
    pub hold_stream: AtomicBool,
    /// Streams to end early even when `hold_stream` is set.
    pub close_streams: AtomicUsize,
    /// `retry:` sent with the first event, in milliseconds.
    pub stream_retry_ms: Mutex<Option<u64>>,
}

impl Default for Mock {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            members: Mutex::new(Vec::new()),
            containers: Mutex::new(Vec::new()),
            list_status: Mutex::new(StatusCode::OK),
            flaky_failures: AtomicUsize::new(0),
            signed_in: AtomicBool::new(false),
            container_state: Mutex::new("created".into()),
            state_polls: AtomicUsize::new(0),
            action_status: Mutex::new(StatusCode::OK),
            log_lines: Mutex::new(Vec::new()),
            named_events: Mutex::new(Vec::new()),
            hold_stream: AtomicBool::new(false),
            close_streams: AtomicUsize::new(0),
            stream_retry_ms: Mutex::new(None),
        }
    }
}

impl Mock {
    /// Requests matching `method` and `path`.
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Requests whose path starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }

    /// Last request to `path`.
    pub fn last(&self, path: &str) -> Option<Recorded> {
        self.requests.lock().iter().rev().find(|r| r.path == path).cloned()
    }

    fn record(&self, method: Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
        self.requests.lock().push(Recorded {
            method,
            path: uri.path().to_string(),
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }
}

/// A running mock server.
pub struct TestBackend {
    pub addr: SocketAddr,
    pub mock: Arc<Mock>,
    handle: JoinHandle<()>,
}

impl TestBackend {
    /// Start on an ephemeral port.
    pub async fn start() -> Self {
        let mock = Arc::new(Mock::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = router(Arc::clone(&mock));
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, mock, handle }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config with short retry and poll delays.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.url())
            .unwrap()
            .retries(3, Duration::from_millis(10))
            .poll_intervals(Duration::from_millis(100), Duration::from_millis(100))
    }

    /// Client pointed at the server.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.config()).unwrap()
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A container record as the backend lists it.
pub fn container_json(container_id: Option<&str>, build_id: &str) -> Value {
    json!({
        "id": format!("rec-{build_id}"),
        "containerId": container_id,
        "name": "api",
        "image": "alpine",
        "hostPort": "8080",
        "environmentVariables": [],
        "state": "created",
        "buildId": build_id,
        "projectId": "sw-1"
    })
}

fn user_json() -> Value {
    json!({
        "id": "u-1",
        "fullName": "Dana Levi",
        "email": "dana@example.com",
        "username": "dana",
        "role": "admin",
        "active": true,
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

type Shared = State<Arc<Mock>>;

fn router(mock: Arc<Mock>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout))
        .route("/member/ls", get(list_members))
        .route("/member/new", post(create_member))
        .route("/member/{id}", put(accept).delete(accept))
        .route("/software/{id}", put(accept).delete(accept))
        .route("/users/{id}", put(accept).delete(accept))
        .route("/files/{id}", delete(accept))
        .route("/docker/container/ls", get(list_containers))
        .route("/docker/container/new", post(accept))
        .route("/docker/container/new/build/{build_id}", post(accept))
        .route("/docker/container/state/{id}", get(container_state))
        .route("/docker/container/start/{id}", get(start))
        .route("/docker/container/stop/{id}", get(stop))
        .route("/docker/container/restart/{id}", get(restart))
        .route("/docker/container/remove/{id}", get(remove))
        .route("/docker/container/build-logs/{build_id}", get(build_logs))
        .fallback(unmatched)
        .with_state(mock)
}

async fn login(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    mock.record(method, &uri, &headers, &body);
    let creds: Value = serde_json::from_slice(&body).unwrap_or_default();
    if creds["hash"] != "secret" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    mock.signed_in.store(true, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/; HttpOnly"))],
        "ok",
    )
        .into_response()
}

async fn me(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    mock.record(method, &uri, &headers, &[]);
    let has_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(SESSION_COOKIE));
    if has_cookie && mock.signed_in.load(Ordering::SeqCst) {
        Json(user_json()).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn logout(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    mock.record(method, &uri, &headers, &[]);
    mock.signed_in.store(false, Ordering::SeqCst);
    StatusCode::OK
}

async fn list_members(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    mock.record(method, &uri, &headers, &[]);
    if mock
        .flaky_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let status = *mock.list_status.lock();
    if status == StatusCode::OK {
        Json(Value::Array(mock.members.lock().clone())).into_response()
    } else {
        (status, "").into_response()
    }
}

async fn create_member(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    mock.record(method, &uri, &headers, &body);
    let mut member: Value = serde_json::from_slice(&body).unwrap_or_default();
    let id = format!("m-{}", mock.members.lock().len() + 1);
    member["id"] = json!(id);
    mock.members.lock().push(member);
    StatusCode::CREATED
}

async fn accept(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> StatusCode {
    mock.record(method, &uri, &headers, &body);
    StatusCode::OK
}

async fn list_containers(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> Json<Value> {
    mock.record(method, &uri, &headers, &[]);
    Json(Value::Array(mock.containers.lock().clone()))
}

async fn container_state(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> Json<String> {
    mock.record(method, &uri, &headers, &[]);
    mock.state_polls.fetch_add(1, Ordering::SeqCst);
    Json(mock.container_state.lock().clone())
}

fn lifecycle(mock: &Mock, method: Method, uri: &Uri, headers: &HeaderMap, next: &str) -> StatusCode {
    mock.record(method, uri, headers, &[]);
    let status = *mock.action_status.lock();
    if status.is_success() {
        *mock.container_state.lock() = next.to_string();
    }
    status
}

async fn start(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    lifecycle(&mock, method, &uri, &headers, "running")
}

async fn stop(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    lifecycle(&mock, method, &uri, &headers, "exited")
}

async fn restart(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    lifecycle(&mock, method, &uri, &headers, "running")
}

async fn remove(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    lifecycle(&mock, method, &uri, &headers, "removing")
}

async fn unmatched(State(mock): Shared, method: Method, uri: Uri, headers: HeaderMap) -> StatusCode {
    mock.record(method, &uri, &headers, &[]);
    StatusCode::NOT_FOUND
}

async fn build_logs(
    State(mock): Shared,
    Path(_build_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    use futures::StreamExt;

    mock.record(method, &uri, &headers, &[]);
    let mut events: Vec<Event> = mock
        .named_events
        .lock()
        .iter()
        .map(|(name, data)| Event::default().event(name.clone()).data(data.clone()))
        .collect();
    events.extend(
        mock.log_lines
            .lock()
            .iter()
            .map(|line| Event::default().data(line.clone())),
    );
    let retry = *mock.stream_retry_ms.lock();
    if let Some(ms) = retry {
        events.insert(0, Event::default().retry(Duration::from_millis(ms)));
    }
    let closing = mock
        .close_streams
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    let hold = mock.hold_stream.load(Ordering::SeqCst) && !closing;
    let tail = futures::stream::once(async move {
        if hold {
            futures::future::pending::<()>().await;
        }
    })
    .filter_map(|()| async { None });
    let events = events.into_iter().map(Ok::<_, Infallible>);
    Sse::new(futures::stream::iter(events).chain(tail)).keep_alive(KeepAlive::default())
}
