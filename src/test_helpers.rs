//! Test doubles: an in-process auth API and a recording navigator.
//!
//! The mock server speaks the same cookie-session protocol as the real API:
//! login and register set an HttpOnly `session` cookie, refresh and me
//! require it, logout revokes it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get, post};
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};

use crate::config::SessionConfig;
use crate::navigation::Navigator;

pub const SESSION_COOKIE: &str = "session";
pub const PASSWORD: &str = "Passw0rd";

// =============================================================================
// RECORDING NAVIGATOR
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, route: &str) -> usize {
        self.routes().iter().filter(|r| r.as_str() == route).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}

// =============================================================================
// MOCK AUTH SERVER
// =============================================================================

/// How `POST /api/auth/refresh` responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// 200 with a valid cookie, 401 without.
    Cookie,
    /// Always respond with this status.
    Status(u16),
    /// Sleep before answering as `Cookie` would.
    Hang(Duration),
}

struct MockInner {
    hits: Mutex<HashMap<&'static str, usize>>,
    tokens: Mutex<HashSet<String>>,
    emails: Mutex<HashSet<String>>,
    refresh_mode: Mutex<RefreshMode>,
    logout_status: Mutex<u16>,
    user: Mutex<Value>,
    next_token: AtomicU64,
}

#[derive(Clone)]
pub struct MockState {
    inner: Arc<MockInner>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            inner: Arc::new(MockInner {
                hits: Mutex::new(HashMap::new()),
                tokens: Mutex::new(HashSet::new()),
                emails: Mutex::new(HashSet::from(["taken@b.com".to_owned()])),
                refresh_mode: Mutex::new(RefreshMode::Cookie),
                logout_status: Mutex::new(204),
                user: Mutex::new(json!({ "user_id": "u1", "email": "a@b.com" })),
                next_token: AtomicU64::new(1),
            }),
        }
    }
}

impl MockState {
    fn hit(&self, route: &'static str) {
        *self
            .inner
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route)
            .or_insert(0) += 1;
    }

    /// Number of requests received for a route name (`login`, `refresh`, ...).
    pub fn hits(&self, route: &str) -> usize {
        self.inner
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.inner.hits.lock().unwrap_or_else(PoisonError::into_inner).values().sum()
    }

    /// Register a token as a live session, as if issued by an earlier process.
    pub fn grant(&self, token: &str) {
        self.inner
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_owned());
    }

    /// Invalidate every session server-side.
    pub fn revoke_all(&self) {
        self.inner.tokens.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.inner.refresh_mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn set_logout_status(&self, status: u16) {
        *self.inner.logout_status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub fn set_user(&self, user: Value) {
        *self.inner.user.lock().unwrap_or_else(PoisonError::into_inner) = user;
    }

    fn user(&self) -> Value {
        self.inner.user.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn is_valid(&self, jar: &CookieJar) -> bool {
        jar.get(SESSION_COOKIE).is_some_and(|c| {
            self.inner
                .tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(c.value())
        })
    }

    fn issue(&self, jar: CookieJar) -> CookieJar {
        let token = format!("tok-{}", self.inner.next_token.fetch_add(1, Ordering::SeqCst));
        self.grant(&token);
        jar.add(Cookie::build((SESSION_COOKIE, token)).path("/").http_only(true))
    }
}

pub struct MockAuthServer {
    pub base_url: String,
    pub state: MockState,
}

impl MockAuthServer {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/me", get(me))
            .route("/api/protected", get(protected))
            .route("/api/echo", any(echo))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), state }
    }

    /// Config pointed at this server with test-friendly timings.
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new(&self.base_url)
            .unwrap()
            .with_refresh_timeout(Duration::from_millis(500))
    }
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn error(status: StatusCode, message: &str, code: Option<&str>) -> Response {
    let detail = match code {
        Some(code) => json!({ "message": message, "code": code }),
        None => json!({ "message": message }),
    };
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn login(State(state): State<MockState>, jar: CookieJar, Json(body): Json<Value>) -> Response {
    state.hit("login");
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password", None);
    }
    let jar = state.issue(jar);
    (jar, Json(json!({ "user": state.user() }))).into_response()
}

async fn register(State(state): State<MockState>, jar: CookieJar, Json(body): Json<Value>) -> Response {
    state.hit("register");
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let inserted = state
        .inner
        .emails
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(email.clone());
    if !inserted {
        return error(StatusCode::CONFLICT, "User already exists", Some("email_already_exists"));
    }
    let user = json!({
        "user_id": format!("u-{email}"),
        "email": email,
        "first_name": body["first_name"],
        "last_name": body["last_name"],
        "display_name": body["display_name"],
    });
    let jar = state.issue(jar);
    (jar, Json(json!({ "user": user }))).into_response()
}

async fn logout(State(state): State<MockState>, jar: CookieJar) -> Response {
    state.hit("logout");
    let status = *state.inner.logout_status.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state
            .inner
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(cookie.value());
    }
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), status).into_response()
    } else {
        error(status, "logout failed", None)
    }
}

async fn refresh(State(state): State<MockState>, jar: CookieJar) -> Response {
    state.hit("refresh");
    let mode = *state.inner.refresh_mode.lock().unwrap_or_else(PoisonError::into_inner);
    match mode {
        RefreshMode::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return error(status, "refresh rejected", None);
        }
        RefreshMode::Hang(delay) => tokio::time::sleep(delay).await,
        RefreshMode::Cookie => {}
    }
    if state.is_valid(&jar) {
        Json(json!({ "ok": true })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Not authenticated", None)
    }
}

async fn me(State(state): State<MockState>, jar: CookieJar) -> Response {
    state.hit("me");
    if state.is_valid(&jar) {
        Json(json!({ "user": state.user() })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Not authenticated", None)
    }
}

async fn protected(State(state): State<MockState>, jar: CookieJar) -> Response {
    state.hit("protected");
    if state.is_valid(&jar) {
        Json(json!({ "ok": true })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Session expired", None)
    }
}

/// Reflects method and JSON body back. `DELETE` answers 204 with no body.
async fn echo(State(state): State<MockState>, method: Method, body: String) -> Response {
    state.hit("echo");
    if method == Method::DELETE {
        return StatusCode::NO_CONTENT.into_response();
    }
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    Json(json!({ "method": method.as_str(), "body": body })).into_response()
}
