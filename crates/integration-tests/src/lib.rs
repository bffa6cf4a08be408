//! Integration tests for Pharmacy Desk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pharmacy-integration-tests
//! ```
//!
//! The tests need no external services: [`MockBackend`] serves the auth and
//! signup endpoints on an ephemeral local port, and the client talks to it
//! over real HTTP.
//!
//! # Test Categories
//!
//! - `session_flow` - Login, restore, logout and the route guard
//! - `signup_flow` - The manager signup wizard end to end

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Expiry far in the future (2100-01-01).
pub const FAR_FUTURE_EXP: i64 = 4_102_444_800;

/// Build an unsigned token whose payload carries `exp` and `sub`.
#[must_use]
pub fn make_token(exp: i64, sub: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "sub": sub }).to_string());
    format!("{header}.{payload}.signature")
}

/// How the backend treats a login for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    PendingActivation,
    MustChangePassword,
}

/// An account the mock backend knows about.
#[derive(Debug, Clone)]
pub struct MockAccount {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role_id: i32,
    pub branch_id: Option<i64>,
    pub status: AccountStatus,
}

impl MockAccount {
    #[must_use]
    pub fn new(id: i64, email: &str, password: &str, role_id: i32) -> Self {
        Self {
            id,
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: format!("User {id}"),
            role_id,
            branch_id: Some(1),
            status: AccountStatus::Active,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "full_name": self.full_name,
            "role_id": self.role_id,
            "branch_id": self.branch_id,
        })
    }
}

/// Everything the mock backend has seen and will answer with.
#[derive(Debug, Default)]
pub struct BackendState {
    pub accounts: Vec<MockAccount>,
    /// Tokens handed out by login and not yet logged out.
    pub issued: HashSet<String>,
    pub logged_out: Vec<String>,
    pub signups: Vec<Value>,
    pub profile_calls: usize,
    /// Answer logins with 429 once this many have been attempted.
    pub throttle_after: Option<usize>,
    pub login_attempts: usize,
    /// Hold profile responses this long.
    pub profile_delay: Option<Duration>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A pharmacy backend stand-in served on `127.0.0.1`.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Start serving with the given accounts.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(accounts: Vec<MockAccount>) -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            accounts,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/profile", get(profile))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/register-manager", post(register_manager))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind mock backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock backend address: {e}"));

        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
        });

        Self {
            addr,
            state,
            shutdown,
            task,
        }
    }

    /// The API root clients should be pointed at.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr))
            .unwrap_or_else(|e| panic!("mock backend URL: {e}"))
    }

    /// Inspect or change the backend state.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// Stop serving and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn token_subject(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice::<Value>(&bytes).ok()?.get("sub")?.as_i64()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

    let mut state = lock(&state);
    state.login_attempts += 1;
    if state
        .throttle_after
        .is_some_and(|limit| state.login_attempts > limit)
    {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "message": "Too many login attempts" })),
        );
    }

    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
        .cloned()
    else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid email or password" })),
        );
    };

    if account.status == AccountStatus::PendingActivation {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Account is pending admin activation" })),
        );
    }

    let token = make_token(FAR_FUTURE_EXP, account.id);
    state.issued.insert(token.clone());
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": account.to_json(),
            "accessToken": token,
            "refreshToken": format!("refresh-{}", account.id),
            "mustChangePassword": account.status == AccountStatus::MustChangePassword,
        })),
    )
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let delay = {
        let mut state = lock(&state);
        state.profile_calls += 1;
        state.profile_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let state = lock(&state);
    let account = bearer(&headers)
        .filter(|token| state.issued.contains(token))
        .and_then(|token| token_subject(&token))
        .and_then(|id| state.accounts.iter().find(|a| a.id == id));
    match account {
        Some(account) => (
            StatusCode::OK,
            Json(json!({ "success": true, "user": account.to_json() })),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid or expired token" })),
        ),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> StatusCode {
    let mut state = lock(&state);
    match bearer(&headers) {
        Some(token) => {
            state.issued.remove(&token);
            state.logged_out.push(token);
            StatusCode::OK
        }
        None => StatusCode::UNAUTHORIZED,
    }
}

async fn register_manager(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    let email = body
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let taken = state
        .accounts
        .iter()
        .any(|a| a.email.eq_ignore_ascii_case(&email))
        || state
            .signups
            .iter()
            .any(|s| s.get("email").and_then(Value::as_str) == Some(email.as_str()));
    if taken {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "message": "Email already registered" })),
        );
    }

    state.signups.push(body);
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Registration received. Your account is pending admin activation."
        })),
    )
}
