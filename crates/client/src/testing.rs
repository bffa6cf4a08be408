//! In-memory collaborators for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pharmacy_core::{BranchId, UserId};
use secrecy::{ExposeSecret, SecretString};

use crate::api::{
    ApiError, ApiUser, AuthApi, LoginResponse, ProfileResponse, SignupApi, SignupPayload,
    SignupResponse,
};
use crate::storage::{MemoryStore, StorageKey, StoreError, TokenStore};

/// Expires in 2100.
pub const VALID_TOKEN: &str =
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJleHAiOjQxMDI0NDQ4MDB9.signature";

/// Expired in 1970.
pub const EXPIRED_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJleHAiOjF9.signature";

pub fn api_user(id: i64, role_id: i32) -> ApiUser {
    ApiUser {
        id: UserId::new(id),
        email: format!("user{id}@pharmacy.et"),
        full_name: format!("User {id}"),
        role_id,
        branch_id: Some(BranchId::new(5)),
        role: None,
    }
}

pub fn login_ok(user: ApiUser) -> LoginResponse {
    LoginResponse {
        success: true,
        user: Some(user),
        access_token: Some(VALID_TOKEN.to_string()),
        refresh_token: Some("refresh-token".to_string()),
        ..LoginResponse::default()
    }
}

/// A scripted [`AuthApi`].
///
/// Each call pops the next scripted result. A profile call with nothing
/// scripted never resolves, which lets tests exercise cancellation.
#[derive(Default)]
pub struct FakeAuthApi {
    pub logins: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    pub profiles: Mutex<VecDeque<Result<ProfileResponse, ApiError>>>,
    pub logout_fails: bool,
    pub profile_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub last_logout_token: Mutex<Option<String>>,
}

impl FakeAuthApi {
    pub fn with_login(result: Result<LoginResponse, ApiError>) -> Self {
        let api = Self::default();
        api.logins.lock().unwrap().push_back(result);
        api
    }

    pub fn with_profile(result: Result<ProfileResponse, ApiError>) -> Self {
        let api = Self::default();
        api.profiles.lock().unwrap().push_back(result);
        api
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(
        &self,
        _email: &str,
        _password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let next = self.logins.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ApiError::Network("no scripted login".to_string())))
    }

    async fn get_profile(&self, _access_token: &SecretString) -> Result<ProfileResponse, ApiError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.profiles.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn logout(&self, access_token: &SecretString) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_logout_token.lock().unwrap() = Some(access_token.expose_secret().to_owned());
        if self.logout_fails {
            Err(ApiError::Rejected {
                status: 500,
                message: "Internal server error".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// A scripted [`SignupApi`] that records what it was sent.
///
/// With nothing scripted the call never resolves.
#[derive(Default)]
pub struct FakeSignupApi {
    pub results: Mutex<VecDeque<Result<SignupResponse, ApiError>>>,
    pub payloads: Mutex<Vec<SignupPayload>>,
}

impl FakeSignupApi {
    pub fn with(result: Result<SignupResponse, ApiError>) -> Self {
        let api = Self::default();
        api.results.lock().unwrap().push_back(result);
        api
    }
}

#[async_trait]
impl SignupApi for FakeSignupApi {
    async fn signup_manager(&self, payload: &SignupPayload) -> Result<SignupResponse, ApiError> {
        self.payloads.lock().unwrap().push(payload.clone());
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// A store whose reads see nothing and whose writes always fail.
pub struct FailingStore;

impl TokenStore for FailingStore {
    fn get(&self, _key: StorageKey) -> Option<String> {
        None
    }

    fn set(&self, _key: StorageKey, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: PathBuf::from("/read-only/session.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.set(key, "")
    }
}

/// A [`MemoryStore`] that accepts a fixed number of writes and then fails.
///
/// Each `set`, `remove` or `replace_all` counts as one write; a failed write
/// leaves the contents alone.
pub struct LimitedStore {
    inner: MemoryStore,
    writes_left: AtomicUsize,
}

impl LimitedStore {
    pub fn new(writes: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            writes_left: AtomicUsize::new(writes),
        }
    }

    fn take_write(&self) -> Result<(), StoreError> {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::Io {
                path: PathBuf::from("/full-disk/session.json"),
                source: std::io::Error::from(std::io::ErrorKind::StorageFull),
            })
    }
}

impl TokenStore for LimitedStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.remove(key)
    }

    fn replace_all(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.replace_all(entries)
    }
}
