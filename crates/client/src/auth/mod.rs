//! Authentication context.
//!
//! [`AuthContext`] is the one session object of a running client. It owns
//! the session state, the persisted token store and the auth collaborator,
//! and is passed by reference to whatever needs the session. Views observe
//! it through [`AuthContext::subscribe`].
//!
//! # Invariants
//!
//! - Authenticated only while a non-expired access token is stored and the
//!   last profile fetch (or login) succeeded.
//! - Storage and in-memory state change together: [`AuthContext::establish_session`]
//!   writes the store before flipping state, and logout clears both.
//! - A cancelled call leaves both untouched.

mod login;
mod session;

use std::sync::Arc;

use pharmacy_core::routes::AppRoute;
use pharmacy_core::{AccessView, GuardDecision, has_permission, is_token_expired};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub use login::{DEFAULT_LOGIN_FAILURE, LoginFailure, LoginOutcome};
pub use session::{SessionState, User};

use crate::api::{AuthApi, ProfileResponse};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{StorageKey, StoreError, TokenStore, clear_session};

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend refused the credentials or could not be reached.
    #[error("{reason}")]
    LoginFailed {
        reason: LoginFailure,
        /// The unclassified message, for logs.
        detail: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
}

/// Everything needed to start a session.
pub struct NewSession {
    pub user: User,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

/// The process-wide session.
pub struct AuthContext {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
}

impl AuthContext {
    /// Create an uninitialized context. Call [`AuthContext::initialize`] once
    /// at startup.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            state: watch::Sender::new(SessionState::Uninitialized),
        }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn access_view(&self) -> AccessView {
        self.state.borrow().access_view()
    }

    /// The token store this session persists to.
    #[must_use]
    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    /// Run the route guard for `path` against the current session.
    #[must_use]
    pub fn resolve(&self, path: &str) -> (AppRoute, GuardDecision) {
        let (route, decision) = AppRoute::resolve(path, &self.access_view());
        debug!(path, ?route, ?decision, "Route guard decision");
        (route, decision)
    }

    /// Whether the signed-in user holds the permission called `name`.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.state
            .borrow()
            .role_id()
            .is_some_and(|role_id| has_permission(role_id, name))
    }

    /// Validate any stored session against the backend.
    ///
    /// Runs once per context; later calls return immediately. A missing or
    /// expired token, a failed profile fetch, or a profile response without
    /// success all end anonymous with every session key removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Cancelled`] if `cancel` fires first. The context
    /// is then back to `Uninitialized` and storage is untouched.
    #[instrument(skip_all)]
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<(), AuthError> {
        let started = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Uninitialized) {
                *state = SessionState::Loading;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("Session already initialized");
            return Ok(());
        }

        let Some(token) = self.store.get(StorageKey::AccessToken) else {
            self.state.send_replace(SessionState::Anonymous);
            return Ok(());
        };

        if is_token_expired(&token) {
            info!("Stored access token has expired, clearing session");
            clear_session(self.store.as_ref());
            self.state.send_replace(SessionState::Anonymous);
            return Ok(());
        }

        let token = SecretString::from(token);
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.state.send_replace(SessionState::Uninitialized);
                return Err(AuthError::Cancelled);
            }
            result = self.api.get_profile(&token) => result,
        };

        let next = match result {
            Ok(ProfileResponse {
                success: true,
                user: Some(account),
                ..
            }) => {
                let stored_role = self
                    .store
                    .get(StorageKey::UserRole)
                    .and_then(|role| role.parse().ok());
                let user = User::from_api(&account, stored_role);
                info!(user_id = %user.id, "Session restored");
                set_sentry_user(user.id.as_i64(), Some(&user.email));
                SessionState::Authenticated(user)
            }
            Ok(response) => {
                warn!(message = ?response.message, "Profile check rejected the stored session");
                clear_session(self.store.as_ref());
                SessionState::Anonymous
            }
            Err(e) => {
                warn!(error = %e, "Profile check failed");
                clear_session(self.store.as_ref());
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next);
        Ok(())
    }

    /// Persist a session and mark the context authenticated, in one step.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the session could not be written. The
    /// in-memory state is then unchanged and the store is cleared.
    pub fn establish_session(&self, session: NewSession) -> Result<(), AuthError> {
        let mut entries = vec![(
            StorageKey::AccessToken,
            session.access_token.expose_secret().to_owned(),
        )];
        if let Some(refresh) = &session.refresh_token {
            entries.push((StorageKey::RefreshToken, refresh.expose_secret().to_owned()));
        }
        entries.extend(session.user.storage_entries());

        if let Err(e) = self.store.replace_all(&entries) {
            clear_session(self.store.as_ref());
            return Err(e.into());
        }

        info!(
            user_id = %session.user.id,
            role = ?session.user.role,
            "Session established"
        );
        set_sentry_user(session.user.id.as_i64(), Some(&session.user.email));
        self.state
            .send_replace(SessionState::Authenticated(session.user));
        Ok(())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - [`AuthError::LoginFailed`] with a classified reason when the backend
    ///   refuses or the request fails
    /// - [`AuthError::InvalidResponse`] when a successful response lacks the
    ///   account or the access token
    /// - [`AuthError::Cancelled`] when `cancel` fires first; nothing changes
    /// - [`AuthError::Store`] when the session could not be persisted
    #[instrument(skip(self, password, cancel), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        cancel: &CancellationToken,
    ) -> Result<LoginOutcome, AuthError> {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AuthError::Cancelled),
            result = self.api.login(email.trim(), password) => result,
        };

        let response = match result {
            Ok(response) if response.success => response,
            Ok(response) => return Err(login_failed(response.message.unwrap_or_default())),
            Err(e) => return Err(login_failed(e.to_string())),
        };

        let (Some(account), Some(access_token)) =
            (response.account(), response.access_token.as_deref())
        else {
            return Err(AuthError::InvalidResponse(
                "login succeeded without an account or access token".to_string(),
            ));
        };

        let outcome = LoginOutcome {
            user: User::from_api(account, None),
            password_change_required: response.password_change_required(),
        };
        self.establish_session(NewSession {
            user: outcome.user.clone(),
            access_token: SecretString::from(access_token.to_owned()),
            refresh_token: response.refresh_token.clone().map(SecretString::from),
        })?;
        Ok(outcome)
    }

    /// Sign out.
    ///
    /// The backend is told first, best-effort; its failure is logged only.
    /// Local state and every session key are cleared regardless.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        if let Some(token) = self.store.get(StorageKey::AccessToken) {
            if let Err(e) = self.api.logout(&SecretString::from(token)).await {
                warn!(error = %e, "Logout request failed, clearing local session anyway");
            }
        }
        self.end_session();
        info!("Signed out");
    }

    fn end_session(&self) {
        clear_session(self.store.as_ref());
        clear_sentry_user();
        self.state.send_replace(SessionState::Anonymous);
    }

    /// Change the signed-in user and re-persist their stored fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, or
    /// [`AuthError::Store`] if the store rejects the write. Both the store
    /// and the in-memory user are then unchanged.
    pub fn update_user(&self, update: impl FnOnce(&mut User)) -> Result<User, AuthError> {
        let Some(mut user) = self.state.borrow().user().cloned() else {
            return Err(AuthError::NotAuthenticated);
        };
        update(&mut user);

        let mut entries: Vec<_> = [StorageKey::AccessToken, StorageKey::RefreshToken]
            .into_iter()
            .filter_map(|key| self.store.get(key).map(|value| (key, value)))
            .collect();
        entries.extend(user.storage_entries());
        self.store.replace_all(&entries)?;

        self.state
            .send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }
}

fn login_failed(detail: String) -> AuthError {
    let reason = LoginFailure::classify(&detail);
    warn!(%detail, ?reason, "Login failed");
    AuthError::LoginFailed { reason, detail }
}
