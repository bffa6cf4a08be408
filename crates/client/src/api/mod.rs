//! Backend collaborators.
//!
//! The auth context and the signup wizard talk to the backend only through
//! the [`AuthApi`] and [`SignupApi`] traits. [`HttpApi`] implements both over
//! the REST endpoints; tests substitute in-memory fakes.

mod http;

use async_trait::async_trait;
use pharmacy_core::{BranchId, Role, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub use http::HttpApi;

/// Errors from a backend call.
///
/// The `Display` text is what gets classified on a failed login, so the
/// transport variants keep the phrases the classifier looks for.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request exceeded the client timeout.
    #[error("Request took too long")]
    Timeout,

    /// The server could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The server throttled the caller.
    #[error("{0}")]
    RateLimited(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Any other transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),

    /// The endpoint URL could not be built.
    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A user as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role_id: i32,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    /// Role name, when the backend includes it.
    #[serde(default)]
    pub role: Option<String>,
}

impl ApiUser {
    /// The role, preferring the numeric id over the name.
    #[must_use]
    pub fn derived_role(&self) -> Option<Role> {
        Role::from_id(self.role_id).or_else(|| self.role.as_deref()?.parse().ok())
    }
}

/// `GET /auth/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The backend sends the signed-in account either as `user` or as `users`,
/// and `users` has been seen both as an object and as a one-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(ApiUser),
    Many(Vec<ApiUser>),
}

/// `POST /auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub users: Option<OneOrMany>,
    #[serde(default, rename = "accessToken", alias = "token", alias = "access_token")]
    pub access_token: Option<String>,
    #[serde(default, rename = "refreshToken", alias = "refresh_token")]
    pub refresh_token: Option<String>,
    #[serde(default, rename = "requiresPasswordChange")]
    pub requires_password_change: bool,
    #[serde(default, rename = "mustChangePassword")]
    pub must_change_password: bool,
}

impl LoginResponse {
    /// The signed-in account: `user`, else the first of `users`.
    #[must_use]
    pub fn account(&self) -> Option<&ApiUser> {
        self.user.as_ref().or(match &self.users {
            Some(OneOrMany::One(user)) => Some(user),
            Some(OneOrMany::Many(users)) => users.first(),
            None => None,
        })
    }

    /// Whether the backend wants the password changed before anything else.
    #[must_use]
    pub const fn password_change_required(&self) -> bool {
        self.requires_password_change || self.must_change_password
    }
}

/// `POST /auth/register-manager` request body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupPayload {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role_id: i32,
    pub pharmacy_name: String,
    pub branch_name: String,
    pub location: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_email: Option<String>,
}

impl std::fmt::Debug for SignupPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupPayload")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role_id", &self.role_id)
            .field("pharmacy_name", &self.pharmacy_name)
            .field("branch_name", &self.branch_name)
            .field("location", &self.location)
            .field("phone", &self.phone)
            .field("branch_email", &self.branch_email)
            .finish()
    }
}

/// `POST /auth/register-manager` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for tokens and the account.
    async fn login(&self, email: &str, password: &SecretString)
    -> Result<LoginResponse, ApiError>;

    /// Fetch the account behind `access_token`.
    async fn get_profile(&self, access_token: &SecretString) -> Result<ProfileResponse, ApiError>;

    /// Tell the backend the session is over.
    async fn logout(&self, access_token: &SecretString) -> Result<(), ApiError>;
}

/// Manager self-registration endpoint.
#[async_trait]
pub trait SignupApi: Send + Sync {
    /// Register a manager together with their pharmacy and first branch.
    async fn signup_manager(&self, payload: &SignupPayload) -> Result<SignupResponse, ApiError>;
}
