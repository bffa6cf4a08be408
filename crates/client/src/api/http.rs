//! REST implementation of the backend collaborators.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{
    ApiError, AuthApi, LoginResponse, ProfileResponse, SignupApi, SignupPayload, SignupResponse,
};

const LOGIN_PATH: &str = "auth/login";
const PROFILE_PATH: &str = "auth/profile";
const LOGOUT_PATH: &str = "auth/logout";
const REGISTER_MANAGER_PATH: &str = "auth/register-manager";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Error body the backend sends with non-success statuses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the pharmacy backend.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApi {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// The API root every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(transport_error)?;
            return serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, %status, "Failed to read error response body");
                String::new()
            }
        };
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| format!("HTTP {status}"), str::to_owned)
            });

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(ApiError::RateLimited(message))
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// `Url::join` replaces the last segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Network(e.to_string())
    } else {
        ApiError::Http(e)
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.endpoint(LOGIN_PATH)?).json(&LoginRequest {
            email,
            password: password.expose_secret(),
        });
        self.send(request).await
    }

    #[instrument(skip_all)]
    async fn get_profile(&self, access_token: &SecretString) -> Result<ProfileResponse, ApiError> {
        let request = self
            .client
            .get(self.endpoint(PROFILE_PATH)?)
            .bearer_auth(access_token.expose_secret());
        self.send(request).await
    }

    #[instrument(skip_all)]
    async fn logout(&self, access_token: &SecretString) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.endpoint(LOGOUT_PATH)?)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message: format!("Logout failed with HTTP {status}"),
            })
        }
    }
}

#[async_trait]
impl SignupApi for HttpApi {
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    async fn signup_manager(&self, payload: &SignupPayload) -> Result<SignupResponse, ApiError> {
        let request = self
            .client
            .post(self.endpoint(REGISTER_MANAGER_PATH)?)
            .json(payload);
        self.send(request).await
    }
}
