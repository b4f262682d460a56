//! Auth endpoints: OAuth login init, callback completion, token verify.
//!
//! Unlike the rest of the API surface these calls propagate every
//! failure to the caller. The session layer reacts to them directly,
//! clearing stored state on a failed callback or a rejected token, so
//! swallowing errors here would leave half-open sessions behind.

use serde::{Deserialize, Serialize};

use crate::api::client::ApiClient;
use crate::auth::{AuthProvider, AuthUser};
use crate::error::{Error, Result};

/// Response of the login-init endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInit {
    /// Provider URL the user agent should be sent to.
    #[serde(rename = "loginUrl", alias = "url")]
    pub login_url: String,
    /// Login nonce, when the backend issues one up front.
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Request body for callback completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCallbackRequest {
    /// Which provider ran the flow.
    pub provider: AuthProvider,
    /// Authorization code from the provider redirect.
    pub code: String,
    /// Opaque state echoed back by the provider, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Completed-authentication payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCallbackResponse {
    /// Bearer token for subsequent API calls.
    pub token: String,
    /// Wallet address derived for this identity.
    #[serde(alias = "zkLoginAddress")]
    pub address: String,
    /// Email, when the provider shares it.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when the provider shares it.
    #[serde(default)]
    pub name: Option<String>,
    /// Login proof for transaction signing.
    #[serde(default)]
    pub proof: Option<String>,
    /// Provider JWT.
    #[serde(default)]
    pub jwt: Option<String>,
    /// User salt tied to this identity.
    #[serde(default, alias = "userSalt")]
    pub salt: Option<String>,
}

impl AuthCallbackResponse {
    /// Build the session principal from this payload.
    pub fn auth_user(&self, provider: AuthProvider) -> AuthUser {
        AuthUser {
            address: self.address.clone(),
            provider,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default = "default_true")]
    valid: bool,
}

fn default_true() -> bool {
    true
}

impl ApiClient {
    /// Start an OAuth login flow; returns the provider URL to visit.
    pub async fn initiate_login(&self, provider: AuthProvider) -> Result<LoginInit> {
        let url = self.endpoint(&format!("/auth/login/{}", provider.as_str()), false);
        let request = self.http_get(&url);
        self.send_enveloped(request).await
    }

    /// Complete authentication with the provider callback parameters.
    ///
    /// Backend rejections come back as [`Error::CallbackFailed`] so the
    /// caller can distinguish them from transport noise.
    pub async fn complete_authentication(
        &self,
        callback: &AuthCallbackRequest,
    ) -> Result<AuthCallbackResponse> {
        let url = self.endpoint("/auth/callback", false);
        let request = self.http_post(&url).json(callback);

        let response: AuthCallbackResponse =
            self.send_enveloped(request).await.map_err(|e| match e {
                Error::Backend(msg) => Error::CallbackFailed(msg),
                Error::HttpStatus { status, message } => {
                    Error::CallbackFailed(format!("status {}: {}", status, message))
                }
                other => other,
            })?;

        tracing::info!(provider = callback.provider.as_str(), "Completed authentication");
        Ok(response)
    }

    /// Check whether the current bearer token is still accepted.
    ///
    /// A 401/403 becomes [`Error::SessionExpired`]; the caller is
    /// expected to log the session out in response.
    pub async fn verify_token(&self) -> Result<bool> {
        if !self.has_token() {
            return Err(Error::AuthenticationRequired);
        }

        let url = self.endpoint("/auth/verify", false);
        let request = self.authorize(self.http_get(&url));

        match self.send_enveloped::<VerifyResponse>(request).await {
            Ok(v) => Ok(v.valid),
            Err(Error::HttpStatus { status, message }) if status == 401 || status == 403 => {
                Err(Error::SessionExpired(message))
            }
            Err(other) => Err(other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
