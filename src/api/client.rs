//! Core HTTP client: connection pool, URL building, bearer injection,
//! and response-envelope decoding.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::SessionStore;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Where the client gets its bearer token from.
///
/// The token is looked up per request, not captured at construction, so
/// a login that happens after the client is built is picked up without
/// rebuilding anything.
pub trait TokenSource: Send + Sync {
    /// The current bearer token, if one exists.
    fn token(&self) -> Option<String>;
}

impl TokenSource for SessionStore {
    fn token(&self) -> Option<String> {
        SessionStore::token(self)
    }
}

/// A token source that never produces a token, for unauthenticated
/// clients (share-link validation, test mode).
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Standard response envelope: `{success, data?, message?}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// HTTP client for the VaultShare backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    test_mode: bool,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Build a client from configuration and a token source.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            test_mode: config.test_mode,
            tokens,
        })
    }

    /// Whether this client is running against `-test` endpoints.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Whether a bearer token is currently available.
    pub fn has_token(&self) -> bool {
        self.tokens.token().is_some()
    }

    /// Absolute URL for a path. `suffixable` paths get `-test` appended
    /// in test mode.
    pub(crate) fn endpoint(&self, path: &str, suffixable: bool) -> String {
        if self.test_mode && suffixable {
            format!("{}{}-test", self.base_url, path)
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Attach the bearer header when a token is available.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fail locally when a privileged call has no token.
    ///
    /// Test mode skips the gate; the `-test` endpoints do not check auth
    /// server-side either. Failing here avoids a wasted round trip.
    pub(crate) fn require_auth(&self) -> Result<()> {
        if self.test_mode || self.has_token() {
            Ok(())
        } else {
            Err(Error::AuthenticationRequired)
        }
    }

    // Request-builder shims so the per-domain impl blocks don't reach
    // into the reqwest client field directly.
    pub(crate) fn http_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url)
    }

    pub(crate) fn http_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.post(url)
    }

    pub(crate) fn http_put(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.put(url)
    }

    pub(crate) fn http_delete(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.delete(url)
    }

    /// Send a request and decode the standard envelope into `T`.
    pub(crate) async fn send_enveloped<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let (status, body) = self.send_raw(request).await?;
        decode_envelope(status, &body)
    }

    /// Send a request and check only the envelope's success flag.
    ///
    /// For endpoints whose 2xx response is just an acknowledgment; the
    /// `data` field is optional in the envelope convention and absent
    /// here more often than not.
    pub(crate) async fn send_ack(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let (status, body) = self.send_raw(request).await?;
        decode_ack(status, &body)
    }

    async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<(u16, String)> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read response body: {}", e)))?;
        Ok((status, body))
    }
}

/// Parse a response as `{success, data?, message?}`.
///
/// Non-2xx is a failure regardless of body shape; the envelope message
/// is carried into the error when the body has one. A 2xx with
/// `success: false` is a backend failure.
fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<ApiEnvelope<T>> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(Error::HttpStatus { status, message });
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("Unexpected response shape: {}", e)))?;

    if !envelope.success {
        return Err(Error::Backend(
            envelope
                .message
                .unwrap_or_else(|| "Backend reported failure without a message".to_string()),
        ));
    }

    Ok(envelope)
}

/// Decode a response whose payload is required.
pub(crate) fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    parse_envelope(status, body)?
        .data
        .ok_or_else(|| Error::MalformedResponse("Envelope succeeded but carried no data".into()))
}

/// Decode an acknowledgment-only response. `data` may be absent.
pub(crate) fn decode_ack(status: u16, body: &str) -> Result<()> {
    parse_envelope::<serde_json::Value>(status, body).map(|_| ())
}

// ============================================================================
// TESTS
// ============================================================================
