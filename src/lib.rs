//! # VaultShare Core
//!
//! Client library for encrypted file sharing over the VaultShare
//! backend: select file → encrypt → upload → record keys → share →
//! validate link → download → classify for rendering.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       VAULTSHARE CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │   Upload    │  │   Access    │  │   Viewer    │  │     Auth     │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Batches   │  │ - Rules     │  │ - Links     │  │ - Principal  │   │
//! │  │ - Workers   │  │ - Validate  │  │ - Download  │  │ - Session    │   │
//! │  │ - Fallback  │  │ - Bulk CSV  │  │ - Classify  │  │ - Tiers      │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │   Crypto    │  │   Config    │ │ │              Api                ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - X25519    │  │ - Base URL  │◄┘ │ - reqwest client               ││
//! │  │ - AES-GCM   │  │ - Test mode │   │ - envelope decoding            ││
//! │  │ - Envelopes │  │ - Providers │   │ - bearer injection             ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Client configuration (constructed and passed explicitly)
//! - [`crypto`] - Envelope encryption (per-file keys, sealing, providers)
//! - [`auth`] - Session principal and tiered session store
//! - [`api`] - Typed wrappers over the backend REST surface
//! - [`access`] - Sharing-rule validation and bulk recipient import
//! - [`upload`] - Batch upload orchestration with bounded concurrency
//! - [`viewer`] - Share-link resolution and render classification
//! - [`time`] - Timestamp helpers
//!
//! ## Key Custody
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           KEY CUSTODY                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Every file gets a fresh X25519 key pair at encryption time. The        │
//! │  sealed envelope (ephemeral public key, nonce, ciphertext) is what      │
//! │  the backend stores. The file's SECRET key never leaves the client:     │
//! │  it is attached to the upload result locally, and the backend has       │
//! │  no way to recover plaintext.                                           │
//! │                                                                         │
//! │  Consequence: a shared-file viewer that did not encrypt the file        │
//! │  cannot decrypt it either. The viewer returns raw envelope bytes        │
//! │  and leaves key exchange to the file owner, out of band.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no global instances: construct a [`VaultShareClient`] (or
//! the individual pieces) with an explicit [`ClientConfig`] and share it
//! as needed. Isolated clients can coexist in one process.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
/// Timestamp helpers.
pub mod time;
pub mod upload;
pub mod viewer;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{ClientConfig, CryptoBackend};
pub use crypto::{CryptoProvider, FileKeyPair};
pub use error::{Error, Result};

use std::sync::Arc;

use api::{ApiClient, AuthCallbackRequest};
use auth::{AuthUser, SessionStore, SigningMaterial};
use upload::Uploader;
use viewer::SharedFileViewer;

// ============================================================================
// CLIENT FACADE
// ============================================================================

/// One coherent client: configuration, session state, API access, and
/// factories for the upload and viewing pipelines.
///
/// Explicitly constructed; two instances with different configurations
/// are fully independent.
pub struct VaultShareClient {
    config: ClientConfig,
    session: Arc<SessionStore>,
    api: Arc<ApiClient>,
}

impl VaultShareClient {
    /// Build a client stack from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let session = Arc::new(SessionStore::new());
        let api = Arc::new(ApiClient::new(&config, session.clone())?);
        Ok(Self {
            config,
            session,
            api,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session store.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The API client.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Whether a full session (token and profile) is loaded.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// A fresh upload orchestrator using this client's configuration.
    pub fn uploader(&self) -> Uploader {
        Uploader::new(&self.config, self.api.clone())
    }

    /// A shared-file viewer over this client.
    pub fn viewer(&self) -> SharedFileViewer {
        SharedFileViewer::new(self.api.clone())
    }

    /// Complete an OAuth callback and load the session.
    ///
    /// On success the bearer token, the profile, and fresh signing
    /// material are stored. On failure nothing is stored and the error
    /// propagates so the caller can surface it.
    pub async fn complete_login(&self, callback: &AuthCallbackRequest) -> Result<AuthUser> {
        let response = self.api.complete_authentication(callback).await?;
        let user = response.auth_user(callback.provider);

        self.session.set_token(&response.token);
        self.session.set_user(&user)?;
        self.session.set_signing_material(&SigningMaterial::generate(
            response.proof.unwrap_or_default(),
            response.jwt.unwrap_or_default(),
            response.salt.unwrap_or_default(),
        ))?;

        tracing::info!(address = %user.address, "Session established");
        Ok(user)
    }

    /// Verify the stored token with the backend.
    ///
    /// A rejected token logs the session out before the error
    /// propagates; a stale half-session is worse than none.
    pub async fn verify_session(&self) -> Result<bool> {
        match self.api.verify_token().await {
            Ok(valid) => {
                if !valid {
                    self.session.logout();
                }
                Ok(valid)
            }
            Err(Error::SessionExpired(msg)) => {
                self.session.logout();
                Err(Error::SessionExpired(msg))
            }
            Err(other) => Err(other),
        }
    }

    /// Log out locally.
    pub fn logout(&self) {
        self.session.logout();
        tracing::info!("Session cleared");
    }
}

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthProvider;

    fn client() -> VaultShareClient {
        VaultShareClient::new(
            ClientConfig::new("https://api.example.com")
                .with_crypto_backend(CryptoBackend::Passthrough),
        )
        .unwrap()
    }

    #[test]
    fn test_clients_are_independent() {
        let a = client();
        let b = client();

        a.session().set_token("tok-a");
        assert!(b.session().token().is_none());
    }

    #[test]
    fn test_session_lifecycle() {
        let c = client();
        assert!(!c.is_authenticated());

        c.session().set_token("tok");
        c.session()
            .set_user(&AuthUser {
                address: "0xabc".into(),
                provider: AuthProvider::Google,
                email: None,
                name: None,
            })
            .unwrap();
        assert!(c.is_authenticated());

        c.logout();
        assert!(!c.is_authenticated());
    }

    #[test]
    fn test_factories_share_configuration() {
        let c = client();
        let _uploader = c.uploader();
        let _viewer = c.viewer();
        assert_eq!(c.config().base_url, "https://api.example.com");
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
