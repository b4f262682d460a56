//! # Session Principal & Storage
//!
//! The authenticated user and the tiered session store.
//!
//! ## Storage Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SESSION STORAGE TIERS                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Durable tier                      Session tier                        │
//! │  ────────────                      ────────────                         │
//! │  • bearer token                    • ephemeral signing key pair        │
//! │  • user profile                    • login proof                       │
//! │    (address, provider,             • JWT                               │
//! │     email, name)                   • user salt                         │
//! │                                                                         │
//! │  Survives logout? no               Cleared on logout and whenever      │
//! │  Survives restart? yes*            the session ends. Values are        │
//! │                                    zeroized on drop.                   │
//! │                                                                         │
//! │  * when backed by a persistent store; the in-memory backend used       │
//! │    here keeps both tiers for the process lifetime only                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tier for each key is declared once, in the store, not decided at
//! call sites. `is_authenticated()` requires both a bearer token and a
//! loaded user profile simultaneously.

mod session;

pub use session::{SessionStore, Sensitivity};

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// OAuth provider used to establish the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Google OAuth
    Google,
    /// Facebook OAuth
    Facebook,
    /// Twitch OAuth
    Twitch,
}

impl AuthProvider {
    /// Path segment used by the login-init endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Facebook => "facebook",
            AuthProvider::Twitch => "twitch",
        }
    }
}

/// The authenticated user's non-sensitive profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    /// Wallet address derived from the login flow.
    pub address: String,
    /// Which OAuth provider established the session.
    pub provider: AuthProvider,
    /// Email, when the provider shares it.
    pub email: Option<String>,
    /// Display name, when the provider shares it.
    pub name: Option<String>,
}

/// Sensitive transaction-signing material for the current session.
///
/// Lives exclusively in the session tier of [`SessionStore`]; zeroized
/// on drop and cleared on logout.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SigningMaterial {
    /// Hex-encoded Ed25519 ephemeral secret key.
    pub ephemeral_secret_hex: String,
    /// Login proof blob from the callback.
    pub proof: String,
    /// The provider JWT.
    pub jwt: String,
    /// The user salt tied to this identity.
    pub salt: String,
}

impl SigningMaterial {
    /// Create signing material with a freshly generated ephemeral key pair.
    pub fn generate(proof: String, jwt: String, salt: String) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        Self {
            ephemeral_secret_hex: hex::encode(key.to_bytes()),
            proof,
            jwt,
            salt,
        }
    }

    /// Reconstruct the ephemeral signing key.
    pub fn ephemeral_key(&self) -> Result<SigningKey> {
        let bytes: [u8; 32] = hex::decode(&self.ephemeral_secret_hex)
            .map_err(|e| Error::InvalidKey(format!("Invalid ephemeral key hex: {}", e)))?
            .try_into()
            .map_err(|_| Error::InvalidKey("Ephemeral key must be 32 bytes".into()))?;
        Ok(SigningKey::from_bytes(&bytes))
    }
}

impl std::fmt::Debug for SigningMaterial {
    // Never print key material, even in debug logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("ephemeral_secret_hex", &"<redacted>")
            .field("proof", &"<redacted>")
            .field("jwt", &"<redacted>")
            .field("salt", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
