//! # Session Store
//!
//! A single storage abstraction with field-level sensitivity: each key is
//! declared `Durable` or `Session` once, here, and the store routes values
//! to the right tier. Call sites never pick a tier themselves.
//!
//! The backend here is in-memory (two maps behind locks). A persistent
//! implementation would keep the durable tier on disk and the session tier
//! in memory only; the routing logic would not change.

use parking_lot::RwLock;
use std::collections::HashMap;
use zeroize::Zeroizing;

use crate::auth::{AuthUser, SigningMaterial};
use crate::error::{Error, Result};

/// Storage tier for a session-store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Kept across sessions (token, profile).
    Durable,
    /// Cleared on logout / session end; zeroized on read.
    Session,
}

/// Key names for the session store.
pub mod keys {
    /// The bearer token for API calls.
    pub const AUTH_TOKEN: &str = "vaultshare.auth.token";

    /// The user's non-sensitive profile.
    pub const USER_PROFILE: &str = "vaultshare.auth.user";

    /// Sensitive transaction-signing material.
    pub const SIGNING_MATERIAL: &str = "vaultshare.auth.signing";
}

/// Declared sensitivity per key. Unknown keys default to `Session`:
/// accidentally storing something sensitive durably is the failure mode
/// worth defending against, not the reverse.
fn sensitivity_of(key: &str) -> Sensitivity {
    match key {
        keys::AUTH_TOKEN | keys::USER_PROFILE => Sensitivity::Durable,
        _ => Sensitivity::Session,
    }
}

/// Session state store with tiered persistence.
pub struct SessionStore {
    durable: RwLock<HashMap<String, Vec<u8>>>,
    session: RwLock<HashMap<String, Vec<u8>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            durable: RwLock::new(HashMap::new()),
            session: RwLock::new(HashMap::new()),
        }
    }

    /// Store a value; the tier is decided by the key's declared sensitivity.
    pub fn store(&self, key: &str, value: &[u8]) {
        let map = match sensitivity_of(key) {
            Sensitivity::Durable => &self.durable,
            Sensitivity::Session => &self.session,
        };
        map.write().insert(key.to_string(), value.to_vec());
    }

    /// Retrieve a value. Session-tier values come back zeroizing.
    pub fn retrieve(&self, key: &str) -> Option<Zeroizing<Vec<u8>>> {
        let map = match sensitivity_of(key) {
            Sensitivity::Durable => &self.durable,
            Sensitivity::Session => &self.session,
        };
        map.read().get(key).cloned().map(Zeroizing::new)
    }

    /// Delete a value. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let map = match sensitivity_of(key) {
            Sensitivity::Durable => &self.durable,
            Sensitivity::Session => &self.session,
        };
        map.write().remove(key).is_some()
    }

    /// Drop everything in the session tier (tab-close analog).
    pub fn clear_session_tier(&self) {
        self.session.write().clear();
    }

    // ========================================================================
    // TYPED ACCESSORS
    // ========================================================================

    /// Store the bearer token.
    pub fn set_token(&self, token: &str) {
        self.store(keys::AUTH_TOKEN, token.as_bytes());
    }

    /// Get the bearer token, if present.
    pub fn token(&self) -> Option<String> {
        self.retrieve(keys::AUTH_TOKEN)
            .and_then(|b| String::from_utf8(b.to_vec()).ok())
    }

    /// Store the user profile.
    pub fn set_user(&self, user: &AuthUser) -> Result<()> {
        let bytes = serde_json::to_vec(user)?;
        self.store(keys::USER_PROFILE, &bytes);
        Ok(())
    }

    /// Get the user profile, if present.
    pub fn user(&self) -> Option<AuthUser> {
        self.retrieve(keys::USER_PROFILE)
            .and_then(|b| serde_json::from_slice(&b).ok())
    }

    /// Store the sensitive signing material (session tier).
    pub fn set_signing_material(&self, material: &SigningMaterial) -> Result<()> {
        let bytes = serde_json::to_vec(material)?;
        self.store(keys::SIGNING_MATERIAL, &bytes);
        Ok(())
    }

    /// Get the signing material, if the session still holds it.
    pub fn signing_material(&self) -> Result<Option<SigningMaterial>> {
        match self.retrieve(keys::SIGNING_MATERIAL) {
            Some(bytes) => {
                let material = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::SerializationError(e.to_string()))?;
                Ok(Some(material))
            }
            None => Ok(None),
        }
    }

    /// Whether a call can be made as an authenticated user.
    ///
    /// Requires both a bearer token and a loaded profile; either alone
    /// is a half-open session and counts as unauthenticated.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.user().is_some()
    }

    /// Log out: drop the token, the profile, and the whole session tier.
    pub fn logout(&self) {
        self.delete(keys::AUTH_TOKEN);
        self.delete(keys::USER_PROFILE);
        self.clear_session_tier();
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
