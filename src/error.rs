//! # Error Handling
//!
//! Crate-wide error types for VaultShare Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Auth Errors                                                       │
//! │  │   ├── AuthenticationRequired - No bearer token for a gated call     │
//! │  │   ├── SessionExpired         - Token rejected by the backend        │
//! │  │   └── CallbackFailed         - OAuth callback completion failed     │
//! │  │                                                                      │
//! │  ├── Validation Errors                                                 │
//! │  │   ├── InvalidRule            - Access rule failed structural checks │
//! │  │   ├── InvalidEmail           - Malformed email address              │
//! │  │   ├── InvalidAddress         - Malformed chain address              │
//! │  │   └── InvalidName            - Malformed SuiNS name                 │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── EncryptionFailed       - Sealing an envelope failed           │
//! │  │   ├── DecryptionFailed       - Wrong key or tampered ciphertext     │
//! │  │   ├── InvalidKey             - Bad key format/length                │
//! │  │   └── KeyDerivationFailed    - HKDF expansion failed                │
//! │  │                                                                      │
//! │  ├── Api Errors                                                        │
//! │  │   ├── HttpStatus             - Non-2xx response                     │
//! │  │   ├── Request                - Transport-level failure              │
//! │  │   ├── Backend                - Envelope with success=false          │
//! │  │   └── MalformedResponse      - Body didn't match the expected shape │
//! │  │                                                                      │
//! │  └── Upload Errors                                                     │
//! │      ├── UploadTimeout          - Per-file timeout elapsed             │
//! │      └── UploadCancelled        - Batch cancelled by the caller        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend reports failures as `{success:false, message}` envelopes; at
//! the API seam they become `Result<T, Error>` and stay that way. Failures
//! are data, nothing below the seam panics, and callers match on categories
//! via [`Error::code`].

use thiserror::Error;

/// Result type alias for VaultShare Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for VaultShare Core
///
/// All errors are categorized by module/domain to make error handling
/// clearer and to provide meaningful error messages to users.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Auth Errors (100-199)
    // ========================================================================
    /// A privileged call was attempted without a bearer token
    #[error("Authentication required. Sign in before performing this operation.")]
    AuthenticationRequired,

    /// The backend rejected the current token
    #[error("Session expired or token rejected: {0}")]
    SessionExpired(String),

    /// OAuth callback completion failed
    #[error("Authentication callback failed: {0}")]
    CallbackFailed(String),

    /// No user profile is loaded in the session store
    #[error("No user session loaded.")]
    NoSession,

    // ========================================================================
    // Validation Errors (200-299)
    // ========================================================================
    /// An access rule failed structural validation
    #[error("Invalid access rule: {0}")]
    InvalidRule(String),

    /// Malformed email address
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Malformed chain address
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Malformed SuiNS name
    #[error("Invalid SuiNS name: {0}")]
    InvalidName(String),

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Api Errors (400-499)
    // ========================================================================
    /// The backend returned a non-2xx status
    #[error("Request failed with status {status}: {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Body text or envelope message, if any
        message: String,
    },

    /// Transport-level failure (connect, TLS, body read)
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend answered 2xx but the envelope said `success: false`
    #[error("Backend error: {0}")]
    Backend(String),

    /// The response body didn't match the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ========================================================================
    // Upload Errors (500-599)
    // ========================================================================
    /// A single file's upload exceeded the configured timeout
    #[error("Upload timed out after {0} ms")]
    UploadTimeout(u64),

    /// The batch was cancelled before this file completed
    #[error("Upload cancelled")]
    UploadCancelled,

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================
    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the numeric error code for this error.
    ///
    /// Error codes are organized by category:
    /// - 100-199: Auth
    /// - 200-299: Validation
    /// - 300-399: Crypto
    /// - 400-499: Api
    /// - 500-599: Upload
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Auth (100-199)
            Error::AuthenticationRequired => 100,
            Error::SessionExpired(_) => 101,
            Error::CallbackFailed(_) => 102,
            Error::NoSession => 103,

            // Validation (200-299)
            Error::InvalidRule(_) => 200,
            Error::InvalidEmail(_) => 201,
            Error::InvalidAddress(_) => 202,
            Error::InvalidName(_) => 203,

            // Crypto (300-399)
            Error::EncryptionFailed(_) => 300,
            Error::DecryptionFailed(_) => 301,
            Error::InvalidKey(_) => 302,
            Error::KeyDerivationFailed(_) => 303,

            // Api (400-499)
            Error::HttpStatus { .. } => 400,
            Error::Request(_) => 401,
            Error::Backend(_) => 402,
            Error::MalformedResponse(_) => 403,

            // Upload (500-599)
            Error::UploadTimeout(_) => 500,
            Error::UploadCancelled => 501,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 902,
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors can potentially be resolved by retrying
    /// or by user action. There is no automatic retry anywhere in the
    /// pipeline; this is advisory for callers.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Request(_)
                | Error::HttpStatus { .. }
                | Error::UploadTimeout(_)
                | Error::SessionExpired(_)
        )
    }

    /// Check if this error requires user action before a retry can succeed.
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationRequired
                | Error::NoSession
                | Error::InvalidRule(_)
                | Error::InvalidEmail(_)
                | Error::InvalidAddress(_)
                | Error::InvalidName(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Error::HttpStatus {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Error::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
