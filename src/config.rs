//! # Client Configuration
//!
//! Configuration for constructing the VaultShare client stack.
//!
//! Base URL, test-mode flag, upload limits, and the crypto provider
//! choice are all carried here and passed explicitly at construction.
//! There are no process-wide singletons, so isolated clients can run
//! side by side in one process.

/// Which crypto provider the client should construct.
///
/// Selected by configuration at startup, never by catching a load
/// failure at runtime. Callers can always ask the active provider
/// whether it really encrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CryptoBackend {
    /// Real envelope encryption (X25519 + HKDF-SHA256 + AES-256-GCM).
    #[default]
    Envelope,
    /// Explicit no-op provider for demos and tests. Wraps the plaintext
    /// in the envelope format without transforming it.
    Passthrough,
}

/// Configuration for the VaultShare client stack.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API, without a trailing slash.
    pub base_url: String,
    /// Test mode swaps in `-test` suffixed endpoints that skip
    /// authentication on the backend side.
    pub test_mode: bool,
    /// Maximum number of files uploaded concurrently in a batch.
    pub upload_concurrency: usize,
    /// Per-file upload timeout in milliseconds (encrypt + transfer).
    pub upload_timeout_ms: u64,
    /// Which crypto provider to construct.
    pub crypto_backend: CryptoBackend,
}

impl ClientConfig {
    /// Create a configuration pointing at the given backend.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_trailing_slash(base_url.into()),
            ..Self::default()
        }
    }

    /// Enable test mode (`-test` endpoints, no auth gate).
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Set the upload worker pool width. Clamped to at least 1.
    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency.max(1);
        self
    }

    /// Set the per-file upload timeout in milliseconds.
    pub fn with_upload_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.upload_timeout_ms = timeout_ms;
        self
    }

    /// Select the crypto backend.
    pub fn with_crypto_backend(mut self, backend: CryptoBackend) -> Self {
        self.crypto_backend = backend;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            test_mode: false,
            upload_concurrency: 3,
            upload_timeout_ms: 120_000,
            crypto_backend: CryptoBackend::Envelope,
        }
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

// ============================================================================
// TESTS
// ============================================================================
