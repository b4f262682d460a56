//! # Crypto Providers
//!
//! The upload pipeline is decoupled from the concrete scheme through the
//! [`CryptoProvider`] trait. Two conformant implementations exist:
//!
//! - [`EnvelopeCrypto`] — real sealed-envelope encryption
//! - [`PassthroughCrypto`] — explicit no-op for demos and tests; wraps
//!   the plaintext in the envelope format without transforming it
//!
//! The provider is chosen by [`crate::config::CryptoBackend`] at
//! construction time. There is no runtime fallback: callers can always
//! ask [`CryptoProvider::is_encrypting`] which one is active.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::config::CryptoBackend;
use crate::crypto::envelope::{
    open_with_key, seal_for_key, FileEnvelope, ENVELOPE_ALGORITHM, ENVELOPE_VERSION,
    PASSTHROUGH_ALGORITHM,
};
use crate::crypto::keys::FileKeyPair;
use crate::error::{Error, Result};
use crate::time::now_timestamp_millis;

/// Metadata recorded alongside an encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionMetadata {
    /// Original plaintext size in bytes.
    pub original_size: u64,
    /// Algorithm tag from the envelope.
    pub algorithm: String,
    /// Unix timestamp (ms) when the file was sealed.
    pub timestamp_ms: i64,
}

/// Result of encrypting one file.
///
/// Ephemeral value owned by the caller: the backend never learns
/// `secret_key`, so the caller must associate it with the eventual
/// file record itself.
pub struct EncryptedFile {
    /// Serialized envelope bytes (the upload payload).
    pub data: Vec<u8>,
    /// Hex-encoded per-file public key.
    pub public_key: String,
    /// Hex-encoded per-file secret key. Sensitive.
    pub secret_key: String,
    /// Seal metadata.
    pub metadata: EncryptionMetadata,
}

/// Client-side file encryption seam.
pub trait CryptoProvider: Send + Sync {
    /// Algorithm tag this provider writes into envelopes.
    fn algorithm(&self) -> &'static str;

    /// Whether this provider actually transforms the payload.
    ///
    /// The uploader uses this to decide whether results may be marked
    /// encrypted; UI layers use it to avoid over-promising.
    fn is_encrypting(&self) -> bool;

    /// Encrypt a file, generating a fresh key pair for it.
    fn encrypt_file(&self, filename: &str, plaintext: &[u8]) -> Result<EncryptedFile>;

    /// Decrypt envelope bytes with the file's hex-encoded secret key.
    fn decrypt_file(&self, data: &[u8], secret_key: &str) -> Result<Vec<u8>>;
}

/// Construct the provider selected by configuration.
pub fn provider_for(backend: CryptoBackend) -> Arc<dyn CryptoProvider> {
    match backend {
        CryptoBackend::Envelope => Arc::new(EnvelopeCrypto),
        CryptoBackend::Passthrough => Arc::new(PassthroughCrypto),
    }
}

// ============================================================================
// REAL PROVIDER
// ============================================================================

/// Sealed-envelope encryption (X25519 + HKDF-SHA256 + AES-256-GCM).
pub struct EnvelopeCrypto;

impl CryptoProvider for EnvelopeCrypto {
    fn algorithm(&self) -> &'static str {
        ENVELOPE_ALGORITHM
    }

    fn is_encrypting(&self) -> bool {
        true
    }

    fn encrypt_file(&self, filename: &str, plaintext: &[u8]) -> Result<EncryptedFile> {
        let keys = FileKeyPair::generate();
        let envelope = seal_for_key(&keys.public_bytes(), filename, plaintext)?;

        Ok(EncryptedFile {
            data: envelope.to_bytes()?,
            public_key: keys.public_hex(),
            secret_key: keys.secret_hex(),
            metadata: EncryptionMetadata {
                original_size: envelope.original_size,
                algorithm: envelope.algorithm.clone(),
                timestamp_ms: envelope.created_at,
            },
        })
    }

    fn decrypt_file(&self, data: &[u8], secret_key: &str) -> Result<Vec<u8>> {
        let envelope = FileEnvelope::from_bytes(data)?;
        open_with_key(&envelope, secret_key)
    }
}

// ============================================================================
// PASSTHROUGH PROVIDER
// ============================================================================

/// No-op provider: same envelope format, payload left untransformed.
///
/// Key pairs are still generated per file so the caller-side bookkeeping
/// is identical to the real provider, but `is_encrypting()` is false and
/// the uploader will not mark results as encrypted.
pub struct PassthroughCrypto;

impl CryptoProvider for PassthroughCrypto {
    fn algorithm(&self) -> &'static str {
        PASSTHROUGH_ALGORITHM
    }

    fn is_encrypting(&self) -> bool {
        false
    }

    fn encrypt_file(&self, filename: &str, plaintext: &[u8]) -> Result<EncryptedFile> {
        let keys = FileKeyPair::generate();
        let envelope = FileEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: PASSTHROUGH_ALGORITHM.to_string(),
            ephemeral_public: String::new(),
            nonce: String::new(),
            filename: filename.to_string(),
            original_size: plaintext.len() as u64,
            created_at: now_timestamp_millis(),
            ciphertext_b64: BASE64.encode(plaintext),
        };

        Ok(EncryptedFile {
            data: envelope.to_bytes()?,
            public_key: keys.public_hex(),
            secret_key: keys.secret_hex(),
            metadata: EncryptionMetadata {
                original_size: envelope.original_size,
                algorithm: envelope.algorithm.clone(),
                timestamp_ms: envelope.created_at,
            },
        })
    }

    // The secret key is accepted but not validated: there is nothing to
    // authenticate it against in a passthrough envelope.
    fn decrypt_file(&self, data: &[u8], _secret_key: &str) -> Result<Vec<u8>> {
        let envelope = FileEnvelope::from_bytes(data)?;
        if envelope.algorithm != PASSTHROUGH_ALGORITHM {
            return Err(Error::DecryptionFailed(format!(
                "Envelope algorithm {} requires the real provider",
                envelope.algorithm
            )));
        }
        BASE64
            .decode(&envelope.ciphertext_b64)
            .map_err(|e| Error::DecryptionFailed(format!("Invalid base64 payload: {}", e)))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_provider_round_trip() {
        let provider = EnvelopeCrypto;
        assert!(provider.is_encrypting());

        let result = provider.encrypt_file("doc.txt", b"hello").unwrap();
        assert_eq!(result.metadata.algorithm, ENVELOPE_ALGORITHM);
        assert_eq!(result.metadata.original_size, 5);

        let plaintext = provider.decrypt_file(&result.data, &result.secret_key).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn test_envelope_provider_wrong_key() {
        let provider = EnvelopeCrypto;
        let a = provider.encrypt_file("a.txt", b"aaa").unwrap();
        let b = provider.encrypt_file("b.txt", b"bbb").unwrap();

        assert!(provider.decrypt_file(&a.data, &b.secret_key).is_err());
    }

    #[test]
    fn test_passthrough_round_trip_empty() {
        let provider = PassthroughCrypto;
        assert!(!provider.is_encrypting());

        let result = provider.encrypt_file("empty.bin", b"").unwrap();
        let plaintext = provider.decrypt_file(&result.data, &result.secret_key).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_passthrough_round_trip_ascii() {
        let provider = PassthroughCrypto;
        let data = b"plain ASCII text";

        let result = provider.encrypt_file("a.txt", data).unwrap();
        let plaintext = provider.decrypt_file(&result.data, "any-key-works").unwrap();
        assert_eq!(plaintext, data);
    }

    #[test]
    fn test_passthrough_round_trip_multibyte_utf8() {
        let provider = PassthroughCrypto;
        // Mix of 2-, 3-, and 4-byte code points
        let data = "Grüße 汉字 𝄞 🎉".as_bytes();

        let result = provider.encrypt_file("utf8.txt", data).unwrap();
        let plaintext = provider.decrypt_file(&result.data, "ignored").unwrap();
        assert_eq!(plaintext, data);
    }

    #[test]
    fn test_passthrough_payload_is_not_transformed() {
        let provider = PassthroughCrypto;
        let result = provider.encrypt_file("a.txt", b"visible").unwrap();

        let envelope = FileEnvelope::from_bytes(&result.data).unwrap();
        assert!(!envelope.is_encrypted());
        assert_eq!(BASE64.decode(&envelope.ciphertext_b64).unwrap(), b"visible");
    }

    #[test]
    fn test_passthrough_rejects_real_envelope() {
        let real = EnvelopeCrypto;
        let fake = PassthroughCrypto;

        let sealed = real.encrypt_file("a.txt", b"secret").unwrap();
        assert!(fake.decrypt_file(&sealed.data, &sealed.secret_key).is_err());
    }

    #[test]
    fn test_provider_for_selection() {
        assert!(provider_for(CryptoBackend::Envelope).is_encrypting());
        assert!(!provider_for(CryptoBackend::Passthrough).is_encrypting());
    }

    #[test]
    fn test_fresh_keypair_per_file() {
        let provider = EnvelopeCrypto;
        let a = provider.encrypt_file("a.txt", b"x").unwrap();
        let b = provider.encrypt_file("a.txt", b"x").unwrap();

        assert_ne!(a.public_key, b.public_key);
        assert_ne!(a.secret_key, b.secret_key);
    }
}
