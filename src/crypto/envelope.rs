//! # File Envelopes
//!
//! The serialized envelope format plus the AES-256-GCM seal/open
//! primitives. An envelope is what actually gets uploaded when
//! encryption is on: a JSON document carrying the algorithm tag, the
//! ephemeral public key, the nonce, and the ciphertext.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as AesNonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::crypto::keys::{decode_key_hex, FileKeyPair};
use crate::error::{Error, Result};
use crate::time::now_timestamp_millis;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Envelope format version
pub const ENVELOPE_VERSION: u32 = 1;

/// Algorithm tag for real envelope encryption
pub const ENVELOPE_ALGORITHM: &str = "x25519-hkdf-sha256+aes-256-gcm";

/// Algorithm tag for the passthrough (no-op) provider
pub const PASSTHROUGH_ALGORITHM: &str = "none";

/// HKDF info string, versioned so a future scheme change re-keys cleanly
const HKDF_INFO: &[u8] = b"vaultshare-file-envelope-v1";

/// A nonce (number used once) for AES-GCM encryption
///
/// ## Critical Security Requirement
///
/// **NEVER reuse a nonce with the same key!**
///
/// We use random nonces, which are safe for up to 2^32 messages
/// per key (birthday bound for 96-bit nonces). Here every file gets
/// a fresh key anyway, so each key sees exactly one nonce.
#[derive(Clone, Copy, Debug)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An AES-256-GCM encryption key, zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the file encryption key from an ECDH shared secret.
    ///
    /// Uses HKDF-SHA256 with the ephemeral public key as salt.
    pub fn derive(shared_secret: &[u8; 32], ephemeral_public: &[u8; 32]) -> Result<Self> {
        use hkdf::Hkdf;
        use sha2::Sha256;

        let hkdf = Hkdf::<Sha256>::new(Some(ephemeral_public), shared_secret);
        let mut key = [0u8; 32];
        hkdf.expand(HKDF_INFO, &mut key)
            .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;

        Ok(Self(key))
    }
}

/// Encrypt with AES-256-GCM.
///
/// Returns (nonce, ciphertext_with_tag).
pub(crate) fn encrypt(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random();
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let payload = Payload {
        msg: plaintext,
        aad,
    };

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok((nonce, ciphertext))
}

/// Decrypt with AES-256-GCM.
///
/// ## Errors
///
/// Returns `DecryptionFailed` if the ciphertext was tampered with, the
/// AAD doesn't match, or the key is wrong.
pub(crate) fn decrypt(
    key: &EncryptionKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|_| {
            Error::DecryptionFailed("Decryption failed: authentication tag mismatch".into())
        })
}

// ============================================================================
// ENVELOPE FORMAT
// ============================================================================

/// The serialized envelope that replaces the raw file bytes on upload.
///
/// Stored and transferred as JSON. `ciphertext_b64` is the AES-GCM output
/// (ciphertext + tag) for the real provider, or the base64 of the
/// unmodified plaintext for the passthrough provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEnvelope {
    /// Envelope format version.
    pub version: u32,
    /// Algorithm tag (`x25519-hkdf-sha256+aes-256-gcm` or `none`).
    pub algorithm: String,
    /// Hex-encoded ephemeral X25519 public key. Empty for passthrough.
    pub ephemeral_public: String,
    /// Hex-encoded 96-bit nonce. Empty for passthrough.
    pub nonce: String,
    /// Original filename; bound into the AAD for the real provider.
    pub filename: String,
    /// Original plaintext size in bytes.
    pub original_size: u64,
    /// Unix timestamp (ms) when the envelope was sealed.
    pub created_at: i64,
    /// Base64-encoded payload.
    pub ciphertext_b64: String,
}

impl FileEnvelope {
    /// Serialize to the bytes that get uploaded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse an envelope from downloaded bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| Error::DecryptionFailed(format!("Not a valid envelope: {}", e)))
    }

    /// Whether the payload is actually encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.algorithm != PASSTHROUGH_ALGORITHM
    }
}

// ============================================================================
// SEAL / OPEN
// ============================================================================

/// Seal plaintext for a file public key.
///
/// Generates an ephemeral X25519 key pair, derives the AES key from the
/// ECDH shared secret, and binds the filename as AAD.
pub fn seal_for_key(
    file_public: &[u8; 32],
    filename: &str,
    plaintext: &[u8],
) -> Result<FileEnvelope> {
    let ephemeral = FileKeyPair::generate();
    let shared = ephemeral.diffie_hellman(file_public);
    let key = EncryptionKey::derive(&shared, &ephemeral.public_bytes())?;

    let (nonce, ciphertext) = encrypt(&key, plaintext, filename.as_bytes())?;

    Ok(FileEnvelope {
        version: ENVELOPE_VERSION,
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        ephemeral_public: ephemeral.public_hex(),
        nonce: hex::encode(nonce.as_bytes()),
        filename: filename.to_string(),
        original_size: plaintext.len() as u64,
        created_at: now_timestamp_millis(),
        ciphertext_b64: BASE64.encode(&ciphertext),
    })
}

/// Open an envelope with the file's hex-encoded secret key.
///
/// ## Errors
///
/// Returns `DecryptionFailed` if the secret key doesn't match the key
/// the envelope was sealed for, or if the ciphertext was tampered with.
pub fn open_with_key(envelope: &FileEnvelope, secret_hex: &str) -> Result<Vec<u8>> {
    if envelope.algorithm != ENVELOPE_ALGORITHM {
        return Err(Error::DecryptionFailed(format!(
            "Unsupported envelope algorithm: {}",
            envelope.algorithm
        )));
    }

    let keypair = FileKeyPair::from_secret_hex(secret_hex)?;
    let ephemeral_public = decode_key_hex(&envelope.ephemeral_public)?;
    let shared = keypair.diffie_hellman(&ephemeral_public);
    let key = EncryptionKey::derive(&shared, &ephemeral_public)?;

    let nonce_bytes: [u8; NONCE_SIZE] = hex::decode(&envelope.nonce)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid nonce hex: {}", e)))?
        .try_into()
        .map_err(|_| Error::DecryptionFailed("Invalid nonce length".into()))?;

    let ciphertext = BASE64
        .decode(&envelope.ciphertext_b64)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid base64 payload: {}", e)))?;

    decrypt(
        &key,
        &Nonce::from_bytes(nonce_bytes),
        &ciphertext,
        envelope.filename.as_bytes(),
    )
}

// ============================================================================
// TESTS
// ============================================================================
