//! # Cryptography Module
//!
//! Client-side envelope encryption for files.
//!
//! ## Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    FILE ENVELOPE ENCRYPTION                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Per-file key pair (X25519, generated fresh for every upload)          │
//! │                                                                         │
//! │  Sealing:                                                              │
//! │  1. Generate ephemeral X25519 key pair                                 │
//! │  2. ECDH: ephemeral_secret × file_public → shared secret               │
//! │  3. HKDF-SHA256(ikm = shared, salt = ephemeral_public,                 │
//! │     info = "vaultshare-file-envelope-v1") → 256-bit key                │
//! │  4. AES-256-GCM(key, random 96-bit nonce, plaintext,                   │
//! │     aad = filename) → ciphertext + tag                                 │
//! │                                                                         │
//! │  Opening:                                                              │
//! │  1. ECDH: file_secret × ephemeral_public → same shared secret          │
//! │  2. Same HKDF derivation                                               │
//! │  3. AES-GCM decrypt; a wrong secret key or tampered ciphertext         │
//! │     fails the authentication tag                                       │
//! │                                                                         │
//! │  The file secret key never leaves the client. The backend stores       │
//! │  only the sealed envelope.                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | X25519 | Key exchange | Fast ECDH, small keys, widely audited |
//! | AES-256-GCM | Encryption | Hardware acceleration, AEAD |
//! | HKDF-SHA256 | Key derivation | Industry standard, well-analyzed |
//!
//! The AAD binds the ciphertext to the filename, so a sealed envelope
//! cannot be silently re-labelled as a different file.

mod envelope;
mod keys;
mod provider;

pub use envelope::{
    open_with_key, seal_for_key, EncryptionKey, FileEnvelope, Nonce, ENVELOPE_ALGORITHM,
    NONCE_SIZE, PASSTHROUGH_ALGORITHM,
};
pub use keys::FileKeyPair;
pub use provider::{
    provider_for, CryptoProvider, EncryptedFile, EncryptionMetadata, EnvelopeCrypto,
    PassthroughCrypto,
};

/// Size of encryption keys in bytes (256 bits)
pub const KEY_SIZE: usize = 32;
