//! # Per-File Key Pairs
//!
//! Every uploaded file gets a fresh X25519 key pair. The public key seals
//! the envelope; the secret key is handed back to the caller, who is the
//! only custodian — it is attached to the upload result client-side and
//! never sent to the backend.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

/// X25519 key pair generated per file.
///
/// ## Security
///
/// - The secret key is zeroized when this struct is dropped
/// - The hex-encoded secret obtained via [`FileKeyPair::secret_hex`] is the
///   caller's responsibility; never log or transmit it
#[derive(ZeroizeOnDrop)]
pub struct FileKeyPair {
    /// Private key (secret)
    #[zeroize(skip)] // x25519_dalek handles its own zeroization
    secret: StaticSecret,
    /// Public key (derived from secret)
    public: X25519PublicKey,
}

impl FileKeyPair {
    /// Generate a new random key pair.
    ///
    /// Uses the operating system's secure random number generator.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a key pair from a hex-encoded secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = decode_key_hex(secret_hex)?;
        let secret = StaticSecret::from(bytes);
        let public = X25519PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Get the public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Get the public key as a hex string (safe to share and store).
    pub fn public_hex(&self) -> String {
        hex::encode(self.public.to_bytes())
    }

    /// Get the secret key as a hex string.
    ///
    /// ## Security Warning
    ///
    /// Only use this to hand the key to the uploader's local record.
    /// Never log or transmit these bytes.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.to_bytes())
    }

    /// Perform Diffie-Hellman key exchange against another public key.
    pub fn diffie_hellman(&self, their_public: &[u8; 32]) -> [u8; 32] {
        let their_public = X25519PublicKey::from(*their_public);
        self.secret.diffie_hellman(&their_public).to_bytes()
    }
}

/// Decode a hex string into a 32-byte key, with length checking.
pub(crate) fn decode_key_hex(hex_str: &str) -> Result<[u8; 32]> {
    if hex_str.len() != 64 {
        return Err(Error::InvalidKey(
            "Key hex must be 64 characters (32 bytes)".into(),
        ));
    }
    let bytes =
        hex::decode(hex_str).map_err(|e| Error::InvalidKey(format!("Invalid hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| Error::InvalidKey("Invalid key length".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp1 = FileKeyPair::generate();
        let kp2 = FileKeyPair::generate();

        // Keys should be different
        assert_ne!(kp1.public_bytes(), kp2.public_bytes());
        assert_ne!(kp1.secret_hex(), kp2.secret_hex());
    }

    #[test]
    fn test_keypair_from_secret_hex() {
        let kp = FileKeyPair::generate();
        let restored = FileKeyPair::from_secret_hex(&kp.secret_hex()).unwrap();

        // Same secret should produce same public key
        assert_eq!(kp.public_bytes(), restored.public_bytes());
    }

    #[test]
    fn test_diffie_hellman() {
        let alice = FileKeyPair::generate();
        let bob = FileKeyPair::generate();

        // Both parties should derive the same shared secret
        let alice_shared = alice.diffie_hellman(&bob.public_bytes());
        let bob_shared = bob.diffie_hellman(&alice.public_bytes());

        assert_eq!(alice_shared, bob_shared);
    }

    #[test]
    fn test_decode_key_hex_rejects_bad_input() {
        assert!(decode_key_hex("deadbeef").is_err());
        assert!(decode_key_hex(&"zz".repeat(32)).is_err());
        assert!(decode_key_hex(&"ab".repeat(32)).is_ok());
    }
}
