//! Field-level encryption for client PII.
//!
//! Values are sealed with AES-256-GCM under a fresh random nonce and stored as
//! `enc:v1:<base64(nonce || ciphertext || tag)>`. Strings without the marker are
//! treated as legacy plaintext and passed through unchanged on decryption.

use base64::{engine::general_purpose, Engine as _};
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use thiserror::Error;

/// Marker for encrypted values at rest
pub const ENCRYPTED_MARKER: &str = "enc:v1:";

const KEY_LEN: usize = 32;

/// Error type for secret management operations
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Encryption error: {0}")]
    EncryptionError(String),
    #[error("Decryption error: {0}")]
    DecryptionError(String),
    #[error("Key error: {0}")]
    KeyError(String),
    #[error("Base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

/// AES-256-GCM cipher for personally identifiable fields.
pub struct PiiCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl fmt::Debug for PiiCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PiiCipher(..)")
    }
}

impl PiiCipher {
    /// Builds a cipher from a base64 encoded 32 byte key.
    pub fn from_base64_key(key_b64: &str) -> Result<Self, SecretError> {
        let key_bytes = general_purpose::STANDARD.decode(key_b64.trim())?;
        if key_bytes.len() != KEY_LEN {
            return Err(SecretError::KeyError(format!(
                "Encryption key must be {} bytes, got {} bytes",
                KEY_LEN,
                key_bytes.len()
            )));
        }
        Self::from_key_bytes(&key_bytes)
    }

    fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, SecretError> {
        let unbound = UnboundKey::new(&aead::AES_256_GCM, key_bytes)
            .map_err(|_| SecretError::KeyError("Failed to create encryption key".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypts `plaintext`, returning the marked base64 form.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecretError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SecretError::EncryptionError("Failed to generate nonce".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| SecretError::EncryptionError("Failed to encrypt data".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);

        Ok(format!(
            "{}{}",
            ENCRYPTED_MARKER,
            general_purpose::STANDARD.encode(sealed)
        ))
    }

    /// Decrypts a value produced by [`PiiCipher::encrypt`]. Unmarked values are returned as-is.
    pub fn decrypt(&self, value: &str) -> Result<String, SecretError> {
        let Some(encoded) = value.strip_prefix(ENCRYPTED_MARKER) else {
            return Ok(value.to_string());
        };

        let mut sealed = general_purpose::STANDARD.decode(encoded)?;
        if sealed.len() < NONCE_LEN + aead::AES_256_GCM.tag_len() {
            return Err(SecretError::DecryptionError(
                "Ciphertext is too short".to_string(),
            ));
        }

        let mut ciphertext = sealed.split_off(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(&sealed)
            .map_err(|_| SecretError::DecryptionError("Invalid nonce".to_string()))?;

        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut ciphertext)
            .map_err(|_| SecretError::DecryptionError("Failed to decrypt data".to_string()))?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| {
            SecretError::DecryptionError("Decrypted data is not valid UTF-8".to_string())
        })
    }
}

/// Check if a string is an encrypted value
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_MARKER)
}

/// Generates a fresh random key, base64 encoded.
pub fn generate_key() -> Result<String, SecretError> {
    let rng = SystemRandom::new();
    let mut key = [0u8; KEY_LEN];
    rng.fill(&mut key)
        .map_err(|_| SecretError::KeyError("Failed to generate encryption key".to_string()))?;
    Ok(general_purpose::STANDARD.encode(key))
}
