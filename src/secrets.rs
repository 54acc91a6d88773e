//! Decryption capability for integration secrets

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use thiserror::Error;

const NONCE_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Key must be 32 bytes (256 bits) long")]
    InvalidKeyLength,

    #[error("Ciphertext is too short to contain a nonce")]
    CiphertextTooShort,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

/// Turns a stored ciphertext back into the secret it protects
pub trait SecretCipher: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<String, SecretError>;
}

/// AES-256-GCM over hex text: `hex(nonce[12] || ciphertext)`
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn from_hex_key(key_hex: &str) -> Result<Self, SecretError> {
        let key_bytes = hex::decode(key_hex.trim())?;
        let cipher =
            Aes256Gcm::new_from_slice(&key_bytes).map_err(|_| SecretError::InvalidKeyLength)?;
        Ok(Self { cipher })
    }
}

impl SecretCipher for AesGcmCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String, SecretError> {
        let encrypted = hex::decode(ciphertext)?;
        if encrypted.len() < NONCE_SIZE {
            return Err(SecretError::CiphertextTooShort);
        }

        let (nonce_bytes, body) = encrypted.split_at(NONCE_SIZE);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| SecretError::DecryptionFailed)?;

        String::from_utf8(plain).map_err(|_| SecretError::InvalidUtf8)
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmCipher(..)")
    }
}
