//! Session cookie encryption
//!
//! The session cookie carries the issued JWT encrypted with AES-256-GCM so
//! that the raw token never reaches browser storage. The encrypted format is
//! a 12 byte nonce followed by the ciphertext and tag, URL-safe base64
//! encoded without padding.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid cookie: {0}")]
    InvalidData(String),
}

pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Derives the 256-bit key from an arbitrary-length secret
    pub fn new(secret: &str) -> Self {
        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Self {
            cipher: Aes256Gcm::new(&key.into()),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SessionError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| SessionError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    pub fn decrypt(&self, value: &str) -> Result<String, SessionError> {
        let combined = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| SessionError::InvalidData(e.to_string()))?;

        if combined.len() <= NONCE_LEN {
            return Err(SessionError::InvalidData("cookie too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| SessionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| SessionError::DecryptionFailed(format!("Invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = SessionCipher::new("cookie-secret");
        let sealed = cipher.encrypt("header.payload.signature").unwrap();
        assert_ne!(sealed, "header.payload.signature");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "header.payload.signature");
    }

    #[test]
    fn test_nonce_differs_per_encryption() {
        let cipher = SessionCipher::new("cookie-secret");
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_other_secret_cannot_decrypt() {
        let sealed = SessionCipher::new("one").encrypt("token").unwrap();
        let err = SessionCipher::new("two").decrypt(&sealed).unwrap_err();
        assert!(matches!(err, SessionError::DecryptionFailed(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let cipher = SessionCipher::new("cookie-secret");
        assert!(matches!(
            cipher.decrypt("!!not base64!!"),
            Err(SessionError::InvalidData(_))
        ));
        assert!(matches!(
            cipher.decrypt("AAAA"),
            Err(SessionError::InvalidData(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_any_flipped_byte_is_rejected(token in "[A-Za-z0-9._-]{1,64}", index in any::<usize>()) {
            let cipher = SessionCipher::new("cookie-secret");
            let sealed = cipher.encrypt(&token).unwrap();
            prop_assert_eq!(cipher.decrypt(&sealed).unwrap(), token);

            let mut raw = URL_SAFE_NO_PAD.decode(&sealed).unwrap();
            let i = index % raw.len();
            raw[i] ^= 0x01;
            prop_assert!(cipher.decrypt(&URL_SAFE_NO_PAD.encode(raw)).is_err());
        }
    }
}
