//! Compliance transform applied to ingress bodies and published events.
//!
//! AES-256-GCM with a random 12-byte nonce prefixed to the ciphertext, so
//! `reveal` is self-contained. `protect` and `reveal` are symmetric: bytes
//! that were protected with a transform must be revealed with the same one.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32;

/// Envelope configuration. `None` passes bytes through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    #[default]
    None,
    /// AES-256-GCM with a base64-encoded 32-byte key.
    Aes256Gcm { key: String },
}

/// Applies the envelope to outbound bytes.
pub fn protect(cfg: &TransformConfig, plaintext: &[u8]) -> Result<Vec<u8>> {
    match cfg {
        TransformConfig::None => Ok(plaintext.to_vec()),
        TransformConfig::Aes256Gcm { key } => {
            let cipher = cipher(key)?;

            let mut nonce_bytes = [0u8; NONCE_LENGTH];
            OsRng.fill_bytes(&mut nonce_bytes);
            let nonce = Nonce::from_slice(&nonce_bytes);

            let ciphertext = cipher
                .encrypt(nonce, plaintext)
                .map_err(|_| Error::compliance("encryption failed"))?;

            let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
            out.extend_from_slice(&nonce_bytes);
            out.extend_from_slice(&ciphertext);
            Ok(out)
        }
    }
}

/// Removes the envelope from inbound bytes.
pub fn reveal(cfg: &TransformConfig, bytes: &[u8]) -> Result<Vec<u8>> {
    match cfg {
        TransformConfig::None => Ok(bytes.to_vec()),
        TransformConfig::Aes256Gcm { key } => {
            // GCM auth tag is 16 bytes, so anything shorter is truncated.
            if bytes.len() < NONCE_LENGTH + 16 {
                return Err(Error::compliance("ciphertext too short"));
            }
            let cipher = cipher(key)?;
            let nonce = Nonce::from_slice(&bytes[..NONCE_LENGTH]);

            cipher
                .decrypt(nonce, &bytes[NONCE_LENGTH..])
                .map_err(|_| Error::compliance("decryption failed"))
        }
    }
}

fn cipher(key: &str) -> Result<Aes256Gcm> {
    let key_bytes = BASE64_STANDARD
        .decode(key)
        .map_err(|e| Error::compliance(format!("invalid transform key: {e}")))?;
    if key_bytes.len() != KEY_LENGTH {
        return Err(Error::compliance(format!(
            "transform key must be {KEY_LENGTH} bytes, got {}",
            key_bytes.len()
        )));
    }
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes)))
}
