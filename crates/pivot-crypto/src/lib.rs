//! Secret codec for per-user integration credentials
//!
//! Per-source secrets are held at rest only in sealed form. The codec
//! derives a single AES-256-GCM key from the configured master secret via
//! HKDF-SHA256 and seals each value with a fresh random nonce; the sealed
//! encoding is `base64(nonce || ciphertext)`. Opening happens exactly at the
//! point a source driver needs the secret, and the plaintext is handed back
//! zeroizing so it never outlives the call.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Domain separation for key derivation; changing either invalidates every
/// sealed secret.
const HKDF_SALT: &[u8] = b"pivot user secrets";
const HKDF_INFO: &[u8] = b"secret-codec v1";

const NONCE_LEN: usize = 12;

/// Errors from sealing or opening a secret
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Cipher construction or encryption failed
    #[error("seal failed: {0}")]
    Seal(String),

    /// Input is not a sealed secret under this key (tampered, truncated, or
    /// sealed under a different master secret)
    #[error("open failed: {0}")]
    Open(String),
}

/// Result alias over [`CryptoError`]
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Symmetric codec over secrets, keyed from the configured master secret
#[derive(ZeroizeOnDrop)]
pub struct SecretCodec {
    key: [u8; 32],
}

impl SecretCodec {
    /// Derive the sealing key from the master secret
    pub fn new(master_secret: &str) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), master_secret.as_bytes());
        let mut key = [0u8; 32];
        // Expand cannot fail for a 32-byte output with SHA-256
        if hk.expand(HKDF_INFO, &mut key).is_err() {
            unreachable!("hkdf expand of 32 bytes");
        }
        SecretCodec { key }
    }

    /// Seal a plaintext secret for storage
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CryptoError::Seal(format!("cipher construction: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Seal(format!("encryption: {e}")))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Open a sealed secret. The plaintext is zeroized when dropped.
    pub fn open(&self, sealed: &str) -> Result<Zeroizing<String>> {
        let raw = BASE64
            .decode(sealed)
            .map_err(|e| CryptoError::Open(format!("base64: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(CryptoError::Open("sealed value too short".into()));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| CryptoError::Open(format!("cipher construction: {e}")))?;

        let nonce_bytes: [u8; NONCE_LEN] = raw[..NONCE_LEN]
            .try_into()
            .map_err(|_| CryptoError::Open("invalid nonce".into()))?;
        let nonce = Nonce::from(nonce_bytes);

        let mut plaintext = cipher
            .decrypt(&nonce, &raw[NONCE_LEN..])
            .map_err(|e| CryptoError::Open(format!("decryption: {e}")))?;

        let text = String::from_utf8(plaintext.clone())
            .map_err(|_| CryptoError::Open("plaintext is not utf-8".into()))?;
        plaintext.zeroize();
        Ok(Zeroizing::new(text))
    }
}
