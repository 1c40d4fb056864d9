//! Passphrase-based encryption for note payloads.
//!
//! Wire format: `salt (16 bytes) || nonce (16 bytes) || ciphertext`. Salt and
//! nonce are freshly random on every call, so encrypting the same payload
//! twice never yields the same bytes. Keys are derived per blob with
//! PBKDF2-HMAC-SHA256 over the passphrase and salt; the cipher is
//! AES-256-GCM, so decrypting with the wrong passphrase fails authentication
//! instead of returning garbage.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{Error, Result};

/// Length of the random salt prefix.
pub const SALT_LEN: usize = 16;
/// Length of the random nonce following the salt.
pub const NONCE_LEN: usize = 16;
/// Minimum size of a well-formed blob: header plus the GCM tag.
pub const MIN_BLOB_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const PBKDF2_ROUNDS: u32 = 100_000;

// AES-256-GCM parameterized for the 16-byte nonce the envelope carries.
type PayloadCipher = AesGcm<Aes256, U16>;

/// Derive a 256-bit key from a passphrase and salt.
///
/// Deterministic for a fixed `(passphrase, salt)` pair; distinct salts yield
/// distinct keys.
#[must_use]
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ROUNDS, key.as_mut());
    key
}

/// Encrypt `data` under `passphrase` with a fresh salt and nonce.
pub fn encrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if passphrase.is_empty() {
        return Err(Error::Crypto(
            "encryption passphrase must not be empty".to_string(),
        ));
    }

    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt);
    let cipher = PayloadCipher::new_from_slice(key.as_ref())
        .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::<U16>::from_slice(&nonce), data)
        .map_err(|_| Error::Crypto("encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails with [`Error::Crypto`] when the blob is truncated, tampered with,
/// or was encrypted under a different passphrase.
pub fn decrypt(blob: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(Error::Crypto(format!(
            "encrypted payload too short: {} bytes",
            blob.len()
        )));
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(passphrase, salt);
    let cipher = PayloadCipher::new_from_slice(key.as_ref())
        .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Crypto("wrong passphrase or corrupted payload".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_recovers_plaintext() {
        let data = b"The quick brown fox";
        let blob = encrypt(data, "hunter2").unwrap();
        let plain = decrypt(&blob, "hunter2").unwrap();
        assert_eq!(plain, data);
    }

    #[test]
    fn roundtrip_handles_empty_and_binary_payloads() {
        for payload in [&b""[..], &[0u8, 255, 127, 1, 2, 3][..]] {
            let blob = encrypt(payload, "pass").unwrap();
            assert_eq!(decrypt(&blob, "pass").unwrap(), payload);
        }
    }

    #[test]
    fn ciphertext_is_longer_than_and_differs_from_plaintext() {
        let data = b"some note body";
        let blob = encrypt(data, "pass").unwrap();
        assert!(blob.len() > data.len());
        assert_ne!(&blob[..], &data[..]);
        assert!(blob.len() >= MIN_BLOB_LEN);
    }

    #[test]
    fn same_input_encrypts_differently_each_call() {
        let data = b"identical plaintext";
        let first = encrypt(data, "pass").unwrap();
        let second = encrypt(data, "pass").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let blob = encrypt(b"secret", "correct horse").unwrap();
        let error = decrypt(&blob, "battery staple").unwrap_err();
        assert!(matches!(error, Error::Crypto(_)));
    }

    #[test]
    fn tampered_blob_fails_authentication() {
        let mut blob = encrypt(b"secret", "pass").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(decrypt(&blob, "pass").is_err());
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let blob = encrypt(b"secret", "pass").unwrap();
        let error = decrypt(&blob[..MIN_BLOB_LEN - 1], "pass").unwrap_err();
        assert!(matches!(error, Error::Crypto(_)));
    }

    #[test]
    fn empty_passphrase_is_rejected() {
        assert!(encrypt(b"data", "").is_err());
    }

    #[test]
    fn derive_key_is_deterministic_per_salt() {
        let salt_a = [1u8; SALT_LEN];
        let salt_b = [2u8; SALT_LEN];

        let first = derive_key("pass", &salt_a);
        let second = derive_key("pass", &salt_a);
        assert_eq!(first.as_ref(), second.as_ref());

        let other_salt = derive_key("pass", &salt_b);
        assert_ne!(first.as_ref(), other_salt.as_ref());

        let other_pass = derive_key("other", &salt_a);
        assert_ne!(first.as_ref(), other_pass.as_ref());
    }
}
