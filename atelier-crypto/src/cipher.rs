//! Token blob encryption using AES-256-CBC with PKCS7 padding.
//!
//! Every blob carries its own random IV as the first [`IV_SIZE`] bytes of
//! the wire encoding. CBC is unauthenticated: a padding failure on decrypt
//! signals corruption, but a clean unpad does not prove integrity. Callers
//! that need tamper evidence must verify the decrypted contents themselves.

use crate::error::{CryptoError, CryptoResult};
use crate::key::CipherKey;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the initialization vector in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Encrypted data with the metadata needed for decryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// The IV used for encryption (unique per blob).
    pub iv: [u8; IV_SIZE],
    /// The CBC ciphertext (whole blocks, PKCS7-padded).
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Returns the total wire size of the blob.
    pub fn len(&self) -> usize {
        IV_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes to Base64 as `IV ‖ ciphertext` for storage/transmission.
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        BASE64.encode(&bytes)
    }

    /// Decodes from Base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid Base64, is too short to
    /// hold an IV and one block, or the ciphertext is not block-aligned.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;

        if bytes.len() < IV_SIZE + BLOCK_SIZE {
            return Err(CryptoError::Decryption("data too short".to_string()));
        }
        if (bytes.len() - IV_SIZE) % BLOCK_SIZE != 0 {
            return Err(CryptoError::Decryption(
                "ciphertext is not block-aligned".to_string(),
            ));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[..IV_SIZE]);
        let ciphertext = bytes[IV_SIZE..].to_vec();

        Ok(Self { iv, ciphertext })
    }
}

/// Encrypts plaintext under a fresh random IV.
///
/// PKCS7 padding always adds at least one byte, so the ciphertext is never
/// empty (an empty plaintext encrypts to one full block).
pub fn encrypt(key: &CipherKey, plaintext: &[u8]) -> EncryptedBlob {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    EncryptedBlob { iv, ciphertext }
}

/// Decrypts a blob.
///
/// # Errors
///
/// Returns an error if the ciphertext is malformed or the padding does not
/// verify after decryption. A wrong key usually (but not always) fails the
/// padding check; callers must not treat a clean unpad as proof of
/// authenticity.
pub fn decrypt(key: &CipherKey, blob: &EncryptedBlob) -> CryptoResult<Vec<u8>> {
    if blob.ciphertext.is_empty() || blob.ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption(
            "ciphertext is not block-aligned".to_string(),
        ));
    }

    Aes256CbcDec::new(key.as_bytes().into(), (&blob.iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&blob.ciphertext)
        .map_err(|_| CryptoError::Decryption("bad padding (wrong key or tampered data)".to_string()))
}

/// Encrypts a string and returns the Base64-encoded blob.
pub fn encrypt_string(key: &CipherKey, plaintext: &str) -> String {
    encrypt(key, plaintext.as_bytes()).to_base64()
}

/// Decrypts a Base64-encoded blob into a string.
///
/// # Errors
///
/// Returns an error if the framing, padding, or UTF-8 decoding fails.
pub fn decrypt_string(key: &CipherKey, encoded: &str) -> CryptoResult<String> {
    let blob = EncryptedBlob::from_base64(encoded)?;
    let plaintext = decrypt(key, &blob)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}
