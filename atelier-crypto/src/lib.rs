//! Token encryption for Atelier.
//!
//! Implements the symmetric layer of the license token format:
//! AES-256-CBC with PKCS7 padding, a fresh random IV per blob, and a
//! Base64 wire framing of `IV ‖ ciphertext`.
//!
//! The encryption key is derived by hashing an embedded secret string
//! (see [`CipherKey::derive`]). That secret ships inside the binary, so
//! this layer provides obfuscation against casual tampering, not
//! confidentiality against someone who disassembles the application.
//! CBC carries no authentication tag; tamper detection happens one layer
//! up, where the license payload carries its own signature field.

mod cipher;
mod error;
mod key;

pub use cipher::{decrypt, decrypt_string, encrypt, encrypt_string, EncryptedBlob, BLOCK_SIZE, IV_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{CipherKey, KEY_SIZE};
