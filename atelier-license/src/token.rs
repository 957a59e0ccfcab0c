//! License token codec: decryption, payload parsing, and signature
//! verification, plus the issuance-side encoder.
//!
//! A token is `base64( IV ‖ AES-256-CBC(payload JSON) )`. The payload:
//!
//! ```json
//! {"sid": "HW-1A2B3C4D5E6F", "expiry": 1767225600, "sig": "dGhpcyBpcyBh"}
//! ```
//!
//! `sig` is the first 12 characters of `base64(sha256(sid ‖ expiry ‖
//! secret))`, computed over the decimal unix-seconds expiry. The cipher
//! key is derived from the same embedded secret, so everything needed to
//! forge a token ships inside the binary; the scheme is an obfuscation
//! barrier against casual tampering, not cryptographic proof of issuance.

use atelier_crypto::{decrypt, encrypt, CipherKey, EncryptedBlob};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LicenseError, LicenseResult};

/// Embedded shared secret. Compiled into the binary by design; rotating it
/// invalidates every previously issued token.
const SHARED_SECRET: &str = "ATELIER_V4_SECURE_2026";

/// Characters of the Base64 digest kept as the signature.
const SIGNATURE_LEN: usize = 12;

/// Shortest plausible token: one IV plus one cipher block in Base64.
/// Anything shorter is rejected before touching the cipher.
pub const MIN_TOKEN_LEN: usize = 44;

/// The decrypted, normalized license payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensePayload {
    /// Fingerprint of the machine the token was issued for.
    pub bound_fingerprint: String,
    /// Expiry instant.
    pub expiry: DateTime<Utc>,
    /// Signature field as carried in the token.
    pub signature: String,
}

/// Wire form of the payload inside the encrypted blob.
#[derive(Debug, Serialize, Deserialize)]
struct WirePayload {
    sid: String,
    expiry: i64,
    sig: String,
}

fn cipher_key() -> CipherKey {
    CipherKey::derive(SHARED_SECRET)
}

fn compute_signature(fingerprint: &str, expiry_secs: i64) -> String {
    let digest = Sha256::digest(format!("{fingerprint}{expiry_secs}{SHARED_SECRET}").as_bytes());
    let mut encoded = BASE64.encode(digest);
    encoded.truncate(SIGNATURE_LEN);
    encoded
}

/// Decrypts and parses a license token.
///
/// # Errors
///
/// Every failure mode (bad Base64, truncated blob, padding failure,
/// non-UTF-8 plaintext, unparsable JSON, out-of-range expiry) maps to
/// [`LicenseError::Malformed`]. Decode failures are always recoverable;
/// the caller degrades to an unlicensed state.
pub fn decode(token: &str) -> LicenseResult<LicensePayload> {
    let token = token.trim();
    if token.len() < MIN_TOKEN_LEN {
        return Err(LicenseError::Malformed("token too short".to_string()));
    }

    let blob = EncryptedBlob::from_base64(token)
        .map_err(|_| LicenseError::Malformed("token is not a valid blob".to_string()))?;
    let plaintext = decrypt(&cipher_key(), &blob)
        .map_err(|_| LicenseError::Malformed("token does not decrypt".to_string()))?;
    let json = String::from_utf8(plaintext)
        .map_err(|_| LicenseError::Malformed("payload is not UTF-8".to_string()))?;
    let wire: WirePayload = serde_json::from_str(&json)
        .map_err(|_| LicenseError::Malformed("payload is not a license record".to_string()))?;
    let expiry = DateTime::from_timestamp(wire.expiry, 0)
        .ok_or_else(|| LicenseError::Malformed("expiry out of range".to_string()))?;

    Ok(LicensePayload {
        bound_fingerprint: wire.sid,
        expiry,
        signature: wire.sig,
    })
}

/// Verifies a decoded payload against the current machine.
///
/// The binding check runs first: a token for another machine is rejected
/// as such even if its signature is also wrong.
///
/// # Errors
///
/// [`LicenseError::BindingMismatch`] if the payload was issued for a
/// different fingerprint, [`LicenseError::SignatureMismatch`] if the
/// signature does not match the signed fields.
pub fn verify(payload: &LicensePayload, fingerprint: &str) -> LicenseResult<()> {
    if payload.bound_fingerprint != fingerprint {
        return Err(LicenseError::BindingMismatch);
    }

    let expected = compute_signature(&payload.bound_fingerprint, payload.expiry.timestamp());
    if payload.signature != expected {
        return Err(LicenseError::SignatureMismatch);
    }

    Ok(())
}

/// Builds a token for a fingerprint and expiry: the issuance side.
///
/// Issuance is an out-of-band operator step: a customer reports their
/// fingerprint, the operator encodes a token against it and hands the
/// string back. Each call draws a fresh IV, so two tokens for the same
/// inputs differ as strings but decode to the same payload.
#[must_use]
pub fn encode(fingerprint: &str, expiry: DateTime<Utc>) -> String {
    let expiry_secs = expiry.timestamp();
    let wire = WirePayload {
        sid: fingerprint.to_string(),
        expiry: expiry_secs,
        sig: compute_signature(fingerprint, expiry_secs),
    };
    let json = serde_json::to_string(&wire).expect("license payload serializes");
    encrypt(&cipher_key(), json.as_bytes()).to_base64()
}
