//! Licensing and activation for Atelier.
//!
//! This crate binds an Atelier installation to a specific machine, checks
//! time-limited license tokens, and maintains the small persisted trust
//! record that activation decisions are replayed against:
//! - Hardware fingerprinting for device binding
//! - License token decryption and signature verification
//! - Activation / periodic re-check state machine
//! - Clock-rollback and hardware-change detection
//!
//! # Design Principles
//!
//! - **Offline-first**: tokens are issued out-of-band against a reported
//!   fingerprint; validation never touches the network
//! - **Device binding**: a token is only valid on the machine whose
//!   fingerprint it embeds
//! - **Recoverable failures**: every validation failure is a value the
//!   application can show or ignore; only storage trouble is an error
//! - **Casual-tamper resistance**: the token secret ships inside the
//!   binary, so the scheme deters key sharing and clock games, not a
//!   determined reverse-engineer
//!
//! # Token Format
//!
//! A token is `base64(IV ‖ AES-256-CBC(payload))` where the payload is a
//! JSON object `{"sid", "expiry", "sig"}`: the bound fingerprint, a unix
//! expiry timestamp, and a truncated digest signature over both.

mod clock;
mod device;
mod error;
mod store;
mod token;
mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use device::{FingerprintEngine, HardwareFingerprint};
pub use error::{LicenseError, LicenseResult};
pub use store::{FileTrustStore, MemoryTrustStore, StoreError, TrustState, TrustStore};
pub use token::{decode, encode, verify, LicensePayload, MIN_TOKEN_LEN};
pub use validator::{
    ActivationReceipt, CheckOutcome, LicenseState, LicenseValidator, ValidatorConfig,
};
