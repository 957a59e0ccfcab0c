//! Error types for the licensing module.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// Licensing-specific errors.
///
/// Everything except [`LicenseError::Storage`] is recoverable by design:
/// the application maps these to an unlicensed UI state rather than
/// treating them as faults.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Token could not be decoded or parsed.
    #[error("malformed license token: {0}")]
    Malformed(String),

    /// Token signature does not match the signed fields.
    #[error("license token signature invalid")]
    SignatureMismatch,

    /// Token was issued for a different machine.
    #[error("license token was issued for a different machine")]
    BindingMismatch,

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// The system clock was moved backwards past the tolerance window.
    #[error("system clock rollback detected")]
    ClockRollback,

    /// License not activated.
    #[error("license not activated")]
    NotActivated,

    /// Trust state persistence failed. Unlike the variants above this is
    /// an infrastructure fault, not a license verdict.
    #[error("trust state storage failed: {0}")]
    Storage(#[from] StoreError),
}
