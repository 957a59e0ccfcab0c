//! Shared test helpers for license tests.

#![allow(dead_code)]

use atelier_license::{
    encode, FingerprintEngine, LicenseValidator, ManualClock, MemoryTrustStore, StoreError,
    TrustState, TrustStore, ValidatorConfig,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// A fingerprint that never matches the machine running the tests.
pub const FOREIGN_FINGERPRINT: &str = "HW-0123456789AB";

/// A fixed instant all clock-driven tests start from.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A validator over an in-memory store and a manual clock frozen at
/// `start`. Returns the clock handle so the test can move time.
pub fn validator_at(
    start: DateTime<Utc>,
) -> (LicenseValidator<MemoryTrustStore, ManualClock>, ManualClock) {
    validator_with_store_at(MemoryTrustStore::new(), start)
}

/// Same, but over a pre-populated store.
pub fn validator_with_store_at(
    store: MemoryTrustStore,
    start: DateTime<Utc>,
) -> (LicenseValidator<MemoryTrustStore, ManualClock>, ManualClock) {
    let clock = ManualClock::new(start);
    let validator = LicenseValidator::with_clock(
        store,
        FingerprintEngine::new(),
        clock.clone(),
        ValidatorConfig::default(),
    );
    (validator, clock)
}

/// A token bound to the validator's own machine.
pub fn own_token(
    validator: &LicenseValidator<MemoryTrustStore, ManualClock>,
    expiry: DateTime<Utc>,
) -> String {
    encode(validator.fingerprint(), expiry)
}

/// An activated trust record bound to an arbitrary fingerprint, for
/// seeding stores directly.
pub fn activated_state(fingerprint: &str, expiry: DateTime<Utc>, checked: DateTime<Utc>) -> TrustState {
    TrustState {
        is_activated: true,
        stored_token: Some(encode(fingerprint, expiry)),
        expiry: Some(expiry),
        bound_fingerprint: Some(fingerprint.to_string()),
        activation_id: Some(uuid::Uuid::new_v4()),
        activated_at: Some(checked - Duration::hours(1)),
        last_checked_at: Some(checked),
    }
}

/// A store whose every operation fails, for infrastructure-error paths.
#[derive(Debug, Default)]
pub struct FailingStore;

impl TrustStore for FailingStore {
    fn load(&self) -> Result<TrustState, StoreError> {
        Err(StoreError::Io(std::io::Error::other("medium unavailable")))
    }

    fn save(&mut self, _state: &TrustState) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("medium unavailable")))
    }
}
