//! The activation/validation state machine.
//!
//! Orchestrates the codec, the fingerprint engine, and the trust store.
//! Full cryptographic verification of a token happens exactly once, in
//! [`LicenseValidator::activate`]; every later [`LicenseValidator::check`]
//! replays the decision against the cached record. Re-verifying the stored
//! token on each check would not change the threat model (the secret
//! ships in the binary), so the cached fields are authoritative.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::device::FingerprintEngine;
use crate::error::{LicenseError, LicenseResult};
use crate::store::{StoreError, TrustState, TrustStore};
use crate::token;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where an installation stands after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    /// Never activated, or activation was cleared.
    Unactivated,
    /// Activated and within the validity window.
    Active,
    /// Validity window has passed; a new token is required.
    Expired,
    /// Tampering detected (clock rollback or hardware mismatch); a fresh
    /// activation is required to recover.
    Revoked,
}

/// Result of a [`LicenseValidator::check`].
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// The state the installation is in after this check.
    pub state: LicenseState,
    /// Human-readable reason when the check failed. The application shows
    /// this in logs or support tooling, not to end users.
    pub reason: Option<String>,
}

impl CheckOutcome {
    /// True only for [`LicenseState::Active`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state == LicenseState::Active
    }

    fn valid() -> Self {
        Self {
            state: LicenseState::Active,
            reason: None,
        }
    }

    fn invalid(state: LicenseState, reason: &LicenseError) -> Self {
        Self {
            state,
            reason: Some(reason.to_string()),
        }
    }
}

/// Confirmation returned by a successful activation.
#[derive(Debug, Clone)]
pub struct ActivationReceipt {
    /// Identifier stamped on this activation.
    pub activation_id: Uuid,
    /// When the license expires.
    pub expiry: DateTime<Utc>,
    /// Human-readable confirmation including the formatted expiry date.
    pub message: String,
}

/// Tunables for the validator.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Allowed backward clock drift before a check counts as rollback.
    /// Absorbs NTP jitter; one minute by default.
    pub rollback_tolerance: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            rollback_tolerance: Duration::minutes(1),
        }
    }
}

/// Decides activation validity against the persisted trust record.
///
/// `activate` and `check` are short, CPU-bound operations; the store is
/// the one shared mutable resource, so both run under a single guard to
/// keep concurrent callers from losing updates.
pub struct LicenseValidator<S: TrustStore, C: Clock = SystemClock> {
    store: Mutex<S>,
    fingerprints: FingerprintEngine,
    clock: C,
    config: ValidatorConfig,
}

impl<S: TrustStore> LicenseValidator<S, SystemClock> {
    /// Creates a validator on the system clock with default config.
    pub fn new(store: S, fingerprints: FingerprintEngine) -> Self {
        Self::with_clock(store, fingerprints, SystemClock, ValidatorConfig::default())
    }
}

impl<S: TrustStore, C: Clock> LicenseValidator<S, C> {
    /// Creates a validator with an explicit clock and config.
    pub fn with_clock(store: S, fingerprints: FingerprintEngine, clock: C, config: ValidatorConfig) -> Self {
        Self {
            store: Mutex::new(store),
            fingerprints,
            clock,
            config,
        }
    }

    /// The host fingerprint, for reporting to the issuing side.
    pub fn fingerprint(&self) -> &str {
        self.fingerprints.fingerprint().as_str()
    }

    /// Activates the installation with a pasted token.
    ///
    /// Verifies the token cryptographically, binds it to this machine's
    /// fingerprint, and persists the new trust record. Nothing is
    /// persisted on any failure.
    ///
    /// # Errors
    ///
    /// [`LicenseError::Malformed`], [`LicenseError::BindingMismatch`] or
    /// [`LicenseError::SignatureMismatch`] for a bad token,
    /// [`LicenseError::Expired`] for a token already past its expiry, and
    /// [`LicenseError::Storage`] if the record cannot be written.
    pub fn activate(&self, raw_token: &str) -> LicenseResult<ActivationReceipt> {
        let token = raw_token.trim();
        let payload = token::decode(token)?;
        let fingerprint = self.fingerprint().to_string();
        token::verify(&payload, &fingerprint)?;

        let now = self.clock.now();
        if payload.expiry < now {
            return Err(LicenseError::Expired(
                payload.expiry.format(DATE_FORMAT).to_string(),
            ));
        }

        let activation_id = Uuid::new_v4();
        let state = TrustState {
            is_activated: true,
            stored_token: Some(token.to_string()),
            expiry: Some(payload.expiry),
            bound_fingerprint: Some(fingerprint),
            activation_id: Some(activation_id),
            activated_at: Some(now),
            last_checked_at: Some(now),
        };
        self.lock_store().save(&state)?;

        info!(%activation_id, expiry = %payload.expiry, "license activated");
        Ok(ActivationReceipt {
            activation_id,
            expiry: payload.expiry,
            message: format!(
                "Activation successful. License valid until {}.",
                payload.expiry.format(DATE_FORMAT)
            ),
        })
    }

    /// Re-validates the persisted activation.
    ///
    /// Runs on every application start and periodically afterwards. Order
    /// matters: rollback detection first (it invalidates every other
    /// timestamp comparison), then the hardware binding, then expiry.
    /// Failed checks deactivate the record before reporting.
    ///
    /// # Errors
    ///
    /// Only [`StoreError`]: license failures are states in the returned
    /// [`CheckOutcome`], not errors.
    pub fn check(&self) -> Result<CheckOutcome, StoreError> {
        let mut store = self.lock_store();
        let mut state = store.load()?;

        if !state.is_activated || state.stored_token.is_none() {
            return Ok(CheckOutcome::invalid(
                LicenseState::Unactivated,
                &LicenseError::NotActivated,
            ));
        }

        let now = self.clock.now();

        if let Some(last_checked) = state.last_checked_at {
            if now < last_checked - self.config.rollback_tolerance {
                warn!(%last_checked, %now, "clock rollback detected, revoking activation");
                state.is_activated = false;
                store.save(&state)?;
                return Ok(CheckOutcome::invalid(
                    LicenseState::Revoked,
                    &LicenseError::ClockRollback,
                ));
            }
        }

        let current = self.fingerprints.fingerprint().as_str();
        if state.bound_fingerprint.as_deref() != Some(current) {
            warn!("hardware fingerprint mismatch, revoking activation");
            state.is_activated = false;
            store.save(&state)?;
            return Ok(CheckOutcome::invalid(
                LicenseState::Revoked,
                &LicenseError::BindingMismatch,
            ));
        }

        let Some(expiry) = state.expiry else {
            // An activated record never lacks an expiry unless it was
            // edited by hand; treat that as tampering.
            warn!("activated trust state has no expiry, revoking activation");
            state.is_activated = false;
            store.save(&state)?;
            return Ok(CheckOutcome::invalid(
                LicenseState::Revoked,
                &LicenseError::Malformed("trust state has no expiry".to_string()),
            ));
        };

        if now > expiry {
            state.is_activated = false;
            store.save(&state)?;
            return Ok(CheckOutcome::invalid(
                LicenseState::Expired,
                &LicenseError::Expired(expiry.format(DATE_FORMAT).to_string()),
            ));
        }

        // Clamp so a within-tolerance backward drift never moves the
        // watermark backwards.
        state.last_checked_at = Some(match state.last_checked_at {
            Some(prev) => now.max(prev),
            None => now,
        });
        store.save(&state)?;
        Ok(CheckOutcome::valid())
    }

    /// Returns a copy of the persisted record, for display surfaces
    /// (activation date, cached expiry) and diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    pub fn trust_state(&self) -> Result<TrustState, StoreError> {
        self.lock_store().load()
    }

    /// Humanized remaining validity: "N days", "N hours", "N minutes", or
    /// "expired". `None` if no expiry has ever been cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    pub fn remaining_validity(&self) -> Result<Option<String>, StoreError> {
        let state = self.lock_store().load()?;
        let Some(expiry) = state.expiry else {
            return Ok(None);
        };
        Ok(Some(format_remaining(expiry - self.clock.now())))
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, S> {
        // Saves replace the record wholesale, so state behind a poisoned
        // lock is still coherent.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn format_remaining(remaining: Duration) -> String {
    if remaining.num_seconds() <= 0 {
        "expired".to_string()
    } else if remaining.num_days() >= 1 {
        format!("{} days", remaining.num_days())
    } else if remaining.num_hours() >= 1 {
        format!("{} hours", remaining.num_hours())
    } else {
        format!("{} minutes", remaining.num_minutes())
    }
}
