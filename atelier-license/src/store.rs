//! The persisted trust record and its storage boundary.
//!
//! Exactly one [`TrustState`] exists per installation. It is read and
//! written as a whole; the validator owns all mutations. Deleting the
//! record (a full data wipe) is the only way it disappears, and the store
//! treats that the same as a first run.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the persistence boundary.
///
/// These are infrastructure failures, deliberately separate from the
/// license error taxonomy: an unreadable disk is not a license verdict.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the record failed.
    #[error("trust state I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The stored record is not readable as a trust state.
    #[error("trust state record is unreadable: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The single persisted activation record.
///
/// Invariant: `is_activated` implies `stored_token`, `expiry` and
/// `bound_fingerprint` are all present, and `last_checked_at` never moves
/// backwards across successful checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustState {
    /// Whether the installation is currently activated.
    pub is_activated: bool,
    /// The last successfully activated token, kept verbatim.
    pub stored_token: Option<String>,
    /// Expiry cached from the token payload at activation.
    pub expiry: Option<DateTime<Utc>>,
    /// Fingerprint cached at activation; compared on every check.
    pub bound_fingerprint: Option<String>,
    /// Identifier stamped on the most recent activation.
    pub activation_id: Option<Uuid>,
    /// When the most recent activation happened.
    pub activated_at: Option<DateTime<Utc>>,
    /// Instant of the most recent successful check.
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl TrustState {
    /// The first-run record: nothing activated, nothing cached.
    #[must_use]
    pub fn unactivated() -> Self {
        Self {
            is_activated: false,
            stored_token: None,
            expiry: None,
            bound_fingerprint: None,
            activation_id: None,
            activated_at: None,
            last_checked_at: None,
        }
    }
}

impl Default for TrustState {
    fn default() -> Self {
        Self::unactivated()
    }
}

/// Storage boundary for the trust record.
///
/// Implementations persist the record however they like but must read and
/// write it atomically as a whole; the validator serializes access and
/// assumes no partial updates.
pub trait TrustStore: Send {
    /// Loads the record, or the first-run default if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures (unreadable
    /// medium, corrupt record); an absent record is not an error.
    fn load(&self) -> Result<TrustState, StoreError>;

    /// Persists the record, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&mut self, state: &TrustState) -> Result<(), StoreError>;
}

/// Trust record stored as a JSON file.
#[derive(Debug)]
pub struct FileTrustStore {
    path: PathBuf,
}

impl FileTrustStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the platform's per-user data directory
    /// (`<data_dir>/atelier/trust.json`), or `None` if the platform
    /// exposes no such directory.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("atelier").join("trust.json")))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrustStore for FileTrustStore {
    fn load(&self) -> Result<TrustState, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(TrustState::unactivated()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, state: &TrustState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash mid-write never leaves a torn record.
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory trust store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    state: TrustState,
}

impl MemoryTrustStore {
    /// Creates an empty (unactivated) store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for MemoryTrustStore {
    fn load(&self) -> Result<TrustState, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &TrustState) -> Result<(), StoreError> {
        self.state = state.clone();
        Ok(())
    }
}
