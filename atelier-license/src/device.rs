//! Hardware fingerprinting for license binding.
//!
//! Derives a stable pseudo-identifier for the host from low-level hardware
//! descriptors. The fingerprint is not secret: it is reported to support
//! staff verbatim so a token can be issued for this machine, and it is
//! embedded inside every token as the binding field.

use std::env;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Recognizable prefix on every fingerprint, for logs and UI.
const FINGERPRINT_PREFIX: &str = "HW-";

/// Number of digest characters kept after the prefix.
const FINGERPRINT_DIGEST_LEN: usize = 12;

/// A stable fingerprint that identifies this machine.
///
/// Format: `HW-` followed by the first 12 hex characters (uppercase) of a
/// SHA-256 digest over the hardware descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareFingerprint(String);

impl HardwareFingerprint {
    /// Returns the fingerprint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HardwareFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Computes and memoizes the host fingerprint.
///
/// Descriptor enumeration can be slow (subprocess calls on some
/// platforms), so the result is cached for the lifetime of the engine.
/// Construct one engine per process and hand it to whoever needs it;
/// there is no ambient singleton.
#[derive(Debug, Default)]
pub struct FingerprintEngine {
    cached: OnceLock<HardwareFingerprint>,
}

impl FingerprintEngine {
    /// Creates an engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cached: OnceLock::new(),
        }
    }

    /// Returns the host fingerprint, computing it on first call.
    ///
    /// Never fails: descriptors that cannot be read contribute nothing,
    /// and if every descriptor is unavailable the fingerprint falls back
    /// to hashing the host and user names. The fallback keeps activation
    /// usable under sandboxes and VMs but is not forgery-resistant.
    pub fn fingerprint(&self) -> &HardwareFingerprint {
        self.cached.get_or_init(|| {
            let fp = compute_fingerprint();
            debug!(fingerprint = %fp, "hardware fingerprint computed");
            fp
        })
    }
}

fn compute_fingerprint() -> HardwareFingerprint {
    let cpu = processor_id().unwrap_or_default();
    let board = board_serial().unwrap_or_default();
    let firmware = firmware_serial().unwrap_or_default();

    let material = if cpu.is_empty() && board.is_empty() && firmware.is_empty() {
        debug!("no hardware descriptors readable, using host identity fallback");
        format!("{}{}", get_hostname(), get_username())
    } else {
        format!("{cpu}-{board}-{firmware}")
    };

    let digest = Sha256::digest(material.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }

    HardwareFingerprint(format!(
        "{FINGERPRINT_PREFIX}{}",
        hex[..FINGERPRINT_DIGEST_LEN].to_ascii_uppercase()
    ))
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the current user name.
fn get_username() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Gets a processor identifier, best-effort.
fn processor_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        // Prefer a real serial (ARM boards expose one); otherwise the
        // model string still discriminates between machines well enough
        // as one of three descriptors.
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        let line = cpuinfo
            .lines()
            .find(|l| l.starts_with("Serial"))
            .or_else(|| cpuinfo.lines().find(|l| l.starts_with("model name")))?;
        non_empty(line.split(':').nth(1)?)
    }

    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()?;
        non_empty(&String::from_utf8(output.stdout).ok()?)
    }

    #[cfg(target_os = "windows")]
    {
        wmic_value("cpu", "ProcessorId")
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Gets the mainboard serial number, best-effort.
fn board_serial() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        read_dmi("board_serial")
    }

    #[cfg(target_os = "macos")]
    {
        ioreg_value("IOPlatformSerialNumber")
    }

    #[cfg(target_os = "windows")]
    {
        wmic_value("baseboard", "SerialNumber")
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Gets the firmware/system serial number, best-effort.
fn firmware_serial() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        read_dmi("product_serial")
    }

    #[cfg(target_os = "macos")]
    {
        ioreg_value("IOPlatformUUID")
    }

    #[cfg(target_os = "windows")]
    {
        wmic_value("bios", "SerialNumber")
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Reads a DMI attribute from sysfs. Often root-only; failures are fine.
#[cfg(target_os = "linux")]
fn read_dmi(name: &str) -> Option<String> {
    let contents = std::fs::read_to_string(format!("/sys/class/dmi/id/{name}")).ok()?;
    non_empty(&contents)
}

/// Extracts a quoted value from `ioreg -rd1 -c IOPlatformExpertDevice`.
#[cfg(target_os = "macos")]
fn ioreg_value(key: &str) -> Option<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;
    let output = String::from_utf8(output.stdout).ok()?;
    output
        .lines()
        .find(|l| l.contains(key))
        .and_then(|l| l.split('"').nth(3))
        .and_then(non_empty)
}

/// Queries a single WMI property via `wmic`.
#[cfg(target_os = "windows")]
fn wmic_value(class: &str, property: &str) -> Option<String> {
    let output = std::process::Command::new("wmic")
        .args([class, "get", property])
        .output()
        .ok()?;
    let output = String::from_utf8(output.stdout).ok()?;
    // First line is the property name, the value follows.
    output
        .lines()
        .skip(1)
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(non_empty)
}
