use atelier_license::{FingerprintEngine, HardwareFingerprint};

#[test]
fn fingerprint_stable_within_engine() {
    let engine = FingerprintEngine::new();
    let fp1 = engine.fingerprint().clone();
    let fp2 = engine.fingerprint().clone();
    assert_eq!(fp1, fp2);
}

#[test]
fn fingerprint_deterministic_across_engines() {
    // Same machine, independent engines: the memo must not change the value.
    let fp1 = FingerprintEngine::new().fingerprint().clone();
    let fp2 = FingerprintEngine::new().fingerprint().clone();
    assert_eq!(fp1.as_str(), fp2.as_str());
}

#[test]
fn fingerprint_format() {
    let engine = FingerprintEngine::new();
    let fp = engine.fingerprint();
    assert!(fp.as_str().starts_with("HW-"));
    assert_eq!(fp.as_str().len(), "HW-".len() + 12);

    let digest = &fp.as_str()["HW-".len()..];
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[test]
fn fingerprint_display_matches_as_str() {
    let engine = FingerprintEngine::new();
    let fp = engine.fingerprint();
    assert_eq!(format!("{fp}"), fp.as_str());
}

#[test]
fn fingerprint_serde_roundtrip() {
    let engine = FingerprintEngine::new();
    let fp = engine.fingerprint();
    let json = serde_json::to_string(fp).unwrap();
    let parsed: HardwareFingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(&parsed, fp);
    // Transparent representation: just the string
    assert_eq!(json, format!("\"{}\"", fp.as_str()));
}

#[test]
fn default_engine_behaves_like_new() {
    let fp1 = FingerprintEngine::default().fingerprint().clone();
    let fp2 = FingerprintEngine::new().fingerprint().clone();
    assert_eq!(fp1, fp2);
}
