//! Scenario: Config hash stability
//!
//! GREEN when:
//! - Loading the same docs twice yields the same hash.
//! - Reordering keys within a doc does not change the hash.
//! - Different values produce different hashes.
//! - An overlay layer changes the hash and wins over the base.

use bolt_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
daemon:
  bind_addr: "127.0.0.1:8898"
transport:
  base_url: "http://lock-hub.local"
  token_env: "BOLT_TRANSPORT_TOKEN"
locks:
  - device_id: "front-door"
    poll_interval_ms: 5000
"#;

const BASE_YAML_REORDERED: &str = r#"
locks:
  - poll_interval_ms: 5000
    device_id: "front-door"
transport:
  token_env: "BOLT_TRANSPORT_TOKEN"
  base_url: "http://lock-hub.local"
daemon:
  bind_addr: "127.0.0.1:8898"
"#;

const OVERLAY_YAML: &str = r#"
transport:
  base_url: "http://10.0.0.7"
"#;

#[test]
fn same_input_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn key_order_does_not_change_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        a.config_hash, b.config_hash,
        "canonicalisation must make key order irrelevant"
    );
}

#[test]
fn different_values_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[&BASE_YAML.replace("5000", "2500")]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_wins_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, merged.config_hash);
    assert_eq!(
        merged.config_json["transport"]["base_url"],
        "http://10.0.0.7"
    );
    // Untouched siblings survive the merge.
    assert_eq!(
        merged.config_json["transport"]["token_env"],
        "BOLT_TRANSPORT_TOKEN"
    );
}

#[test]
fn loads_from_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("site.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, OVERLAY_YAML).unwrap();

    let base_s = base.to_string_lossy().to_string();
    let overlay_s = overlay.to_string_lossy().to_string();
    let from_files = bolt_config::load_layered_yaml(&[&base_s, &overlay_s]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_is_an_error_naming_the_path() {
    let err = bolt_config::load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
