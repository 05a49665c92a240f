use std::fs;

use tempfile::tempdir;
use triage_core::config::{AnalysisConfig, ConfigError, DEFAULT_MAX_BLOCK_INSTRUCTIONS};
use triage_core::hash::{Frame, HashMode};
use triage_core::Architecture;

#[test]
fn defaults_are_x86_sha256() {
    let config = AnalysisConfig::default();

    assert_eq!(config.architecture, Architecture::X86);
    assert_eq!(config.hash_mode, HashMode::Sha256);
    assert_eq!(config.max_block_instructions, DEFAULT_MAX_BLOCK_INSTRUCTIONS);
    assert!(!config.taint_destination_pointers);
    assert!(!config.flags.valid);
    assert!(config.validate().is_ok());
}

#[test]
fn loads_json_with_partial_fields() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("triage.json");
    fs::write(
        &path,
        r#"{
            "architecture": "arm",
            "hash_mode": "custom_v2",
            "flags": { "valid": true, "zero": true }
        }"#,
    )
    .expect("write config");

    let config = AnalysisConfig::load(&path).expect("load json");

    assert_eq!(config.architecture, Architecture::Arm);
    assert_eq!(config.hash_mode, HashMode::CustomV2);
    assert!(config.flags.valid);
    assert!(config.flags.zero);
    assert!(!config.flags.carry);
    assert_eq!(config.max_block_instructions, DEFAULT_MAX_BLOCK_INSTRUCTIONS);
}

#[test]
fn loads_yaml_and_applies_exclusions() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("triage.yml");
    fs::write(
        &path,
        "architecture: x64\n\
         taint_destination_pointers: true\n\
         max_block_instructions: 8\n\
         excluded_symbols:\n  - \"app!log_*\"\n",
    )
    .expect("write config");

    let config = AnalysisConfig::load(&path).expect("load yaml");
    assert_eq!(config.architecture, Architecture::X64);
    assert!(config.taint_destination_pointers);
    assert_eq!(config.max_block_instructions, 8);

    let hash = config.stack_hasher().hash(&[Frame::resolved("app!log_fatal", 0)]);
    assert!(hash.frames[0].excluded);
}

#[test]
fn rejects_unknown_extension() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("triage.toml");
    fs::write(&path, "architecture = \"x86\"").expect("write config");

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)), "unexpected error: {err}");
}

#[test]
fn rejects_malformed_json() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("triage.json");
    fs::write(&path, "{ not json").expect("write config");

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)), "unexpected error: {err}");
}

#[test]
fn rejects_zero_block_limit() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("triage.json");
    fs::write(&path, r#"{ "max_block_instructions": 0 }"#).expect("write config");

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyBlockLimit));
}

#[test]
fn missing_file_reports_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("absent.json");

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}
