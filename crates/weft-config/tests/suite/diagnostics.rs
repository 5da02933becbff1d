use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use weft_config::{ConfigValidationError, ConfigWarning, WeftConfig};

#[test]
fn parses_every_section() {
    let text = r#"
[logging]
level = "weft.mixin=trace"
json = true

[mappings]
version = "1.12.2"

[[mappings.tables]]
version = "1.12.2"
path = "maps/1.12.2.srg"

[resolve]
optimistic_string_completion = false
navigate_source = false
max_candidates = 25
"#;
    let (config, diagnostics) = WeftConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(config.logging.level, "weft.mixin=trace");
    assert!(config.logging.json);
    assert_eq!(config.mappings.version.as_deref(), Some("1.12.2"));
    assert_eq!(config.mappings.tables[0].path, PathBuf::from("maps/1.12.2.srg"));
    assert!(!config.resolve.optimistic_string_completion);
    assert!(!config.resolve.navigate_source);
    assert_eq!(config.resolve.max_candidates, 25);
}

#[test]
fn unknown_keys_are_reported_not_fatal() {
    let text = r#"
[resolve]
max_candidate = 3

[[mappings.tables]]
version = "1.0"
path = "a.srg"
pth = "b.srg"

[colors]
enabled = true
"#;
    let (config, diagnostics) = WeftConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config.resolve.max_candidates, 500);
    assert_eq!(
        diagnostics.unknown_keys,
        vec![
            "colors".to_string(),
            "mappings.tables[0].pth".to_string(),
            "resolve.max_candidate".to_string(),
        ]
    );
}

#[test]
fn semantic_problems_are_collected_in_one_pass() {
    let text = r#"
[mappings]
version = "2.0"

[[mappings.tables]]
version = "1.0"
path = "a.srg"

[[mappings.tables]]
version = "1.0"
path = "b.srg"

[resolve]
max_candidates = 0
"#;
    let (_config, diagnostics) = WeftConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(!diagnostics.is_ok());
    assert_eq!(
        diagnostics.errors,
        vec![
            ConfigValidationError::DuplicateMappingVersion {
                version: "1.0".into()
            },
            ConfigValidationError::InvalidValue {
                toml_path: "resolve.max_candidates".into(),
                message: "must be >= 1".into(),
            },
        ]
    );
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::MappingsVersionWithoutTable {
            version: "2.0".into()
        }]
    );
}

#[test]
fn missing_table_files_warn_relative_to_config_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weft.toml");
    std::fs::write(
        &path,
        "[mappings]\nversion = \"1.0\"\n[[mappings.tables]]\nversion = \"1.0\"\npath = \"maps/1.0.srg\"\n",
    )
    .unwrap();

    let (_config, diagnostics) = WeftConfig::load_from_path_with_diagnostics(&path).unwrap();
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::MappingsTableMissing {
            version: "1.0".into(),
            path: dir.path().join("maps/1.0.srg").display().to_string(),
        }]
    );

    std::fs::create_dir(dir.path().join("maps")).unwrap();
    std::fs::write(dir.path().join("maps/1.0.srg"), "CL: a b\n").unwrap();
    let (_config, diagnostics) = WeftConfig::load_from_path_with_diagnostics(&path).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn malformed_toml_is_an_error() {
    let err = WeftConfig::load_from_str_with_diagnostics("[resolve\nmax_candidates = 1").unwrap_err();
    assert!(err.to_string().starts_with("failed to parse toml config"), "{err}");
}
