use bnb_explorer::config::{load_config, AppConfig, CliOverrides};
use bnb_explorer::errors::ExplorerError;
use bnb_explorer::runtime::{FakeFileSystem, ProductionFileSystem};
use bnb_explorer::types::BestPolicy;
use std::path::PathBuf;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}/tests/fixtures/{path}",
        env!("CARGO_MANIFEST_DIR")
    ))
}

#[test]
fn fixture_config_loads_from_disk() {
    let overrides = CliOverrides {
        config_path: Some(fixture("configs/bounded.toml")),
        ..CliOverrides::default()
    };
    let cfg = load_config(&overrides, &ProductionFileSystem).expect("config");
    assert_eq!(cfg.search.tolerance, 2);
    assert_eq!(cfg.search.best_policy, BestPolicy::FewestInputs);
    assert!(cfg.replay.include_pending);
    assert!(!cfg.replay.clamp_cursor);

    let options = cfg.search_options();
    assert_eq!(options.max_steps, Some(40));
    assert!(options.emit_start_marker);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let overrides = CliOverrides {
        config_path: Some(fixture("configs/invalid.toml")),
        ..CliOverrides::default()
    };
    let err = load_config(&overrides, &ProductionFileSystem).expect_err("parse error");
    assert!(matches!(err, ExplorerError::ConfigParse(_)));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let overrides = CliOverrides {
        config_path: Some(fixture("configs/missing.toml")),
        ..CliOverrides::default()
    };
    let err = load_config(&overrides, &ProductionFileSystem).expect_err("missing");
    assert!(matches!(err, ExplorerError::Io(_)));
}

#[test]
fn cli_overrides_apply_without_a_file() {
    let overrides = CliOverrides {
        max_steps: Some(7),
        best_policy: Some(BestPolicy::LeastExcess),
        clamp_cursor: true,
        log_path: Some(PathBuf::from("logs/run.jsonl")),
        ..CliOverrides::default()
    };
    let cfg = load_config(&overrides, &FakeFileSystem::default()).expect("config");
    assert_eq!(cfg.search_options().max_steps, Some(7));
    assert_eq!(cfg.search.best_policy, BestPolicy::LeastExcess);
    assert!(cfg.replay.clamp_cursor);
    assert_eq!(cfg.log_path(), Some(PathBuf::from("logs/run.jsonl")));
}

#[test]
fn default_config_serializes_to_toml_and_back() {
    let text = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
    assert!(text.contains("best_policy = \"last_found\""));
    let fs = FakeFileSystem::with_file("/defaults.toml", text);
    let cfg = load_config(
        &CliOverrides {
            config_path: Some(PathBuf::from("/defaults.toml")),
            ..CliOverrides::default()
        },
        &fs,
    )
    .expect("config");
    assert_eq!(cfg, AppConfig::default());
}
